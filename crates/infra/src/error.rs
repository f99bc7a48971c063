//! Error surface of the directory services.

use thiserror::Error;

use orgdesk_core::DomainError;

use crate::record_store::{StoreError, Violation};

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Failure of a directory operation.
///
/// Store rejections that carry business meaning (duplicate email, occupied
/// department, stale version) are lifted into [`DomainError`] so callers only
/// match on one enum for those.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl DirectoryError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            DirectoryError::Domain(e) => Some(e),
            DirectoryError::Store(_) => None,
        }
    }

    /// Backend failure the caller may surface as a generic notification.
    pub fn is_transient(&self) -> bool {
        matches!(self, DirectoryError::Store(StoreError::Unavailable(_)))
    }
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(Violation::DuplicateEmail(email)) => {
                DirectoryError::Domain(DomainError::duplicate_email(email.as_str()))
            }
            StoreError::ConstraintViolation(Violation::OccupiedDepartment { members, .. }) => {
                DirectoryError::Domain(DomainError::DepartmentNotEmpty { members })
            }
            StoreError::ConstraintViolation(Violation::MissingDepartment(id)) => {
                DirectoryError::Domain(DomainError::invariant(format!(
                    "department {id} does not exist"
                )))
            }
            StoreError::ConstraintViolation(Violation::NotAManager(id)) => {
                DirectoryError::Domain(DomainError::validation(format!(
                    "employee {id} is not a manager"
                )))
            }
            StoreError::ConstraintViolation(violation @ Violation::HasReports { .. }) => {
                DirectoryError::Domain(DomainError::invariant(violation.to_string()))
            }
            err @ StoreError::StaleWrite { .. } => {
                DirectoryError::Domain(DomainError::stale_write(err.to_string()))
            }
            other => DirectoryError::Store(other),
        }
    }
}
