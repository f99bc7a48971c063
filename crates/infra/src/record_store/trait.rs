use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use orgdesk_core::{DepartmentId, EmployeeId};
use orgdesk_directory::{Department, Email, Employee};

use super::batch::{Collection, WriteBatch};
use super::query::EmployeeQuery;

/// What a failed batch constraint found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// An employee would point at a department that does not exist.
    MissingDepartment(DepartmentId),
    /// A department that must be vacant still has members.
    OccupiedDepartment {
        department_id: DepartmentId,
        members: usize,
    },
    /// More than one employee would carry the same email.
    DuplicateEmail(Email),
    /// A manager reference points at a missing or non-manager employee.
    NotAManager(EmployeeId),
    /// Employees would still report to someone who must have no reports.
    HasReports { manager_id: EmployeeId, reports: usize },
}

impl core::fmt::Display for Violation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Violation::MissingDepartment(id) => write!(f, "department {id} does not exist"),
            Violation::OccupiedDepartment {
                department_id,
                members,
            } => write!(f, "department {department_id} still has {members} member(s)"),
            Violation::DuplicateEmail(email) => write!(f, "email {email} is already in use"),
            Violation::NotAManager(id) => write!(f, "employee {id} is not a manager"),
            Violation::HasReports {
                manager_id,
                reports,
            } => write!(f, "employee {manager_id} still has {reports} direct report(s)"),
        }
    }
}

/// Record store operation error.
///
/// These are **infrastructure errors** (availability, missing documents,
/// rejected batches) as opposed to domain errors (validation, migration rules).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network/backend failure. Never retried by the core.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: String },

    #[error("{collection} record already exists: {id}")]
    AlreadyExists { collection: Collection, id: String },

    #[error(
        "stale write on {collection} record {id} (expected version {expected}, found {actual})"
    )]
    StaleWrite {
        collection: Collection,
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("batch constraint violated: {0}")]
    ConstraintViolation(Violation),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Number of document writes applied.
    pub writes: usize,
    pub committed_at: DateTime<Utc>,
}

/// Gateway over the `employees` and `departments` document collections.
///
/// ## Batch contract
///
/// `commit()` applies every write of the batch or none of them:
/// - patch/delete of a missing record fails the batch (`NotFound`)
/// - a patch whose expected version does not match fails the batch (`StaleWrite`)
/// - every constraint is evaluated on the state the batch would produce; one
///   failing constraint fails the batch (`ConstraintViolation`)
/// - on any failure no write of the batch is visible to readers
///
/// Inserts are stamped by the store: `created_at` is the commit time and
/// `version` starts at 1. Every patch adds one to `version`.
///
/// ## Reads
///
/// Reads of a missing id return `None`; they never fail for that reason.
/// Member sets are never cached by the store: every query reflects the last
/// committed batch.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn query_employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>, StoreError>;

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError>;

    /// All departments, ordered by name.
    async fn list_departments(&self) -> Result<Vec<Department>, StoreError>;

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError>;
}

#[async_trait::async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        (**self).get_employee(id).await
    }

    async fn query_employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>, StoreError> {
        (**self).query_employees(query).await
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        (**self).get_department(id).await
    }

    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        (**self).list_departments().await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        (**self).commit(batch).await
    }
}
