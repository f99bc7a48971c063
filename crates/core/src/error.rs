//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business failures (validation, invariants,
/// conflicts, migration preconditions). Storage failures live in the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A record targeted by a mutation does not exist.
    #[error("not found")]
    NotFound,

    /// Another employee already uses this email address.
    #[error("email already in use: {0}")]
    DuplicateEmail(String),

    /// Members are leaving a department but no destination was supplied.
    #[error("a destination department is required for the removed members")]
    MissingMigrationTarget,

    /// The migration destination is the department being edited or deleted.
    #[error("destination department must differ from the source department")]
    SameDepartment,

    /// A department still has members and cannot be removed without migration.
    #[error("department still has {members} member(s)")]
    DepartmentNotEmpty { members: usize },

    /// Optimistic concurrency check failed.
    #[error("stale write: {0}")]
    StaleWrite(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail(email.into())
    }

    pub fn stale_write(msg: impl Into<String>) -> Self {
        Self::StaleWrite(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether the error was raised before any store interaction could happen.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingMigrationTarget | Self::SameDepartment | Self::InvariantViolation(_)
        )
    }
}
