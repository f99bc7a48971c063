//! Record versioning for optimistic concurrency.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A stored record whose writes are counted.
///
/// The store assigns version `1` on insert and adds one on every patch, so two
/// editors that loaded the same version can detect each other.
pub trait Versioned {
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for a write.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// Skip version checking (last write wins).
    #[default]
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::stale_write(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }

    /// Expect exactly the version the caller last read.
    pub fn of<R: Versioned>(record: &R) -> Self {
        ExpectedVersion::Exact(record.version())
    }
}
