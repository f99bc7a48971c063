//! `orgdesk-core`: shared building blocks for the employee/department directory.
//!
//! This crate contains **pure domain** primitives (no storage, no IO).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;
pub mod version;

pub use entity::{Entity, collect_ids};
pub use error::{DomainError, DomainResult};
pub use id::{DepartmentId, EmployeeId};
pub use value_object::ValueObject;
pub use version::{ExpectedVersion, Versioned};
