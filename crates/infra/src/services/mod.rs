//! Directory services over a [`RecordStore`](crate::record_store::RecordStore).
//!
//! Each service validates its preconditions before building a batch, so a
//! rejected operation never reaches the store.

pub mod departments;
pub mod employees;
pub mod migration;

pub use departments::DepartmentDirectory;
pub use employees::{EmployeeDirectory, EmployeeListOptions, EmployeePage};
pub use migration::{DeletionPath, MembershipMigrator, MigrationReceipt};
