//! Record Store Gateway.
//!
//! Infrastructure-facing abstraction over the `employees` and `departments`
//! document collections. Higher layers only ever read through queries and
//! write through atomic [`WriteBatch`]es.

pub mod batch;
pub mod in_memory;
pub mod query;
pub mod r#trait;

pub use batch::{Collection, Constraint, Write, WriteBatch};
pub use in_memory::InMemoryRecordStore;
pub use query::{EmployeeFilter, EmployeeQuery, PageCursor};
pub use r#trait::{CommitReceipt, RecordStore, StoreError, Violation};
