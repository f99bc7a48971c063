//! Directory domain module (employees, departments, membership migration).
//!
//! This crate contains the business rules of the employee/department directory,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod department;
pub mod employee;
pub mod membership;
pub mod prompt;

pub use department::{Department, DepartmentFields, MAX_DEPARTMENT_NAME_LEN};
pub use employee::{
    Email, Employee, EmployeePatch, EmployeeSortField, EmployeeStatus, NewEmployee, Seniority,
    SortDirection, SortValue,
};
pub use membership::{
    MembershipPlan, PlanStage, plan_membership_change, resolve_deletion_target,
};
pub use prompt::{MigrationPrompt, MigrationReason, MigrationTarget};
