//! Atomic multi-document writes.

use serde::{Deserialize, Serialize};

use orgdesk_core::{DepartmentId, EmployeeId, ExpectedVersion};
use orgdesk_directory::{DepartmentFields, Email, EmployeePatch, NewEmployee};

/// Collections held by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Employees,
    Departments,
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Collection::Employees => f.write_str("employees"),
            Collection::Departments => f.write_str("departments"),
        }
    }
}

/// A single document mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    InsertEmployee {
        id: EmployeeId,
        employee: NewEmployee,
    },
    PatchEmployee {
        id: EmployeeId,
        patch: EmployeePatch,
        expected: ExpectedVersion,
    },
    DeleteEmployee {
        id: EmployeeId,
    },
    InsertDepartment {
        id: DepartmentId,
        fields: DepartmentFields,
    },
    PatchDepartment {
        id: DepartmentId,
        fields: DepartmentFields,
        expected: ExpectedVersion,
    },
    DeleteDepartment {
        id: DepartmentId,
    },
}

impl Write {
    pub fn collection(&self) -> Collection {
        match self {
            Write::InsertEmployee { .. }
            | Write::PatchEmployee { .. }
            | Write::DeleteEmployee { .. } => Collection::Employees,
            Write::InsertDepartment { .. }
            | Write::PatchDepartment { .. }
            | Write::DeleteDepartment { .. } => Collection::Departments,
        }
    }
}

/// Condition the state produced by a batch must satisfy for the batch to commit.
///
/// Constraints are checked after all writes of the batch are staged and before
/// any of them becomes visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Constraint {
    /// The department exists.
    DepartmentExists(DepartmentId),
    /// No employee references the department.
    DepartmentVacant(DepartmentId),
    /// At most one employee carries this email.
    UniqueEmail(Email),
    /// The employee exists and has `Manager` seniority.
    EmployeeIsManager(EmployeeId),
    /// No employee reports to this one.
    HasNoReports(EmployeeId),
}

impl core::fmt::Display for Constraint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Constraint::DepartmentExists(id) => write!(f, "department {id} exists"),
            Constraint::DepartmentVacant(id) => write!(f, "department {id} has no members"),
            Constraint::UniqueEmail(email) => write!(f, "email {email} is unique"),
            Constraint::EmployeeIsManager(id) => write!(f, "employee {id} is a manager"),
            Constraint::HasNoReports(id) => write!(f, "employee {id} has no direct reports"),
        }
    }
}

/// Ordered set of writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<Write>,
    constraints: Vec<Constraint>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_employee(&mut self, id: EmployeeId, employee: NewEmployee) -> &mut Self {
        self.writes.push(Write::InsertEmployee { id, employee });
        self
    }

    pub fn patch_employee(
        &mut self,
        id: EmployeeId,
        patch: EmployeePatch,
        expected: ExpectedVersion,
    ) -> &mut Self {
        self.writes.push(Write::PatchEmployee { id, patch, expected });
        self
    }

    /// Point an employee at `department_id` (last write wins).
    pub fn move_employee(&mut self, id: EmployeeId, department_id: DepartmentId) -> &mut Self {
        self.patch_employee(id, EmployeePatch::move_to(department_id), ExpectedVersion::Any)
    }

    pub fn delete_employee(&mut self, id: EmployeeId) -> &mut Self {
        self.writes.push(Write::DeleteEmployee { id });
        self
    }

    pub fn insert_department(&mut self, id: DepartmentId, fields: DepartmentFields) -> &mut Self {
        self.writes.push(Write::InsertDepartment { id, fields });
        self
    }

    pub fn patch_department(
        &mut self,
        id: DepartmentId,
        fields: DepartmentFields,
        expected: ExpectedVersion,
    ) -> &mut Self {
        self.writes.push(Write::PatchDepartment { id, fields, expected });
        self
    }

    pub fn delete_department(&mut self, id: DepartmentId) -> &mut Self {
        self.writes.push(Write::DeleteDepartment { id });
        self
    }

    pub fn require(&mut self, constraint: Constraint) -> &mut Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Write>, Vec<Constraint>) {
        (self.writes, self.constraints)
    }
}
