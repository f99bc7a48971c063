use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use orgdesk_core::{
    DepartmentId, DomainError, DomainResult, EmployeeId, Entity, ValueObject, Versioned,
};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 100;

/// Employment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
        }
    }
}

/// Seniority ladder. Ordering follows the ladder (junior first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    Manager,
}

impl Seniority {
    fn rank(self) -> i64 {
        match self {
            Seniority::Junior => 0,
            Seniority::Mid => 1,
            Seniority::Senior => 2,
            Seniority::Manager => 3,
        }
    }
}

/// Normalized email address (trimmed, lowercased).
///
/// Uniqueness across employees is decided on this normalized form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if value.chars().count() > MAX_EMAIL_LEN {
            return Err(DomainError::validation(format!(
                "email must be at most {MAX_EMAIL_LEN} characters"
            )));
        }

        let (local, domain) = value
            .split_once('@')
            .ok_or_else(|| DomainError::validation("email must contain '@'"))?;
        let well_formed = !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !value.chars().any(char::is_whitespace);
        if !well_formed {
            return Err(DomainError::validation(format!("malformed email: {raw}")));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Email {}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Stored employee record, as kept in the `employees` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: Email,
    pub status: EmployeeStatus,
    pub department_id: DepartmentId,
    pub role: String,
    pub seniority: Seniority,
    pub manager_id: Option<EmployeeId>,
    pub admission_date: NaiveDate,
    /// Minor currency units.
    pub base_salary: i64,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Employee {
    /// Materialize a record from validated input. `created_at` and `version` come
    /// from the store.
    pub fn from_new(id: EmployeeId, new: NewEmployee, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name.trim().to_string(),
            email: new.email,
            status: new.status,
            department_id: new.department_id,
            role: new.role.trim().to_string(),
            seniority: new.seniority,
            manager_id: new.manager_id,
            admission_date: new.admission_date,
            base_salary: new.base_salary,
            created_at,
            version: 1,
        }
    }

    pub fn is_manager(&self) -> bool {
        self.seniority == Seniority::Manager
    }

    pub fn belongs_to(&self, department_id: DepartmentId) -> bool {
        self.department_id == department_id
    }

    /// Value used when ordering by `field`.
    pub fn sort_value(&self, field: EmployeeSortField) -> SortValue {
        match field {
            EmployeeSortField::Name => SortValue::Text(self.name.to_lowercase()),
            EmployeeSortField::Email => SortValue::Text(self.email.as_str().to_string()),
            EmployeeSortField::Status => SortValue::Text(self.status.as_str().to_string()),
            EmployeeSortField::Role => SortValue::Text(self.role.to_lowercase()),
            EmployeeSortField::Seniority => SortValue::Number(self.seniority.rank()),
            EmployeeSortField::DepartmentId => SortValue::Text(self.department_id.to_string()),
            EmployeeSortField::AdmissionDate => SortValue::Date(self.admission_date),
            EmployeeSortField::BaseSalary => SortValue::Number(self.base_salary),
            EmployeeSortField::CreatedAt => SortValue::Timestamp(self.created_at),
        }
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Versioned for Employee {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Input for creating an employee (no id, no timestamps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    pub email: Email,
    pub status: EmployeeStatus,
    pub department_id: DepartmentId,
    pub role: String,
    pub seniority: Seniority,
    pub manager_id: Option<EmployeeId>,
    pub admission_date: NaiveDate,
    pub base_salary: i64,
}

impl NewEmployee {
    /// Field-level checks that need no store access.
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        validate_role(&self.role)?;
        validate_salary(self.base_salary)?;
        Ok(())
    }
}

/// Partial update of an employee. `None` keeps the stored value.
///
/// `manager_id` is doubly optional: `Some(None)` clears the manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub status: Option<EmployeeStatus>,
    pub department_id: Option<DepartmentId>,
    pub role: Option<String>,
    pub seniority: Option<Seniority>,
    pub manager_id: Option<Option<EmployeeId>>,
    pub admission_date: Option<NaiveDate>,
    pub base_salary: Option<i64>,
}

impl EmployeePatch {
    /// Patch that only moves the employee to another department.
    pub fn move_to(department_id: DepartmentId) -> Self {
        Self {
            department_id: Some(department_id),
            ..Default::default()
        }
    }

    /// Patch that detaches the employee from its manager.
    pub fn clear_manager() -> Self {
        Self {
            manager_id: Some(None),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(role) = &self.role {
            validate_role(role)?;
        }
        if let Some(salary) = self.base_salary {
            validate_salary(salary)?;
        }
        Ok(())
    }

    /// Merge the provided fields into `employee`. Identity and `created_at` never change.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.trim().to_string();
        }
        if let Some(email) = &self.email {
            employee.email = email.clone();
        }
        if let Some(status) = self.status {
            employee.status = status;
        }
        if let Some(department_id) = self.department_id {
            employee.department_id = department_id;
        }
        if let Some(role) = &self.role {
            employee.role = role.trim().to_string();
        }
        if let Some(seniority) = self.seniority {
            employee.seniority = seniority;
        }
        if let Some(manager_id) = self.manager_id {
            employee.manager_id = manager_id;
        }
        if let Some(date) = self.admission_date {
            employee.admission_date = date;
        }
        if let Some(salary) = self.base_salary {
            employee.base_salary = salary;
        }
    }
}

/// Fields an employee list can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmployeeSortField {
    Name,
    Email,
    Status,
    Role,
    Seniority,
    DepartmentId,
    AdmissionDate,
    BaseSalary,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Comparable projection of a sortable field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SortValue {
    Text(String),
    Number(i64),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

fn validate_name(name: &str) -> DomainResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_role(role: &str) -> DomainResult<()> {
    if role.trim().is_empty() {
        return Err(DomainError::validation("role cannot be empty"));
    }
    Ok(())
}

fn validate_salary(base_salary: i64) -> DomainResult<()> {
    if base_salary <= 0 {
        return Err(DomainError::validation("base salary must be positive"));
    }
    Ok(())
}
