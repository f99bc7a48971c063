use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgdesk_core::{DepartmentId, DomainError, DomainResult, EmployeeId, Entity, Versioned};

/// Maximum department name length, in characters.
pub const MAX_DEPARTMENT_NAME_LEN: usize = 50;

/// Stored department record, as kept in the `departments` collection.
///
/// There is no roster here: members are the employees whose `departmentId`
/// equals this department's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub manager_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Department {
    pub fn from_fields(
        id: DepartmentId,
        fields: DepartmentFields,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: fields.name.trim().to_string(),
            manager_id: fields.manager_id,
            created_at,
            version: 1,
        }
    }

    pub fn fields(&self) -> DepartmentFields {
        DepartmentFields {
            name: self.name.clone(),
            manager_id: self.manager_id,
        }
    }

    pub fn is_managed_by(&self, employee_id: EmployeeId) -> bool {
        self.manager_id == Some(employee_id)
    }
}

impl Entity for Department {
    type Id = DepartmentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Versioned for Department {
    fn version(&self) -> u64 {
        self.version
    }
}

/// The department's own editable fields (membership is edited separately).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentFields {
    pub name: String,
    pub manager_id: Option<EmployeeId>,
}

impl DepartmentFields {
    pub fn new(name: impl Into<String>, manager_id: Option<EmployeeId>) -> Self {
        Self {
            name: name.into(),
            manager_id,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("department name cannot be empty"));
        }
        if name.chars().count() > MAX_DEPARTMENT_NAME_LEN {
            return Err(DomainError::validation(format!(
                "department name must be at most {MAX_DEPARTMENT_NAME_LEN} characters"
            )));
        }
        Ok(())
    }

    pub fn apply_to(&self, department: &mut Department) {
        department.name = self.name.trim().to_string();
        department.manager_id = self.manager_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        let err = DepartmentFields::new("  ", None).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn name_length_is_counted_in_characters() {
        let fifty = "é".repeat(MAX_DEPARTMENT_NAME_LEN);
        assert!(DepartmentFields::new(fifty.clone(), None).validate().is_ok());

        let fifty_one = format!("{fifty}x");
        match DepartmentFields::new(fifty_one, None).validate().unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("50")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn fields_round_trip_through_record() {
        let manager = EmployeeId::new();
        let dept = Department::from_fields(
            DepartmentId::new(),
            DepartmentFields::new(" Produto ", Some(manager)),
            Utc::now(),
        );
        assert_eq!(dept.name, "Produto");
        assert!(dept.is_managed_by(manager));
        assert_eq!(dept.fields(), DepartmentFields::new("Produto", Some(manager)));
        assert_eq!(dept.version(), 1);
    }

    #[test]
    fn apply_replaces_name_and_manager() {
        let mut dept = Department::from_fields(
            DepartmentId::new(),
            DepartmentFields::new("TI", Some(EmployeeId::new())),
            Utc::now(),
        );
        DepartmentFields::new("Tecnologia", None).apply_to(&mut dept);
        assert_eq!(dept.name, "Tecnologia");
        assert_eq!(dept.manager_id, None);
    }
}
