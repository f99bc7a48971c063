//! Department Directory Operations.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use orgdesk_core::{DepartmentId, DomainError, EmployeeId, ExpectedVersion, collect_ids};
use orgdesk_directory::{Department, DepartmentFields};

use crate::error::DirectoryResult;
use crate::record_store::{Constraint, EmployeeQuery, RecordStore, WriteBatch};

#[derive(Debug, Clone)]
pub struct DepartmentDirectory<S> {
    store: S,
}

impl<S> DepartmentDirectory<S>
where
    S: RecordStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All departments, ordered by name.
    pub async fn list(&self) -> DirectoryResult<Vec<Department>> {
        Ok(self.store.list_departments().await?)
    }

    pub async fn get_by_id(&self, id: DepartmentId) -> DirectoryResult<Option<Department>> {
        Ok(self.store.get_department(id).await?)
    }

    /// Current members of a department, read fresh from the store.
    #[tracing::instrument(skip(self), fields(department_id = %department_id))]
    pub async fn member_ids(
        &self,
        department_id: DepartmentId,
    ) -> DirectoryResult<BTreeSet<EmployeeId>> {
        let members = self
            .store
            .query_employees(&EmployeeQuery::members_of(department_id))
            .await?;
        debug!(members = members.len(), "department roster loaded");
        Ok(collect_ids(&members))
    }

    /// Member count per department. Departments without members map to 0.
    pub async fn member_counts(&self) -> DirectoryResult<BTreeMap<DepartmentId, usize>> {
        let mut counts: BTreeMap<DepartmentId, usize> = self
            .store
            .list_departments()
            .await?
            .into_iter()
            .map(|d| (d.id, 0))
            .collect();

        for employee in self.store.query_employees(&EmployeeQuery::new()).await? {
            if let Some(count) = counts.get_mut(&employee.department_id) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    /// Create a department and pull `member_ids` (plus the manager) into it.
    #[tracing::instrument(skip(self, fields, member_ids), fields(name = %fields.name))]
    pub async fn create(
        &self,
        fields: DepartmentFields,
        member_ids: &[EmployeeId],
    ) -> DirectoryResult<DepartmentId> {
        fields.validate()?;

        let mut members: BTreeSet<EmployeeId> = member_ids.iter().copied().collect();
        members.extend(fields.manager_id);

        let id = DepartmentId::new();
        let mut batch = WriteBatch::new();
        batch.insert_department(id, fields);
        for member in &members {
            batch.move_employee(*member, id);
        }
        self.store.commit(batch).await?;

        info!(department_id = %id, members = members.len(), "department created");
        Ok(id)
    }

    /// Update name and manager. Membership is left untouched.
    #[tracing::instrument(skip(self, fields), fields(department_id = %id))]
    pub async fn update(
        &self,
        id: DepartmentId,
        fields: DepartmentFields,
        expected: ExpectedVersion,
    ) -> DirectoryResult<()> {
        fields.validate()?;
        let current = self
            .store
            .get_department(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        expected.check(current.version)?;

        let mut batch = WriteBatch::new();
        batch.patch_department(id, fields, expected);
        self.store.commit(batch).await?;

        info!("department updated");
        Ok(())
    }

    /// Delete a department that has no members.
    ///
    /// Departments with members go through
    /// [`delete_department_with_migration`].
    ///
    /// [`delete_department_with_migration`]:
    /// super::MembershipMigrator::delete_department_with_migration
    #[tracing::instrument(skip(self), fields(department_id = %id))]
    pub async fn delete(&self, id: DepartmentId) -> DirectoryResult<()> {
        let members = self.member_ids(id).await?;
        if !members.is_empty() {
            warn!(members = members.len(), "refusing to delete department with members");
            return Err(DomainError::DepartmentNotEmpty {
                members: members.len(),
            }
            .into());
        }

        let mut batch = WriteBatch::new();
        batch
            .delete_department(id)
            .require(Constraint::DepartmentVacant(id));
        self.store.commit(batch).await?;

        info!("department deleted");
        Ok(())
    }

    /// Departments members of `exclude` could be moved to.
    pub async fn candidate_destinations(
        &self,
        exclude: DepartmentId,
    ) -> DirectoryResult<Vec<Department>> {
        let mut departments = self.list().await?;
        departments.retain(|d| d.id != exclude);
        Ok(departments)
    }
}
