//! Employee Directory Operations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use orgdesk_core::{DomainError, EmployeeId, ExpectedVersion};
use orgdesk_directory::{
    DepartmentFields, Employee, EmployeePatch, EmployeeSortField, NewEmployee, Seniority,
    SortDirection,
};

use crate::config::DirectoryConfig;
use crate::error::DirectoryResult;
use crate::record_store::{
    Constraint, EmployeeFilter, EmployeeQuery, PageCursor, RecordStore, WriteBatch,
};

/// Parameters of one employee list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeListOptions {
    /// `None` uses the configured default.
    pub page_size: Option<usize>,
    /// Continue after this cursor (forward only).
    pub cursor: Option<PageCursor>,
    pub sort_field: EmployeeSortField,
    pub direction: SortDirection,
}

impl EmployeeListOptions {
    pub fn sorted_by(sort_field: EmployeeSortField, direction: SortDirection) -> Self {
        Self {
            sort_field,
            direction,
            ..Default::default()
        }
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Options for the page following `page`, keeping the same ordering.
    pub fn next(&self, page: &EmployeePage) -> Option<Self> {
        let cursor = page.next_cursor.clone()?;
        if !page.has_more {
            return None;
        }
        Some(Self {
            cursor: Some(cursor),
            ..self.clone()
        })
    }
}

/// One page of employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePage {
    pub items: Vec<Employee>,
    /// Cursor on the last item of this page; `None` for an empty page.
    pub next_cursor: Option<PageCursor>,
    /// A full page came back, so another one may follow.
    pub has_more: bool,
}

/// Create, edit, delete and list employees.
#[derive(Debug, Clone)]
pub struct EmployeeDirectory<S> {
    store: S,
    config: DirectoryConfig,
}

impl<S> EmployeeDirectory<S>
where
    S: RecordStore,
{
    pub fn new(store: S, config: DirectoryConfig) -> Self {
        Self { store, config }
    }

    /// Create an employee and return its new id.
    ///
    /// The email lookup gives an early `DuplicateEmail`; the `UniqueEmail`
    /// constraint on the insert batch catches a concurrent creator that slipped
    /// in between lookup and insert.
    #[tracing::instrument(skip(self, employee), fields(email = %employee.email))]
    pub async fn create(&self, employee: NewEmployee) -> DirectoryResult<EmployeeId> {
        employee.validate()?;

        let same_email = EmployeeQuery::new()
            .filter(EmployeeFilter::EmailIs(employee.email.clone()))
            .limit(1);
        if !self.store.query_employees(&same_email).await?.is_empty() {
            warn!("rejected employee with duplicate email");
            return Err(DomainError::duplicate_email(employee.email.as_str()).into());
        }

        if let Some(manager_id) = employee.manager_id {
            self.ensure_manager(manager_id).await?;
        }

        let id = EmployeeId::new();
        let mut batch = WriteBatch::new();
        batch
            .require(Constraint::UniqueEmail(employee.email.clone()))
            .require(Constraint::DepartmentExists(employee.department_id));
        if let Some(manager_id) = employee.manager_id {
            batch.require(Constraint::EmployeeIsManager(manager_id));
        }
        batch.insert_employee(id, employee);
        self.store.commit(batch).await?;

        info!(employee_id = %id, "employee created");
        Ok(id)
    }

    /// Merge `patch` into the stored employee.
    ///
    /// Demoting a manager detaches their direct reports in the same batch, and
    /// the batch requires that nobody reports to them once it is applied.
    #[tracing::instrument(skip(self, patch), fields(employee_id = %id))]
    pub async fn update(
        &self,
        id: EmployeeId,
        patch: EmployeePatch,
        expected: ExpectedVersion,
    ) -> DirectoryResult<()> {
        patch.validate()?;
        if patch.is_empty() {
            debug!("empty employee patch, nothing to write");
            return Ok(());
        }

        let current = self
            .store
            .get_employee(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        expected.check(current.version)?;

        if let Some(Some(manager_id)) = patch.manager_id {
            if manager_id == id {
                let err = DomainError::validation("an employee cannot manage themselves");
                return Err(err.into());
            }
            self.ensure_manager(manager_id).await?;
        }

        let mut batch = WriteBatch::new();
        if let Some(Some(manager_id)) = patch.manager_id {
            batch.require(Constraint::EmployeeIsManager(manager_id));
        }
        let demoted = current.is_manager()
            && patch
                .seniority
                .is_some_and(|seniority| seniority != Seniority::Manager);
        if demoted {
            let reports = EmployeeQuery::new().filter(EmployeeFilter::ManagerIs(id));
            let reports = self.store.query_employees(&reports).await?;
            if !reports.is_empty() {
                info!(reports = reports.len(), "demoted manager loses direct reports");
            }
            for report in &reports {
                batch.patch_employee(
                    report.id,
                    EmployeePatch::clear_manager(),
                    ExpectedVersion::of(report),
                );
            }
            batch.require(Constraint::HasNoReports(id));
        }
        if let Some(department_id) = patch.department_id {
            batch.require(Constraint::DepartmentExists(department_id));
        }
        if let Some(email) = &patch.email {
            if *email != current.email {
                batch.require(Constraint::UniqueEmail(email.clone()));
            }
        }
        batch.patch_employee(id, patch, expected);
        self.store.commit(batch).await?;

        info!("employee updated");
        Ok(())
    }

    pub async fn delete(&self, id: EmployeeId) -> DirectoryResult<()> {
        self.delete_batch(&[id]).await
    }

    /// Delete several employees in one atomic batch.
    ///
    /// Departments managed by a deleted employee lose their manager and direct
    /// reports lose their `managerId`, in the same batch.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_batch(&self, ids: &[EmployeeId]) -> DirectoryResult<()> {
        let doomed: BTreeSet<EmployeeId> = ids.iter().copied().collect();
        if doomed.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        for id in &doomed {
            batch.delete_employee(*id);
        }

        for department in self.store.list_departments().await? {
            if let Some(manager_id) = department.manager_id {
                if doomed.contains(&manager_id) {
                    let expected = ExpectedVersion::of(&department);
                    batch.patch_department(
                        department.id,
                        DepartmentFields::new(department.name, None),
                        expected,
                    );
                }
            }
        }

        let mut orphaned_reports = BTreeSet::new();
        for id in &doomed {
            let reports = EmployeeQuery::new().filter(EmployeeFilter::ManagerIs(*id));
            for report in self.store.query_employees(&reports).await? {
                if !doomed.contains(&report.id) {
                    orphaned_reports.insert(report.id);
                }
            }
        }
        for report in orphaned_reports {
            batch.patch_employee(report, EmployeePatch::clear_manager(), ExpectedVersion::Any);
        }

        let receipt = self.store.commit(batch).await?;
        info!(deleted = doomed.len(), writes = receipt.writes, "employees deleted");
        Ok(())
    }

    /// Fetch one page ordered by the requested field.
    #[tracing::instrument(
        skip(self, options),
        fields(sort = ?options.sort_field, direction = ?options.direction)
    )]
    pub async fn list(&self, options: EmployeeListOptions) -> DirectoryResult<EmployeePage> {
        let page_size = self.config.page_size(options.page_size);

        let mut query = EmployeeQuery::new()
            .order_by(options.sort_field, options.direction)
            .limit(page_size);
        if let Some(cursor) = options.cursor {
            if cursor.field() != options.sort_field || cursor.direction() != options.direction {
                return Err(DomainError::validation(
                    "page cursor belongs to a different ordering; restart from the first page",
                )
                .into());
            }
            query = query.start_after(cursor);
        }

        let items = self.store.query_employees(&query).await?;
        let next_cursor = items
            .last()
            .map(|last| PageCursor::after(last, options.sort_field, options.direction));
        let has_more = items.len() == page_size;

        debug!(returned = items.len(), has_more, "employee page loaded");
        Ok(EmployeePage {
            items,
            next_cursor,
            has_more,
        })
    }

    pub async fn get_by_id(&self, id: EmployeeId) -> DirectoryResult<Option<Employee>> {
        Ok(self.store.get_employee(id).await?)
    }

    async fn ensure_manager(&self, manager_id: EmployeeId) -> DirectoryResult<()> {
        let manager = self.store.get_employee(manager_id).await?.ok_or_else(|| {
            DomainError::validation(format!("manager {manager_id} does not exist"))
        })?;
        if !manager.is_manager() {
            return Err(DomainError::validation(format!(
                "employee {manager_id} is not a manager"
            ))
            .into());
        }
        Ok(())
    }
}
