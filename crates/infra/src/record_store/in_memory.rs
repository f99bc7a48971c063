use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};

use orgdesk_core::{DepartmentId, EmployeeId, ExpectedVersion};
use orgdesk_directory::{Department, Employee};

use super::batch::{Collection, Constraint, Write, WriteBatch};
use super::query::EmployeeQuery;
use super::r#trait::{CommitReceipt, RecordStore, StoreError, Violation};

#[derive(Debug, Clone, Default)]
struct Collections {
    employees: BTreeMap<EmployeeId, Employee>,
    departments: BTreeMap<DepartmentId, Department>,
}

/// Injected failure for the next commit.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fault {
    /// Reject the commit before staging anything.
    Reject(String),
    /// Fail while staging the write at this index (earlier writes already staged).
    AtWrite(usize),
}

/// In-memory record store.
///
/// Intended for tests/dev. Batches are staged on a copy of the collections and
/// swapped in only once every write and constraint succeeded, which gives the
/// all-or-nothing contract of [`RecordStore::commit`].
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    state: RwLock<Collections>,
    fault: Mutex<Option<Fault>>,
    commits: AtomicUsize,
    committed_writes: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with `Unavailable` without staging anything.
    pub fn fail_next_commit(&self, reason: impl Into<String>) {
        self.set_fault(Fault::Reject(reason.into()));
    }

    /// Make the next commit fail with `Unavailable` while staging write `index`.
    pub fn fail_commit_at_write(&self, index: usize) {
        self.set_fault(Fault::AtWrite(index));
    }

    /// Number of successfully committed batches.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of document writes made visible by committed batches.
    pub fn committed_writes(&self) -> usize {
        self.committed_writes.load(Ordering::SeqCst)
    }

    /// Copy of every employee record (invariant checks in tests).
    pub fn all_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.employees.values().cloned().collect())
    }

    fn set_fault(&self, fault: Fault) {
        if let Ok(mut slot) = self.fault.lock() {
            *slot = Some(fault);
        }
    }

    fn take_fault(&self) -> Result<Option<Fault>, StoreError> {
        let mut slot = self.fault.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(slot.take())
    }
}

impl Collections {
    fn apply(&mut self, write: Write, now: DateTime<Utc>) -> Result<(), StoreError> {
        match write {
            Write::InsertEmployee { id, employee } => {
                if self.employees.contains_key(&id) {
                    return Err(already_exists(Collection::Employees, id));
                }
                self.employees.insert(id, Employee::from_new(id, employee, now));
            }
            Write::PatchEmployee { id, patch, expected } => {
                let record = self
                    .employees
                    .get_mut(&id)
                    .ok_or_else(|| not_found(Collection::Employees, id))?;
                if let ExpectedVersion::Exact(v) = expected {
                    if v != record.version {
                        return Err(StoreError::StaleWrite {
                            collection: Collection::Employees,
                            id: id.to_string(),
                            expected: v,
                            actual: record.version,
                        });
                    }
                }
                patch.apply_to(record);
                record.version += 1;
            }
            Write::DeleteEmployee { id } => {
                self.employees
                    .remove(&id)
                    .ok_or_else(|| not_found(Collection::Employees, id))?;
            }
            Write::InsertDepartment { id, fields } => {
                if self.departments.contains_key(&id) {
                    return Err(already_exists(Collection::Departments, id));
                }
                self.departments.insert(id, Department::from_fields(id, fields, now));
            }
            Write::PatchDepartment { id, fields, expected } => {
                let record = self
                    .departments
                    .get_mut(&id)
                    .ok_or_else(|| not_found(Collection::Departments, id))?;
                if let ExpectedVersion::Exact(v) = expected {
                    if v != record.version {
                        return Err(StoreError::StaleWrite {
                            collection: Collection::Departments,
                            id: id.to_string(),
                            expected: v,
                            actual: record.version,
                        });
                    }
                }
                fields.apply_to(record);
                record.version += 1;
            }
            Write::DeleteDepartment { id } => {
                self.departments
                    .remove(&id)
                    .ok_or_else(|| not_found(Collection::Departments, id))?;
            }
        }
        Ok(())
    }

    fn check(&self, constraint: &Constraint) -> Result<(), StoreError> {
        let violation = match constraint {
            Constraint::DepartmentExists(id) => {
                (!self.departments.contains_key(id)).then(|| Violation::MissingDepartment(*id))
            }
            Constraint::DepartmentVacant(id) => {
                let members = self.employees.values().filter(|e| e.belongs_to(*id)).count();
                (members > 0).then(|| Violation::OccupiedDepartment {
                    department_id: *id,
                    members,
                })
            }
            Constraint::UniqueEmail(email) => {
                let holders = self.employees.values().filter(|e| e.email == *email).count();
                (holders > 1).then(|| Violation::DuplicateEmail(email.clone()))
            }
            Constraint::EmployeeIsManager(id) => {
                let is_manager = self.employees.get(id).is_some_and(Employee::is_manager);
                (!is_manager).then(|| Violation::NotAManager(*id))
            }
            Constraint::HasNoReports(id) => {
                let reports = self
                    .employees
                    .values()
                    .filter(|e| e.manager_id == Some(*id))
                    .count();
                (reports > 0).then(|| Violation::HasReports {
                    manager_id: *id,
                    reports,
                })
            }
        };

        match violation {
            Some(v) => Err(StoreError::ConstraintViolation(v)),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.employees.get(&id).cloned())
    }

    async fn query_employees(&self, query: &EmployeeQuery) -> Result<Vec<Employee>, StoreError> {
        query.validate().map_err(StoreError::InvalidQuery)?;
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(query.run(state.employees.values()))
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.departments.get(&id).cloned())
    }

    async fn list_departments(&self) -> Result<Vec<Department>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut departments: Vec<Department> = state.departments.values().cloned().collect();
        departments.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(departments)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        let fault = self.take_fault()?;
        if let Some(Fault::Reject(reason)) = &fault {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let fail_at = match fault {
            Some(Fault::AtWrite(index)) => Some(index),
            _ => None,
        };

        let (writes, constraints) = batch.into_parts();
        let write_count = writes.len();
        let now = Utc::now();

        // The write guard is held for the whole staging so batches serialize.
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut staged = state.clone();

        for (index, write) in writes.into_iter().enumerate() {
            if fail_at == Some(index) {
                return Err(StoreError::Unavailable(format!(
                    "injected failure at write {index}"
                )));
            }
            staged.apply(write, now)?;
        }

        for constraint in &constraints {
            staged.check(constraint)?;
        }

        *state = staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.committed_writes.fetch_add(write_count, Ordering::SeqCst);

        Ok(CommitReceipt {
            writes: write_count,
            committed_at: now,
        })
    }
}

fn not_found(collection: Collection, id: impl ToString) -> StoreError {
    StoreError::NotFound {
        collection,
        id: id.to_string(),
    }
}

fn already_exists(collection: Collection, id: impl ToString) -> StoreError {
    StoreError::AlreadyExists {
        collection,
        id: id.to_string(),
    }
}
