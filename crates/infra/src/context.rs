//! Application context shared by every screen of the admin panel.

use tracing::debug;

use crate::config::DirectoryConfig;
use crate::record_store::RecordStore;
use crate::services::{DepartmentDirectory, EmployeeDirectory, MembershipMigrator};

/// One store, one configuration, three services.
///
/// `S` is usually an `Arc<impl RecordStore>`, so cloning the services is cheap
/// and every service observes the same committed state.
#[derive(Debug, Clone)]
pub struct Directory<S> {
    config: DirectoryConfig,
    employees: EmployeeDirectory<S>,
    departments: DepartmentDirectory<S>,
    migrations: MembershipMigrator<S>,
}

impl<S> Directory<S>
where
    S: RecordStore + Clone,
{
    pub fn new(store: S, config: DirectoryConfig) -> Self {
        debug!(
            default_page_size = config.default_page_size,
            max_page_size = config.max_page_size,
            "directory context created"
        );
        Self {
            config,
            employees: EmployeeDirectory::new(store.clone(), config),
            departments: DepartmentDirectory::new(store.clone()),
            migrations: MembershipMigrator::new(store),
        }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn employees(&self) -> &EmployeeDirectory<S> {
        &self.employees
    }

    pub fn departments(&self) -> &DepartmentDirectory<S> {
        &self.departments
    }

    pub fn migrations(&self) -> &MembershipMigrator<S> {
        &self.migrations
    }
}
