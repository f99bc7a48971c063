//! Integration tests for the directory services sharing one store.
//!
//! Tests: Directory context → services → WriteBatch → RecordStore
//!
//! Verifies:
//! - Every employee references an existing department after any operation
//! - Rejected operations perform zero writes
//! - Failed batches leave no partial state

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use proptest::prelude::*;

    use orgdesk_core::{DepartmentId, DomainError, EmployeeId, ExpectedVersion};
    use orgdesk_directory::{
        DepartmentFields, Email, EmployeePatch, EmployeeStatus, NewEmployee, PlanStage,
        Seniority, plan_membership_change,
    };

    use crate::config::DirectoryConfig;
    use crate::context::Directory;
    use crate::error::DirectoryError;
    use crate::record_store::{InMemoryRecordStore, RecordStore, StoreError};

    type Store = Arc<InMemoryRecordStore>;

    fn setup() -> (Store, Directory<Store>) {
        orgdesk_observability::init();
        let store = Arc::new(InMemoryRecordStore::new());
        let directory = Directory::new(store.clone(), DirectoryConfig::default());
        (store, directory)
    }

    fn employee(email: &str, department_id: DepartmentId, seniority: Seniority) -> NewEmployee {
        NewEmployee {
            name: format!("Employee {email}"),
            email: Email::parse(email).unwrap(),
            status: EmployeeStatus::Active,
            department_id,
            role: "Engineer".to_string(),
            seniority,
            manager_id: None,
            admission_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            base_salary: 800_000,
        }
    }

    async fn department(directory: &Directory<Store>, name: &str) -> DepartmentId {
        directory
            .departments()
            .create(DepartmentFields::new(name, None), &[])
            .await
            .unwrap()
    }

    async fn hire(directory: &Directory<Store>, email: &str, dept: DepartmentId) -> EmployeeId {
        directory
            .employees()
            .create(employee(email, dept, Seniority::Mid))
            .await
            .unwrap()
    }

    async fn department_of(store: &Store, id: EmployeeId) -> DepartmentId {
        store.get_employee(id).await.unwrap().unwrap().department_id
    }

    /// Every employee points at a department that exists right now.
    async fn assert_no_orphans(store: &Store) {
        for employee in store.all_employees().unwrap() {
            assert!(
                store.get_department(employee.department_id).await.unwrap().is_some(),
                "employee {} references missing department {}",
                employee.id,
                employee.department_id
            );
        }
    }

    #[tokio::test]
    async fn roster_edit_moves_removed_members_to_target() {
        let (store, directory) = setup();
        let d1 = department(&directory, "Engenharia").await;
        let d2 = department(&directory, "Suporte").await;
        let e1 = hire(&directory, "e1@x.com", d1).await;
        let e2 = hire(&directory, "e2@x.com", d1).await;
        let e3 = hire(&directory, "e3@x.com", d1).await;
        let e4 = hire(&directory, "e4@x.com", d2).await;

        let plan = directory.migrations().plan(d1, [e2, e3, e4]).await.unwrap();
        assert_eq!(plan.added(), &BTreeSet::from([e4]));
        assert_eq!(plan.removed(), &BTreeSet::from([e1]));
        assert_eq!(plan.stage(), PlanStage::AwaitingTarget);

        let mut prompt = directory.migrations().open_prompt(d1, &plan).await.unwrap();
        assert!(prompt.confirm().is_err());
        prompt.select(d2).unwrap();
        let confirmed = prompt.confirm().unwrap();

        let receipt = directory
            .migrations()
            .apply_plan(
                d1,
                DepartmentFields::new("Engenharia", None),
                &plan,
                Some(confirmed.target),
                ExpectedVersion::Exact(1),
            )
            .await
            .unwrap();

        assert_eq!(receipt.moved_out, BTreeSet::from([e1]));
        assert_eq!(receipt.moved_in, BTreeSet::from([e4]));
        assert_eq!(department_of(&store, e1).await, d2);
        assert_eq!(department_of(&store, e4).await, d1);
        assert_eq!(
            directory.departments().member_ids(d1).await.unwrap(),
            BTreeSet::from([e2, e3, e4])
        );
        assert_no_orphans(&store).await;
    }

    #[tokio::test]
    async fn deleting_a_department_migrates_all_members() {
        let (store, directory) = setup();
        let d1 = department(&directory, "d1").await;
        let d2 = department(&directory, "d2").await;
        let e1 = hire(&directory, "e1@x.com", d1).await;
        let e2 = hire(&directory, "e2@x.com", d1).await;

        directory
            .migrations()
            .delete_department_with_migration(d1, Some(d2))
            .await
            .unwrap();

        assert_eq!(department_of(&store, e1).await, d2);
        assert_eq!(department_of(&store, e2).await, d2);
        assert_eq!(directory.departments().get_by_id(d1).await.unwrap(), None);
        assert_no_orphans(&store).await;
    }

    #[tokio::test]
    async fn duplicate_email_leaves_a_single_holder() {
        let (store, directory) = setup();
        let dept = department(&directory, "TI").await;

        hire(&directory, "a@x.com", dept).await;
        let err = directory
            .employees()
            .create(employee("a@x.com", dept, Seniority::Senior))
            .await
            .unwrap_err();

        assert_eq!(err.domain(), Some(&DomainError::duplicate_email("a@x.com")));
        let holders = store
            .all_employees()
            .unwrap()
            .iter()
            .filter(|e| e.email.as_str() == "a@x.com")
            .count();
        assert_eq!(holders, 1);
    }

    #[tokio::test]
    async fn new_department_pulls_in_manager_and_members() {
        let (store, directory) = setup();
        let origin = department(&directory, "Origem").await;
        let m = directory
            .employees()
            .create(employee("m@x.com", origin, Seniority::Manager))
            .await
            .unwrap();
        let e5 = hire(&directory, "e5@x.com", origin).await;

        let x = directory
            .departments()
            .create(DepartmentFields::new("X", Some(m)), &[m, e5])
            .await
            .unwrap();

        assert_eq!(department_of(&store, m).await, x);
        assert_eq!(department_of(&store, e5).await, x);
        let stored = directory.departments().get_by_id(x).await.unwrap().unwrap();
        assert_eq!(stored.manager_id, Some(m));
    }

    #[tokio::test]
    async fn store_outage_mid_migration_changes_nothing() {
        let (store, directory) = setup();
        let d1 = department(&directory, "d1").await;
        let d2 = department(&directory, "d2").await;
        let e1 = hire(&directory, "e1@x.com", d1).await;
        let e2 = hire(&directory, "e2@x.com", d1).await;
        let writes = store.committed_writes();

        // Second employee move fails after the first was staged.
        store.fail_commit_at_write(1);
        let err = directory
            .migrations()
            .delete_department_with_migration(d1, Some(d2))
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(store.committed_writes(), writes);
        assert_eq!(department_of(&store, e1).await, d1);
        assert_eq!(department_of(&store, e2).await, d1);
        assert!(directory.departments().get_by_id(d1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn member_joining_after_roster_read_fails_the_deletion() {
        let (store, directory) = setup();
        let d1 = department(&directory, "d1").await;
        let d2 = department(&directory, "d2").await;
        hire(&directory, "e1@x.com", d1).await;

        // Build the batch from a stale roster, then let someone join before commit.
        let plan = directory.migrations().plan(d1, Vec::<EmployeeId>::new()).await.unwrap();
        let late = hire(&directory, "late@x.com", d1).await;

        let mut batch = crate::record_store::WriteBatch::new();
        for id in plan.removed() {
            batch.move_employee(*id, d2);
        }
        batch
            .delete_department(d1)
            .require(crate::record_store::Constraint::DepartmentVacant(d1));
        let err: DirectoryError = store.commit(batch).await.unwrap_err().into();

        assert_eq!(err, DirectoryError::Domain(DomainError::DepartmentNotEmpty { members: 1 }));
        assert_eq!(department_of(&store, late).await, d1);
        assert_no_orphans(&store).await;
    }

    #[tokio::test]
    async fn rejected_preconditions_never_reach_the_store() {
        let (store, directory) = setup();
        let d1 = department(&directory, "d1").await;
        let e1 = hire(&directory, "e1@x.com", d1).await;
        let commits = store.commit_count();

        let migrations = directory.migrations();
        let fields = DepartmentFields::new("d1", None);
        assert!(migrations
            .commit_membership_change(d1, fields.clone(), Vec::<EmployeeId>::new(), vec![e1], None)
            .await
            .is_err());
        assert!(migrations
            .delete_department_with_migration(d1, Some(d1))
            .await
            .is_err());
        assert!(migrations.delete_department_with_migration(d1, None).await.is_err());
        assert!(directory.departments().delete(d1).await.is_err());

        assert_eq!(store.commit_count(), commits);
        assert_eq!(department_of(&store, e1).await, d1);
    }

    #[tokio::test]
    async fn unchanged_roster_commits_without_target() {
        let (store, directory) = setup();
        let d1 = department(&directory, "d1").await;
        let e1 = hire(&directory, "e1@x.com", d1).await;

        let plan = directory.migrations().plan(d1, [e1]).await.unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan, plan_membership_change([e1], [e1]));

        let receipt = directory
            .migrations()
            .apply_plan(
                d1,
                DepartmentFields::new("d1 renamed", None),
                &plan,
                None,
                ExpectedVersion::Any,
            )
            .await
            .unwrap();
        assert_eq!(receipt.target, None);
        assert_eq!(receipt.writes, 1);
        assert_eq!(department_of(&store, e1).await, d1);
    }

    #[tokio::test]
    async fn missing_employee_in_batch_is_a_store_not_found() {
        let (_, directory) = setup();
        let d1 = department(&directory, "d1").await;
        let err = directory
            .employees()
            .update(EmployeeId::new(), EmployeePatch::move_to(d1), ExpectedVersion::Any)
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::Domain(DomainError::NotFound));

        let err = directory.employees().delete(EmployeeId::new()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn concurrent_department_edits_are_detected() {
        let (_, directory) = setup();
        let d1 = department(&directory, "d1").await;
        let departments = directory.departments();

        let loaded = departments.get_by_id(d1).await.unwrap().unwrap();
        let expected = ExpectedVersion::of(&loaded);

        departments
            .update(d1, DepartmentFields::new("first editor", None), expected)
            .await
            .unwrap();
        let err = departments
            .update(d1, DepartmentFields::new("second editor", None), expected)
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::Domain(DomainError::StaleWrite(_))));
        let stored = departments.get_by_id(d1).await.unwrap().unwrap();
        assert_eq!(stored.name, "first editor");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Hire { dept: usize },
        CreateDepartment { members: Vec<usize> },
        Transfer { employee: usize, dept: usize },
        Fire { employee: usize },
        DeleteDepartment { dept: usize },
        DeleteWithMigration { dept: usize, target: usize },
        EditRoster { dept: usize, keep: Vec<bool>, add: Vec<usize>, target: Option<usize> },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..8).prop_map(|dept| Op::Hire { dept }),
            prop::collection::vec(0usize..16, 0..4)
                .prop_map(|members| Op::CreateDepartment { members }),
            (0usize..16, 0usize..8).prop_map(|(employee, dept)| Op::Transfer { employee, dept }),
            (0usize..16).prop_map(|employee| Op::Fire { employee }),
            (0usize..8).prop_map(|dept| Op::DeleteDepartment { dept }),
            (0usize..8, 0usize..8)
                .prop_map(|(dept, target)| Op::DeleteWithMigration { dept, target }),
            (
                0usize..8,
                prop::collection::vec(any::<bool>(), 0..6),
                prop::collection::vec(0usize..16, 0..3),
                prop::option::of(0usize..8),
            )
                .prop_map(|(dept, keep, add, target)| Op::EditRoster { dept, keep, add, target }),
        ]
    }

    fn pick<T: Copy>(items: &[T], index: usize) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[index % items.len()])
        }
    }

    /// Apply one operation. Failures are expected and ignored; only the
    /// resulting state matters.
    async fn run(directory: &Directory<Store>, store: &Store, op: Op, serial: &mut usize) {
        let departments: Vec<DepartmentId> = store
            .list_departments()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        let employees: Vec<EmployeeId> = store
            .all_employees()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        *serial += 1;

        match op {
            Op::Hire { dept } => {
                if let Some(dept) = pick(&departments, dept) {
                    let _ = directory
                        .employees()
                        .create(employee(&format!("p{serial}@x.com"), dept, Seniority::Junior))
                        .await;
                }
            }
            Op::CreateDepartment { members } => {
                let members: Vec<EmployeeId> =
                    members.into_iter().filter_map(|i| pick(&employees, i)).collect();
                let _ = directory
                    .departments()
                    .create(DepartmentFields::new(format!("Dept {serial}"), None), &members)
                    .await;
            }
            Op::Transfer { employee, dept } => {
                let picked = (pick(&employees, employee), pick(&departments, dept));
                if let (Some(employee), Some(dept)) = picked {
                    let _ = directory
                        .employees()
                        .update(employee, EmployeePatch::move_to(dept), ExpectedVersion::Any)
                        .await;
                }
            }
            Op::Fire { employee } => {
                if let Some(employee) = pick(&employees, employee) {
                    let _ = directory.employees().delete(employee).await;
                }
            }
            Op::DeleteDepartment { dept } => {
                if let Some(dept) = pick(&departments, dept) {
                    let _ = directory.departments().delete(dept).await;
                }
            }
            Op::DeleteWithMigration { dept, target } => {
                if let Some(dept) = pick(&departments, dept) {
                    let target = pick(&departments, target);
                    let _ = directory
                        .migrations()
                        .delete_department_with_migration(dept, target)
                        .await;
                }
            }
            Op::EditRoster { dept, keep, add, target } => {
                let Some(dept) = pick(&departments, dept) else {
                    return;
                };
                let roster = directory.departments().member_ids(dept).await.unwrap();
                let mut proposed: BTreeSet<EmployeeId> = roster
                    .iter()
                    .zip(keep.iter().chain(std::iter::repeat(&true)))
                    .filter(|(_, keep)| **keep)
                    .map(|(id, _)| *id)
                    .collect();
                proposed.extend(add.into_iter().filter_map(|i| pick(&employees, i)));

                let plan = directory.migrations().plan(dept, proposed).await.unwrap();
                let target = target.and_then(|t| pick(&departments, t));
                let _ = directory
                    .migrations()
                    .apply_plan(
                        dept,
                        DepartmentFields::new(format!("Dept {serial}"), None),
                        &plan,
                        target,
                        ExpectedVersion::Any,
                    )
                    .await;
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn no_employee_is_ever_orphaned(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let (store, directory) = setup();
                department(&directory, "Seed").await;
                let mut serial = 0;
                for op in ops {
                    run(&directory, &store, op, &mut serial).await;
                    assert_no_orphans(&store).await;
                }
            });
        }
    }
}
