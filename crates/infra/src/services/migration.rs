//! Membership Migration Engine.
//!
//! Turns a roster edit or a department deletion into one atomic batch that
//! leaves every employee pointing at an existing department.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use orgdesk_core::{DepartmentId, EmployeeId, ExpectedVersion};
use orgdesk_directory::{
    DepartmentFields, MembershipPlan, MigrationPrompt, MigrationReason, MigrationTarget,
    plan_membership_change, resolve_deletion_target,
};

use crate::error::DirectoryResult;
use crate::record_store::{Constraint, RecordStore, WriteBatch};
use crate::services::departments::DepartmentDirectory;

/// What a committed migration did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReceipt {
    pub department_id: DepartmentId,
    /// Destination of the removed members, if anyone moved out.
    pub target: Option<DepartmentId>,
    pub moved_in: BTreeSet<EmployeeId>,
    pub moved_out: BTreeSet<EmployeeId>,
    /// Document writes in the committed batch.
    pub writes: usize,
}

/// How a department deletion has to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionPath {
    /// No members; plain delete.
    Direct,
    /// Members must be moved first; pick a destination through the prompt.
    NeedsMigration(MigrationPrompt),
}

#[derive(Debug, Clone)]
pub struct MembershipMigrator<S> {
    store: S,
    departments: DepartmentDirectory<S>,
}

impl<S> MembershipMigrator<S>
where
    S: RecordStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            departments: DepartmentDirectory::new(store.clone()),
            store,
        }
    }

    /// Diff the department's current roster (read now) against `proposed`.
    pub async fn plan(
        &self,
        department_id: DepartmentId,
        proposed: impl IntoIterator<Item = EmployeeId>,
    ) -> DirectoryResult<MembershipPlan> {
        let original = self.departments.member_ids(department_id).await?;
        Ok(plan_membership_change(original, proposed))
    }

    /// Destination prompt for the members `plan` removes from `department_id`.
    pub async fn open_prompt(
        &self,
        department_id: DepartmentId,
        plan: &MembershipPlan,
    ) -> DirectoryResult<MigrationPrompt> {
        let candidates = self.departments.candidate_destinations(department_id).await?;
        Ok(MigrationPrompt::open(
            department_id,
            MigrationReason::MembersRemoved,
            plan.removed_count(),
            candidates,
        ))
    }

    /// Decide between a plain delete and a migrating one for `department_id`.
    pub async fn prepare_deletion(
        &self,
        department_id: DepartmentId,
    ) -> DirectoryResult<DeletionPath> {
        let members = self.departments.member_ids(department_id).await?;
        if members.is_empty() {
            return Ok(DeletionPath::Direct);
        }
        let candidates = self.departments.candidate_destinations(department_id).await?;
        Ok(DeletionPath::NeedsMigration(MigrationPrompt::open(
            department_id,
            MigrationReason::DepartmentDeleted,
            members.len(),
            candidates,
        )))
    }

    /// Save a department edit together with its roster change.
    ///
    /// Preconditions are checked before the store is contacted: `added` and
    /// `removed` are disjoint, a target is given when anyone is removed and the
    /// target is not the department itself.
    pub async fn commit_membership_change(
        &self,
        department_id: DepartmentId,
        fields: DepartmentFields,
        added: impl IntoIterator<Item = EmployeeId>,
        removed: impl IntoIterator<Item = EmployeeId>,
        target: Option<DepartmentId>,
    ) -> DirectoryResult<MigrationReceipt> {
        let plan = MembershipPlan::from_parts(added, removed)?;
        self.apply_plan(department_id, fields, &plan, target, ExpectedVersion::Any)
            .await
    }

    /// Commit an already computed plan. Nothing is re-read.
    #[tracing::instrument(
        skip(self, fields, plan),
        fields(
            department_id = %department_id,
            added = plan.added().len(),
            removed = plan.removed_count()
        )
    )]
    pub async fn apply_plan(
        &self,
        department_id: DepartmentId,
        fields: DepartmentFields,
        plan: &MembershipPlan,
        target: Option<DepartmentId>,
        expected: ExpectedVersion,
    ) -> DirectoryResult<MigrationReceipt> {
        let target = match plan.resolve_target(department_id, target) {
            Ok(target) => target,
            Err(err) => {
                warn!(error = %err, "membership change rejected");
                return Err(err.into());
            }
        };
        fields.validate()?;

        let mut batch = WriteBatch::new();
        batch
            .patch_department(department_id, fields, expected)
            .require(Constraint::DepartmentExists(department_id));
        for id in plan.added() {
            batch.move_employee(*id, department_id);
        }
        if let Some(target) = target {
            for id in plan.removed() {
                batch.move_employee(*id, target);
            }
            batch.require(Constraint::DepartmentExists(target));
        }

        let receipt = self.store.commit(batch).await?;
        info!(writes = receipt.writes, target = ?target, "membership change committed");

        Ok(MigrationReceipt {
            department_id,
            target,
            moved_in: plan.added().clone(),
            moved_out: if target.is_some() {
                plan.removed().clone()
            } else {
                BTreeSet::new()
            },
            writes: receipt.writes,
        })
    }

    /// Move every member of `department_id` to `target` and delete it, atomically.
    ///
    /// The batch requires the department to be vacant after the moves, so a
    /// member that joined after the roster was read fails the whole batch.
    #[tracing::instrument(skip(self), fields(department_id = %department_id))]
    pub async fn delete_department_with_migration(
        &self,
        department_id: DepartmentId,
        target: Option<DepartmentId>,
    ) -> DirectoryResult<MigrationReceipt> {
        let target = match resolve_deletion_target(department_id, target) {
            Ok(target) => target,
            Err(err) => {
                warn!(error = %err, "department deletion rejected");
                return Err(err.into());
            }
        };

        let members = self.departments.member_ids(department_id).await?;

        let mut batch = WriteBatch::new();
        for id in &members {
            batch.move_employee(*id, target);
        }
        batch
            .delete_department(department_id)
            .require(Constraint::DepartmentExists(target))
            .require(Constraint::DepartmentVacant(department_id));

        let receipt = self.store.commit(batch).await?;
        info!(
            target_id = %target,
            moved = members.len(),
            writes = receipt.writes,
            "department deleted with migration"
        );

        Ok(MigrationReceipt {
            department_id,
            target: Some(target),
            moved_in: BTreeSet::new(),
            moved_out: members,
            writes: receipt.writes,
        })
    }

    /// Finish a deletion confirmed through a [`MigrationPrompt`].
    pub async fn commit_deletion(
        &self,
        confirmed: MigrationTarget,
    ) -> DirectoryResult<MigrationReceipt> {
        self.delete_department_with_migration(confirmed.source, Some(confirmed.target))
            .await
    }
}
