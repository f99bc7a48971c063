//! Membership diffing and migration preconditions.
//!
//! A department's roster is never stored: it is the set of employees whose
//! `departmentId` points at it. Editing a roster therefore means diffing the
//! roster read from the store against the roster the user proposed, and moving
//! every employee in the difference.
//!
//! ```text
//! Idle ── plan ──▶ DiffComputed ─┬─ removed = ∅ ─▶ AutoCommit ─────┐
//!                                └─ removed ≠ ∅ ─▶ AwaitingTarget ─┴─ commit ─▶ Committed
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use orgdesk_core::{DepartmentId, DomainError, DomainResult, EmployeeId};

/// Where a computed plan sits in the migration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStage {
    /// Nobody leaves the department; the change can be committed as is.
    AutoCommit,
    /// Members leave the department; a destination must be chosen first.
    AwaitingTarget,
}

/// Result of diffing an original roster against a proposed one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPlan {
    added: BTreeSet<EmployeeId>,
    removed: BTreeSet<EmployeeId>,
}

/// Diff two rosters: `added = proposed − original`, `removed = original − proposed`.
pub fn plan_membership_change<O, P>(original: O, proposed: P) -> MembershipPlan
where
    O: IntoIterator<Item = EmployeeId>,
    P: IntoIterator<Item = EmployeeId>,
{
    let original: BTreeSet<EmployeeId> = original.into_iter().collect();
    let proposed: BTreeSet<EmployeeId> = proposed.into_iter().collect();

    MembershipPlan {
        added: proposed.difference(&original).copied().collect(),
        removed: original.difference(&proposed).copied().collect(),
    }
}

impl MembershipPlan {
    /// Rebuild a plan from explicit sets (e.g. sent back by a caller).
    ///
    /// An employee cannot both join and leave the same department.
    pub fn from_parts(
        added: impl IntoIterator<Item = EmployeeId>,
        removed: impl IntoIterator<Item = EmployeeId>,
    ) -> DomainResult<Self> {
        let added: BTreeSet<EmployeeId> = added.into_iter().collect();
        let removed: BTreeSet<EmployeeId> = removed.into_iter().collect();

        if let Some(both) = added.intersection(&removed).next() {
            return Err(DomainError::invariant(format!(
                "employee {both} is both added to and removed from the department"
            )));
        }

        Ok(Self { added, removed })
    }

    pub fn added(&self) -> &BTreeSet<EmployeeId> {
        &self.added
    }

    pub fn removed(&self) -> &BTreeSet<EmployeeId> {
        &self.removed
    }

    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn needs_target(&self) -> bool {
        !self.removed.is_empty()
    }

    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn stage(&self) -> PlanStage {
        if self.needs_target() {
            PlanStage::AwaitingTarget
        } else {
            PlanStage::AutoCommit
        }
    }

    /// Check the destination supplied for this plan's removed members.
    ///
    /// Returns the destination to use, or `None` when nobody has to move out.
    pub fn resolve_target(
        &self,
        source: DepartmentId,
        target: Option<DepartmentId>,
    ) -> DomainResult<Option<DepartmentId>> {
        if target == Some(source) {
            return Err(DomainError::SameDepartment);
        }
        if !self.needs_target() {
            return Ok(None);
        }
        target.map(Some).ok_or(DomainError::MissingMigrationTarget)
    }
}

/// Check the destination for deleting `source`: always required, never the source.
pub fn resolve_deletion_target(
    source: DepartmentId,
    target: Option<DepartmentId>,
) -> DomainResult<DepartmentId> {
    let target = target.ok_or(DomainError::MissingMigrationTarget)?;
    if target == source {
        return Err(DomainError::SameDepartment);
    }
    Ok(target)
}
