//! Destination prompt shown when members have to leave a department.
//!
//! The prompt is pure state: it is opened with the candidates already loaded,
//! records the user's choice, and either yields a confirmed [`MigrationTarget`]
//! or is cancelled. Cancelling never touches the store.

use orgdesk_core::{DepartmentId, DomainError, DomainResult};

use crate::department::Department;

/// Why the prompt was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationReason {
    /// Members were removed while editing the department.
    MembersRemoved,
    /// The department is being deleted while it still has members.
    DepartmentDeleted,
}

/// Destination chosen and confirmed through a [`MigrationPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationTarget {
    pub source: DepartmentId,
    pub target: DepartmentId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPrompt {
    source: DepartmentId,
    reason: MigrationReason,
    removed_count: usize,
    candidates: Vec<Department>,
    selected: Option<DepartmentId>,
}

impl MigrationPrompt {
    /// Open a prompt for `source`. The source is dropped from `candidates` if present.
    pub fn open(
        source: DepartmentId,
        reason: MigrationReason,
        removed_count: usize,
        candidates: Vec<Department>,
    ) -> Self {
        let candidates = candidates.into_iter().filter(|d| d.id != source).collect();
        Self {
            source,
            reason,
            removed_count,
            candidates,
            selected: None,
        }
    }

    pub fn source(&self) -> DepartmentId {
        self.source
    }

    pub fn reason(&self) -> MigrationReason {
        self.reason
    }

    /// Number of employees that will be moved.
    pub fn removed_count(&self) -> usize {
        self.removed_count
    }

    pub fn candidates(&self) -> &[Department] {
        &self.candidates
    }

    pub fn selected(&self) -> Option<DepartmentId> {
        self.selected
    }

    /// There is nowhere to send the members; the change cannot proceed.
    pub fn has_no_destination(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn select(&mut self, target: DepartmentId) -> DomainResult<()> {
        if target == self.source {
            return Err(DomainError::SameDepartment);
        }
        if !self.candidates.iter().any(|d| d.id == target) {
            return Err(DomainError::validation(format!(
                "department {target} is not a valid destination"
            )));
        }
        self.selected = Some(target);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn can_confirm(&self) -> bool {
        self.selected.is_some()
    }

    /// Confirm the current selection. Blocked until a destination is selected.
    pub fn confirm(&self) -> DomainResult<MigrationTarget> {
        let target = self.selected.ok_or(DomainError::MissingMigrationTarget)?;
        Ok(MigrationTarget {
            source: self.source,
            target,
        })
    }

    /// Abandon the pending change.
    pub fn cancel(self) {}
}
