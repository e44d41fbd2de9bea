//! Deletion planning and selection validation.
//!
//! # Overview
//!
//! The planner turns a user selection over duplicate groups into a validated
//! [`DeletionPlan`]. It is pure computation: it never touches the
//! filesystem, and an invalid selection is rejected before any deletion is
//! attempted.
//!
//! # Safety invariants
//!
//! - A group's designated keep record can never be marked for deletion.
//! - At least one member of every group must survive.
//! - An empty subset for a group is a valid no-op.
//!
//! # Example
//!
//! ```no_run
//! use mediadupe::actions::{build_plan, plan_all_redundant, Selection};
//! # let groups = vec![];
//!
//! // The default plan removes everything except each group's keep record.
//! let plan = plan_all_redundant(&groups);
//!
//! // Or validate an explicit selection.
//! let mut selection = Selection::new();
//! selection.mark("/photos/copy.jpg");
//! let plan = build_plan(&groups, &selection)?;
//! # Ok::<(), mediadupe::actions::PlanError>(())
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::duplicates::DuplicateGroup;
use crate::scanner::FileRecord;

/// Errors raised by selection validation.
#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    /// Every member of a group was marked; at least one must survive.
    #[error("invalid selection: all {members} members of group {group} marked for deletion")]
    NoSurvivor {
        /// Index of the offending group
        group: usize,
        /// Member count of the group
        members: usize,
    },

    /// The group's designated keep record was marked.
    #[error("invalid selection: keep record {path} of group {group} marked for deletion")]
    KeepMarked {
        /// Index of the offending group
        group: usize,
        /// Path of the keep record
        path: PathBuf,
    },

    /// A marked path belongs to no group.
    #[error("invalid selection: {0} is not a member of any group")]
    UnknownPath(PathBuf),
}

/// A user selection of files marked for removal, identified by path.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    marked: BTreeSet<PathBuf>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a path for removal.
    pub fn mark(&mut self, path: impl Into<PathBuf>) {
        self.marked.insert(path.into());
    }

    /// Unmark a path.
    pub fn unmark(&mut self, path: &Path) {
        self.marked.remove(path);
    }

    /// Check whether a path is marked.
    #[must_use]
    pub fn is_marked(&self, path: &Path) -> bool {
        self.marked.contains(path)
    }

    /// Number of marked paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marked.len()
    }

    /// Check if nothing is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }
}

impl FromIterator<PathBuf> for Selection {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            marked: iter.into_iter().collect(),
        }
    }
}

/// The removal subset of one group.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    /// Index of the group within the detection output
    pub group: usize,
    /// Members marked for removal (never the keep record)
    pub remove: Vec<FileRecord>,
}

/// A validated deletion plan.
///
/// Produced only by [`build_plan`] / [`plan_all_redundant`], so every entry
/// honors the survivor invariants.
#[derive(Debug, Clone, Default)]
pub struct DeletionPlan {
    /// Per-group removal subsets, in group order
    pub entries: Vec<PlanEntry>,
}

impl DeletionPlan {
    /// Total number of files in the plan.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|e| e.remove.len()).sum()
    }

    /// Total bytes that would be reclaimed.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .iter()
            .flat_map(|e| e.remove.iter())
            .map(|f| f.size)
            .sum()
    }

    /// Check if the plan removes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.remove.is_empty())
    }

    /// All planned paths, in plan order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .flat_map(|e| e.remove.iter())
            .map(|f| f.path.as_path())
    }
}

/// Validate a selection against the groups and build a deletion plan.
///
/// # Errors
///
/// - [`PlanError::NoSurvivor`] if a group has every member marked
/// - [`PlanError::KeepMarked`] if a group's keep record is marked
/// - [`PlanError::UnknownPath`] if a marked path belongs to no group
pub fn build_plan(
    groups: &[DuplicateGroup],
    selection: &Selection,
) -> Result<DeletionPlan, PlanError> {
    let mut matched: BTreeSet<&Path> = BTreeSet::new();
    let mut entries = Vec::new();

    for (index, group) in groups.iter().enumerate() {
        let marked: Vec<&FileRecord> = group
            .files
            .iter()
            .filter(|f| selection.is_marked(&f.path))
            .collect();
        for file in &marked {
            matched.insert(file.path.as_path());
        }

        if marked.len() == group.len() {
            return Err(PlanError::NoSurvivor {
                group: index,
                members: group.len(),
            });
        }
        if selection.is_marked(&group.keep_record().path) {
            return Err(PlanError::KeepMarked {
                group: index,
                path: group.keep_record().path.clone(),
            });
        }

        entries.push(PlanEntry {
            group: index,
            remove: marked.into_iter().cloned().collect(),
        });
    }

    if let Some(unknown) = selection
        .marked
        .iter()
        .find(|p| !matched.contains(p.as_path()))
    {
        return Err(PlanError::UnknownPath(unknown.clone()));
    }

    Ok(DeletionPlan { entries })
}

/// Build the default plan: every member except the keep record.
///
/// Always valid by construction, so this cannot fail.
#[must_use]
pub fn plan_all_redundant(groups: &[DuplicateGroup]) -> DeletionPlan {
    let entries = groups
        .iter()
        .enumerate()
        .map(|(index, group)| PlanEntry {
            group: index,
            remove: group.redundant().cloned().collect(),
        })
        .collect();
    DeletionPlan { entries }
}
