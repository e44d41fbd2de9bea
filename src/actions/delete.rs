//! Plan execution against the system trash.
//!
//! # Overview
//!
//! This module carries a validated [`DeletionPlan`](super::DeletionPlan) to
//! the trash collaborator, one path at a time, and aggregates per-file
//! outcomes into a [`CleanupSummary`]. A per-file failure never blocks the
//! remaining entries of the plan.
//!
//! Before each removal the file is re-stat'ed and compared against the
//! record captured at discovery time; a file that changed size or
//! modification time since the scan is reported as failed rather than
//! removed.
//!
//! # Example
//!
//! ```no_run
//! use mediadupe::actions::{execute_plan, plan_all_redundant, TrashRemover};
//! # let groups = vec![];
//!
//! let plan = plan_all_redundant(&groups);
//! let summary = execute_plan(&plan, &TrashRemover, None);
//! println!("{}", summary.summary_line());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::scanner::FileRecord;

use super::plan::DeletionPlan;

/// Abstraction over the external removal collaborator.
///
/// The core only ever calls this through a validated plan; the
/// implementation is responsible for moving the file to a recoverable
/// location.
pub trait Remover: Send + Sync {
    /// Remove a single file, reporting failure with a reason.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the file could not be removed.
    fn remove(&self, path: &Path) -> Result<(), String>;
}

/// Removal via the cross-platform system trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrashRemover;

impl Remover for TrashRemover {
    fn remove(&self, path: &Path) -> Result<(), String> {
        trash::delete(path).map_err(|e| e.to_string())
    }
}

/// Per-file outcomes of one plan execution.
#[derive(Debug, Clone, Default)]
pub struct CleanupSummary {
    /// Paths successfully handed to the remover
    pub removed: Vec<PathBuf>,
    /// Bytes reclaimed across removed files
    pub bytes_reclaimed: u64,
    /// Failed paths with their reasons
    pub failures: Vec<(PathBuf, String)>,
}

impl CleanupSummary {
    /// Number of files removed.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every removal succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line human-readable summary.
    #[must_use]
    pub fn summary_line(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Removed {} file(s), reclaimed {}",
                self.removed_count(),
                bytesize::ByteSize(self.bytes_reclaimed)
            )
        } else {
            format!(
                "Removed {} file(s), {} failed, reclaimed {}",
                self.removed_count(),
                self.failure_count(),
                bytesize::ByteSize(self.bytes_reclaimed)
            )
        }
    }
}

/// Progress callback for plan execution: (path, current, total).
pub type DeleteProgress<'a> = &'a dyn Fn(&Path, usize, usize);

/// Execute a validated plan, one path at a time.
///
/// Each file is verified against its discovery-time record before removal;
/// verification or removal failures are recorded and execution continues
/// with the next file.
#[must_use]
pub fn execute_plan(
    plan: &DeletionPlan,
    remover: &dyn Remover,
    progress: Option<DeleteProgress<'_>>,
) -> CleanupSummary {
    let total = plan.file_count();
    let mut summary = CleanupSummary::default();
    let mut current = 0;

    for entry in &plan.entries {
        for record in &entry.remove {
            current += 1;
            if let Some(cb) = progress {
                cb(&record.path, current, total);
            }

            if let Err(reason) = verify_unchanged(record) {
                log::warn!("Not removing {}: {}", record.path.display(), reason);
                summary.failures.push((record.path.clone(), reason));
                continue;
            }

            match remover.remove(&record.path) {
                Ok(()) => {
                    log::info!("Removed {}", record.path.display());
                    summary.removed.push(record.path.clone());
                    summary.bytes_reclaimed += record.size;
                }
                Err(reason) => {
                    log::warn!("Failed to remove {}: {}", record.path.display(), reason);
                    summary.failures.push((record.path.clone(), reason));
                }
            }
        }
    }

    summary
}

/// Verify a file still matches its discovery-time record.
fn verify_unchanged(record: &FileRecord) -> Result<(), String> {
    let metadata = match fs::metadata(&record.path) {
        Ok(m) => m,
        Err(e) => return Err(format!("file no longer accessible: {}", e)),
    };
    if metadata.len() != record.size {
        return Err(format!(
            "file changed since scan (size {} -> {})",
            record.size,
            metadata.len()
        ));
    }
    if let Ok(modified) = metadata.modified() {
        if modified != record.modified {
            return Err("file modified since scan".to_string());
        }
    }
    Ok(())
}
