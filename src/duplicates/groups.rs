//! Duplicate grouping, size-based classification, and keep selection.
//!
//! # Overview
//!
//! This module provides the structures for tier 1 of duplicate detection
//! (grouping by exact byte size) and for the finalized [`DuplicateGroup`]s
//! produced by tier 3, including the default "keep" selection policy.
//!
//! ## Size grouping (tier 1)
//!
//! Grouping by size eliminates most candidates instantly, since files with
//! different sizes cannot be duplicates, and costs no I/O at all.
//!
//! # Example
//!
//! ```
//! use mediadupe::scanner::FileRecord;
//! use mediadupe::duplicates::{group_by_size, KeepPolicy};
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let now = SystemTime::now();
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/one.jpg"), 1024, now),
//!     FileRecord::new(PathBuf::from("/two.jpg"), 1024, now),
//!     FileRecord::new(PathBuf::from("/odd.jpg"), 2048, now),
//! ];
//!
//! let (classes, stats) = group_by_size(files);
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(classes.len(), 1);  // only the 1024-byte class survives
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scanner::{hash_to_hex, FileRecord, Hash};

/// Policy for choosing the default "keep" record of a finalized group.
///
/// Every policy breaks ties by lexicographic path so that the selection is
/// deterministic and reproducible given identical inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// Keep the member with the earliest modification time (default).
    #[default]
    OldestModified,
    /// Keep the member with the latest modification time.
    NewestModified,
    /// Keep the member with the shortest path string.
    ShortestPath,
}

impl KeepPolicy {
    /// Select the index of the record to keep.
    ///
    /// # Panics
    ///
    /// Panics if `files` is empty; groups always have at least two members.
    #[must_use]
    pub fn select(self, files: &[FileRecord]) -> usize {
        assert!(!files.is_empty(), "keep selection over empty group");

        let better = |a: &FileRecord, b: &FileRecord| -> Ordering {
            let primary = match self {
                Self::OldestModified => a.modified.cmp(&b.modified),
                Self::NewestModified => b.modified.cmp(&a.modified),
                Self::ShortestPath => a
                    .path
                    .as_os_str()
                    .len()
                    .cmp(&b.path.as_os_str().len()),
            };
            primary.then_with(|| a.path.cmp(&b.path))
        };

        files
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| better(a, b))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

/// A finalized set of files sharing an identical size and full hash.
///
/// Invariants: at least two members, all with equal size and equal full
/// hash. Members are sorted by (modified time, path) so group contents are
/// independent of hashing completion order.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the shared content
    pub hash: Hash,
    /// File size in bytes, shared by all members
    pub size: u64,
    /// Member records, sorted by (modified, path)
    pub files: Vec<FileRecord>,
    /// Index of the designated keep record
    pub keep: usize,
}

impl DuplicateGroup {
    /// Create a new group, sorting members and applying the keep policy.
    #[must_use]
    pub fn new(hash: Hash, size: u64, mut files: Vec<FileRecord>, policy: KeepPolicy) -> Self {
        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        let keep = policy.select(&files);
        Self {
            hash,
            size,
            files,
            keep,
        }
    }

    /// The designated keep record.
    #[must_use]
    pub fn keep_record(&self) -> &FileRecord {
        &self.files[self.keep]
    }

    /// Members other than the keep record, in member order.
    pub fn redundant(&self) -> impl Iterator<Item = &FileRecord> {
        self.files
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.keep)
            .map(|(_, f)| f)
    }

    /// Override the keep selection with a member's path.
    ///
    /// Returns `false` (leaving the selection unchanged) if the path is not
    /// a member of this group.
    pub fn set_keep_path(&mut self, path: &Path) -> bool {
        match self.files.iter().position(|f| f.path == path) {
            Some(idx) => {
                self.keep = idx;
                true
            }
            None => false,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all members.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Bytes reclaimable by deleting everything but the keep record.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.files.len() as u64 - 1)
    }

    /// Hex representation of the shared content hash.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }
}

/// Statistics from the size-grouping tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total files that entered tier 1
    pub total_files: usize,
    /// Files discarded because their size was unique
    pub unique_sizes: usize,
    /// Number of size classes with 2+ files
    pub size_classes: usize,
    /// Files that could still be duplicates after tier 1
    pub potential_duplicates: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated without any hashing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.unique_sizes as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by exact byte size (tier 1).
///
/// Size classes with fewer than two members are discarded immediately; no
/// hashing is ever performed on files with a unique size. The returned map
/// is owned by the caller and scoped to one detection run.
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (HashMap<u64, Vec<FileRecord>>, GroupingStats) {
    let mut classes: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        classes.entry(file.size).or_default().push(file);
    }

    classes.retain(|size, members| {
        if members.len() >= 2 {
            stats.size_classes += 1;
            stats.potential_duplicates += members.len();
            true
        } else {
            log::trace!(
                "Eliminated unique size {}: {}",
                size,
                members[0].path.display()
            );
            stats.unique_sizes += 1;
            false
        }
    });

    log::debug!(
        "Tier 1: {} files -> {} potential duplicates in {} size classes ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.size_classes,
        stats.elimination_rate()
    );

    (classes, stats)
}
