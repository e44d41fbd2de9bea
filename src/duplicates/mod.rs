//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (tier 1)
//! - Partial-hash comparison (tier 2)
//! - Full-hash confirmation (tier 3)
//! - Duplicate group management and keep selection

pub mod finder;
pub mod groups;

pub use finder::{
    DuplicateFinder, FinderConfig, FinderError, ScanSummary, SkippedFile, MAX_IO_THREADS,
    NETWORK_IO_THREADS,
};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats, KeepPolicy};
