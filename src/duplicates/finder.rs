//! Duplicate finder implementation with tiered detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Discovery**: walk each root sequentially (see [`crate::scanner::walker`])
//! 2. **Tier 1 - Size grouping**: group files by exact byte size, no I/O
//! 3. **Tier 2 - Partial hash**: prefix/suffix hash within surviving size classes
//! 4. **Tier 3 - Full hash**: full content hash within surviving partial classes
//!
//! Each tier only touches candidates that survived the previous tier, so a
//! file with a unique size is never read at all, and a full read is only
//! charged when a cheap fingerprint failed to disambiguate.
//!
//! Hashing is the only work dispatched to the bounded rayon pool; workers
//! compute digests independently and their results are merged into the
//! run-scoped classification maps sequentially, so no I/O ever happens under
//! a lock and the outcome is independent of completion order.
//!
//! # Example
//!
//! ```no_run
//! use mediadupe::duplicates::DuplicateFinder;
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(&[PathBuf::from("/mnt/photos")])?;
//! println!("{} duplicate groups, {} reclaimable", groups.len(), summary.reclaimable_bytes);
//! # Ok::<(), mediadupe::duplicates::FinderError>(())
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::progress::ProgressCallback;
use crate::scanner::{FileRecord, Hash, HashError, Hasher, WalkOptions, Walker};

use super::groups::{group_by_size, DuplicateGroup, KeepPolicy};

/// Worker cap applied when scanning network-mounted sources, to avoid
/// saturating a slow link with parallel reads.
pub const NETWORK_IO_THREADS: usize = 2;

/// Upper bound on hashing workers regardless of core count.
pub const MAX_IO_THREADS: usize = 16;

/// Configuration for a detection run.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing workers. `0` selects the CPU core count.
    pub io_threads: usize,
    /// Cap workers at [`NETWORK_IO_THREADS`] for slow network mounts.
    pub network_mode: bool,
    /// Prefix/suffix read size for partial hashing.
    pub chunk_size: usize,
    /// Buffer size for full streaming hashes.
    pub buffer_size: usize,
    /// Default keep selection policy for finalized groups.
    pub keep_policy: KeepPolicy,
    /// Walker options applied to every root.
    pub walk_options: WalkOptions,
    /// Optional shutdown flag for cancellation between work items.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("network_mode", &self.network_mode)
            .field("chunk_size", &self.chunk_size)
            .field("buffer_size", &self.buffer_size)
            .field("keep_policy", &self.keep_policy)
            .field("walk_options", &self.walk_options)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 0,
            network_mode: false,
            chunk_size: crate::scanner::hasher::DEFAULT_CHUNK_SIZE,
            buffer_size: crate::scanner::hasher::DEFAULT_BUFFER_SIZE,
            keep_policy: KeepPolicy::default(),
            walk_options: WalkOptions::default(),
            shutdown_flag: None,
            progress: None,
        }
    }
}

impl FinderConfig {
    /// Set the hashing worker count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Enable the network worker cap.
    #[must_use]
    pub fn with_network_mode(mut self, network: bool) -> Self {
        self.network_mode = network;
        self
    }

    /// Set the partial-hash chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the full-hash streaming buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the keep policy.
    #[must_use]
    pub fn with_keep_policy(mut self, policy: KeepPolicy) -> Self {
        self.keep_policy = policy;
        self
    }

    /// Set the walker options.
    #[must_use]
    pub fn with_walk_options(mut self, options: WalkOptions) -> Self {
        self.walk_options = options;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolve the effective worker count for this run.
    #[must_use]
    pub fn effective_io_threads(&self) -> usize {
        let requested = if self.io_threads == 0 {
            std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
        } else {
            self.io_threads
        };
        let capped = requested.clamp(1, MAX_IO_THREADS);
        if self.network_mode {
            capped.min(NETWORK_IO_THREADS)
        } else {
            capped
        }
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A file that was skipped during the run, with the reason.
///
/// Nothing is ever silently dropped: every per-file fault ends up here and
/// is surfaced in the end-of-run summary.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// Path that was skipped
    pub path: PathBuf,
    /// Human-readable reason
    pub reason: String,
}

/// Summary of one detection run.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Files discovered across all roots
    pub total_files: usize,
    /// Total bytes across discovered files
    pub total_bytes: u64,
    /// Finalized duplicate groups
    pub groups_found: usize,
    /// Files that are members of some group
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one member per group
    pub reclaimable_bytes: u64,
    /// Partial hashes computed (tier 2)
    pub partial_hashes: usize,
    /// Full hashes computed with a second read (tier 3)
    pub full_hashes: usize,
    /// Full reads avoided because the partial hash covered the whole file
    pub full_reads_avoided: usize,
    /// Files skipped with their reasons, sorted by path
    pub skipped: Vec<SkippedFile>,
    /// Roots whose walk aborted with `SourceUnavailable`
    pub unavailable_roots: Vec<PathBuf>,
}

impl ScanSummary {
    /// Whether the run completed with non-fatal warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty() || !self.unavailable_roots.is_empty()
    }

    /// Human-readable reclaimable size.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_bytes).to_string()
    }
}

/// Errors that abort a detection run.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The run was cancelled via the shutdown flag.
    #[error("scan interrupted")]
    Interrupted,

    /// No scan roots were supplied.
    #[error("no scan roots supplied")]
    NoRoots,
}

/// Orchestrates the tiered duplicate detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration of this finder.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Run the full pipeline over the given roots.
    ///
    /// Roots whose walk collapses with `SourceUnavailable` are recorded in
    /// the summary as run-level warnings; the remaining roots still
    /// complete. Per-file faults end up in the skipped list.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if cancellation was requested,
    /// [`FinderError::NoRoots`] if `roots` is empty.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        if roots.is_empty() {
            return Err(FinderError::NoRoots);
        }

        let mut summary = ScanSummary::default();
        let records = self.discover(roots, &mut summary)?;
        self.detect(records, summary)
    }

    /// Run tiers 1-3 over already-discovered records.
    ///
    /// Useful when discovery is driven externally (or by tests that need to
    /// inject records for files in particular states).
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if cancellation was requested.
    pub fn find_duplicates_from_records(
        &self,
        records: Vec<FileRecord>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let summary = ScanSummary {
            total_files: records.len(),
            total_bytes: records.iter().map(|r| r.size).sum(),
            ..ScanSummary::default()
        };
        self.detect(records, summary)
    }

    /// Discovery phase: walk each root sequentially.
    fn discover(
        &self,
        roots: &[PathBuf],
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileRecord>, FinderError> {
        if let Some(ref progress) = self.config.progress {
            progress.on_phase_start("discover", 0);
        }

        let mut records = Vec::new();
        for root in roots {
            log::info!("Scanning {}", root.display());
            let mut walker = Walker::new(root, self.config.walk_options.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(Arc::clone(flag));
            }

            for item in walker.walk() {
                match item {
                    Ok(record) => {
                        summary.total_files += 1;
                        summary.total_bytes += record.size;
                        if let Some(ref progress) = self.config.progress {
                            progress
                                .on_progress(summary.total_files, &record.path.to_string_lossy());
                        }
                        records.push(record);
                    }
                    Err(e) if e.is_fatal() => {
                        log::warn!("Aborting root: {}", e);
                        summary.unavailable_roots.push(root.clone());
                    }
                    Err(e) => {
                        summary.skipped.push(SkippedFile {
                            path: e.path().to_path_buf(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            if self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
        }

        if let Some(ref progress) = self.config.progress {
            progress.on_phase_end("discover");
        }
        log::info!(
            "Discovery: {} candidate files ({} skipped, {} unavailable roots)",
            records.len(),
            summary.skipped.len(),
            summary.unavailable_roots.len()
        );

        Ok(records)
    }

    /// Tiers 1-3 over discovered records.
    fn detect(
        &self,
        records: Vec<FileRecord>,
        mut summary: ScanSummary,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let hasher = Arc::new(self.build_hasher());

        // Tier 1: size classes. Pure in-memory comparison, no hashing.
        let (size_classes, _) = group_by_size(records);

        // Tier 2: partial hashes within surviving size classes.
        let partial_classes = self.tier_partial(size_classes, &hasher, &mut summary)?;

        // Tier 3: full hashes within surviving partial classes.
        let mut groups = self.tier_full(partial_classes, &hasher, &mut summary)?;

        // Deterministic output order regardless of map iteration or worker
        // completion order.
        groups.sort_by(|a, b| {
            b.size
                .cmp(&a.size)
                .then_with(|| a.keep_record().path.cmp(&b.keep_record().path))
        });
        summary.skipped.sort_by(|a, b| a.path.cmp(&b.path));

        summary.groups_found = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::len).sum();
        summary.reclaimable_bytes = groups.iter().map(DuplicateGroup::wasted_space).sum();

        if let Some(ref progress) = self.config.progress {
            progress.on_message(&format!(
                "{} duplicate groups, {} reclaimable",
                summary.groups_found,
                summary.reclaimable_display()
            ));
        }

        Ok((groups, summary))
    }

    fn build_hasher(&self) -> Hasher {
        let mut hasher = Hasher::new()
            .with_chunk_size(self.config.chunk_size)
            .with_buffer_size(self.config.buffer_size);
        if let Some(ref flag) = self.config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        hasher
    }

    /// Build the bounded worker pool for hashing work items.
    ///
    /// Returns `None` if pool creation fails; callers fall back to the
    /// global rayon pool.
    fn build_pool(&self) -> Option<rayon::ThreadPool> {
        let threads = self.config.effective_io_threads();
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!(
                    "Failed to create hashing pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                None
            }
        }
    }

    /// Tier 2: compute partial hashes and regroup by (size, partial hash).
    fn tier_partial(
        &self,
        size_classes: HashMap<u64, Vec<FileRecord>>,
        hasher: &Arc<Hasher>,
        summary: &mut ScanSummary,
    ) -> Result<HashMap<(u64, Hash), Vec<FileRecord>>, FinderError> {
        let candidates: Vec<FileRecord> = size_classes.into_values().flatten().collect();
        if candidates.is_empty() {
            return Ok(HashMap::new());
        }

        if let Some(ref progress) = self.config.progress {
            progress.on_phase_start("partial", candidates.len());
        }
        log::info!("Tier 2: partial-hashing {} candidates", candidates.len());

        let results = self.hash_parallel(candidates, |record| hasher.partial_hash(&record.path))?;

        // Merge point: map inserts only, no I/O.
        let mut classes: HashMap<(u64, Hash), Vec<FileRecord>> = HashMap::new();
        for (mut record, result) in results {
            match result {
                Ok(hash) => {
                    summary.partial_hashes += 1;
                    record.partial_hash = Some(hash);
                    classes.entry((record.size, hash)).or_default().push(record);
                }
                Err(e) => self.record_skip(summary, record.path, &e),
            }
        }
        classes.retain(|_, members| members.len() >= 2);

        if let Some(ref progress) = self.config.progress {
            progress.on_phase_end("partial");
        }
        log::info!(
            "Tier 2 complete: {} partial-hash classes survive",
            classes.len()
        );

        Ok(classes)
    }

    /// Tier 3: confirm with full hashes and finalize groups.
    fn tier_full(
        &self,
        partial_classes: HashMap<(u64, Hash), Vec<FileRecord>>,
        hasher: &Arc<Hasher>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        // Records whose partial hash already covered the whole file reuse it
        // as the full hash instead of being charged a second read. A record
        // somehow missing its partial digest simply takes the full-read path.
        let mut small: Vec<(FileRecord, Hash)> = Vec::new();
        let mut large: Vec<FileRecord> = Vec::new();
        for record in partial_classes.into_values().flatten() {
            match record.partial_hash {
                Some(hash) if hasher.covers_whole_file(record.size) => {
                    small.push((record, hash));
                }
                _ => large.push(record),
            }
        }

        if let Some(ref progress) = self.config.progress {
            progress.on_phase_start("full", large.len());
        }
        if !large.is_empty() {
            log::info!(
                "Tier 3: full-hashing {} candidates ({} small files reuse their partial hash)",
                large.len(),
                small.len()
            );
        }

        let results = self.hash_parallel(large, |record| hasher.full_hash(&record.path))?;

        let mut classes: HashMap<(u64, Hash), Vec<FileRecord>> = HashMap::new();
        for (mut record, hash) in small {
            // partial == full for these records
            summary.full_reads_avoided += 1;
            record.full_hash = Some(hash);
            classes.entry((record.size, hash)).or_default().push(record);
        }
        for (mut record, result) in results {
            match result {
                Ok(hash) => {
                    summary.full_hashes += 1;
                    record.full_hash = Some(hash);
                    classes.entry((record.size, hash)).or_default().push(record);
                }
                Err(e) => self.record_skip(summary, record.path, &e),
            }
        }

        if let Some(ref progress) = self.config.progress {
            progress.on_phase_end("full");
        }

        let groups: Vec<DuplicateGroup> = classes
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|((size, hash), members)| {
                DuplicateGroup::new(hash, size, members, self.config.keep_policy)
            })
            .collect();

        Ok(groups)
    }

    /// Run a hashing closure over records in the bounded pool.
    ///
    /// Workers share no mutable state; each returns its record with the
    /// digest result and the caller merges sequentially. Result order
    /// follows input order.
    fn hash_parallel<F>(
        &self,
        records: Vec<FileRecord>,
        hash_fn: F,
    ) -> Result<Vec<(FileRecord, Result<Hash, HashError>)>, FinderError>
    where
        F: Fn(&FileRecord) -> Result<Hash, HashError> + Sync,
    {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let progress = self.config.progress.clone();
        let config = &self.config;
        let hash_fn = &hash_fn;

        let work = move || {
            records
                .into_par_iter()
                .enumerate()
                .map(|(idx, record)| {
                    if config.is_shutdown_requested() {
                        let path = record.path.clone();
                        return (record, Err(HashError::Interrupted(path)));
                    }
                    if let Some(ref progress) = progress {
                        progress.on_progress(idx + 1, &record.path.to_string_lossy());
                    }
                    let result = hash_fn(&record);
                    if result.is_ok() {
                        if let Some(ref progress) = progress {
                            progress.on_item_completed(record.size);
                        }
                    }
                    (record, result)
                })
                .collect::<Vec<_>>()
        };

        let results = match self.build_pool() {
            Some(pool) => pool.install(work),
            None => work(),
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        Ok(results)
    }

    /// Record a per-file hashing fault: skip it, keep its siblings.
    fn record_skip(&self, summary: &mut ScanSummary, path: PathBuf, error: &HashError) {
        log::warn!("Skipping {}: {}", path.display(), error);
        summary.skipped.push(SkippedFile {
            path,
            reason: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    #[test]
    fn test_effective_io_threads_network_cap() {
        let config = FinderConfig::default()
            .with_io_threads(8)
            .with_network_mode(true);
        assert_eq!(config.effective_io_threads(), NETWORK_IO_THREADS);

        let config = FinderConfig::default().with_io_threads(8);
        assert_eq!(config.effective_io_threads(), 8);

        let config = FinderConfig::default().with_io_threads(99);
        assert_eq!(config.effective_io_threads(), MAX_IO_THREADS);
    }

    #[test]
    fn test_builder_sets_hash_sizes() {
        let config = FinderConfig::default()
            .with_chunk_size(8192)
            .with_buffer_size(131_072);
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.buffer_size, 131_072);
    }

    #[test]
    fn test_basic_duplicate_detection() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.jpg", b"XXXXXXXXXX");
        write_file(&dir, "b.jpg", b"XXXXXXXXXX");
        write_file(&dir, "c.jpg", b"YYYYYYYYYY");

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].size, 10);
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.duplicate_files, 2);
        assert_eq!(summary.reclaimable_bytes, 10);
    }

    #[test]
    fn test_unique_sizes_never_hashed() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.jpg", b"1");
        write_file(&dir, "b.jpg", b"22");
        write_file(&dir, "c.jpg", b"333");

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();

        assert!(groups.is_empty());
        assert_eq!(summary.partial_hashes, 0);
        assert_eq!(summary.full_hashes, 0);
    }

    #[test]
    fn test_partial_false_positive_rejected_by_full_hash() {
        let dir = TempDir::new().unwrap();
        let chunk = 1024usize;

        // Same prefix and suffix, different middle: partial hashes collide,
        // full hashes must disagree and no group may form.
        let mut one = vec![b'p'; chunk];
        one.extend(vec![b'm'; chunk * 2]);
        one.extend(vec![b's'; chunk]);
        let mut two = one.clone();
        two[chunk + 5] = b'X';

        write_file(&dir, "big1.mp4", &one);
        write_file(&dir, "big2.mp4", &two);

        let config = FinderConfig::default().with_chunk_size(chunk);
        let finder = DuplicateFinder::new(config);
        let (groups, summary) = finder
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();

        assert!(groups.is_empty());
        assert_eq!(summary.partial_hashes, 2);
        assert_eq!(summary.full_hashes, 2);
    }

    #[test]
    fn test_small_files_not_double_read() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.jpg", b"same tiny content");
        write_file(&dir, "b.jpg", b"same tiny content");

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(summary.partial_hashes, 2);
        assert_eq!(summary.full_hashes, 0);
        assert_eq!(summary.full_reads_avoided, 2);
    }

    #[test]
    fn test_idempotent_runs() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.jpg", b"0123456789");
        write_file(&dir, "b.jpg", b"0123456789");
        write_file(&dir, "c.jpg", b"0123456789");
        write_file(&dir, "d.jpg", b"other data");

        let finder = DuplicateFinder::with_defaults();
        let (first, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
        let (second, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.hash, b.hash);
            assert_eq!(a.keep_record().path, b.keep_record().path);
            let paths_a: Vec<_> = a.files.iter().map(|f| &f.path).collect();
            let paths_b: Vec<_> = b.files.iter().map(|f| &f.path).collect();
            assert_eq!(paths_a, paths_b);
        }
    }

    #[test]
    fn test_unreadable_record_skipped_siblings_survive() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.jpg", b"same bytes");
        let b = write_file(&dir, "b.jpg", b"same bytes");
        let ghost = dir.path().join("ghost.jpg");

        let records = vec![
            FileRecord::new(a, 10, SystemTime::UNIX_EPOCH),
            FileRecord::new(b, 10, SystemTime::UNIX_EPOCH),
            // Same size class, but the file does not exist: its hash fails
            // and only this record must drop out.
            FileRecord::new(ghost.clone(), 10, SystemTime::UNIX_EPOCH),
        ];

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates_from_records(records).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].path, ghost);
    }

    #[test]
    fn test_no_roots_error() {
        let finder = DuplicateFinder::with_defaults();
        assert!(matches!(
            finder.find_duplicates(&[]),
            Err(FinderError::NoRoots)
        ));
    }

    #[test]
    fn test_interrupted_run() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.jpg", b"data data");
        write_file(&dir, "b.jpg", b"data data");

        let flag = Arc::new(AtomicBool::new(true));
        let config = FinderConfig::default().with_shutdown_flag(flag);
        let finder = DuplicateFinder::new(config);

        assert!(matches!(
            finder.find_duplicates(&[dir.path().to_path_buf()]),
            Err(FinderError::Interrupted)
        ));
    }

    #[test]
    fn test_unavailable_root_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.jpg", b"pair pair");
        write_file(&dir, "b.jpg", b"pair pair");
        let missing = dir.path().join("no-such-mount");

        let options = WalkOptions {
            source_retries: 1,
            retry_backoff: std::time::Duration::from_millis(1),
            ..WalkOptions::default()
        };
        let config = FinderConfig::default().with_walk_options(options);
        let finder = DuplicateFinder::new(config);

        let (groups, summary) = finder
            .find_duplicates(&[missing.clone(), dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(summary.unavailable_roots, vec![missing]);
    }
}
