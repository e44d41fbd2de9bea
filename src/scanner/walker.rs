//! Directory walker for sequential, deterministic file discovery.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one scan root
//! and lazily yielding [`FileRecord`]s for candidate media files.
//!
//! # Features
//!
//! - Deterministic traversal order (entries sorted by name per directory)
//! - Hidden file/directory filtering
//! - Case-insensitive extension allow-list
//! - Gitignore-style exclusion patterns via the `ignore` crate
//! - Symlink cycle avoidance by tracking resolved real directories
//! - Per-entry errors yielded as values, never aborting the walk
//! - Source-availability probing: after a run of consecutive I/O errors the
//!   root is re-probed with bounded retries and backoff, and the walk ends
//!   with [`ScanError::SourceUnavailable`] only if the root itself is gone
//!
//! # Example
//!
//! ```no_run
//! use mediadupe::scanner::{Walker, WalkOptions};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/mnt/photos"), WalkOptions::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}", file.path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

use super::{FileRecord, ScanError, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Allowed file extensions (lowercase, without dot). An empty list
    /// disables extension filtering.
    pub extensions: Vec<String>,

    /// Gitignore-style exclusion patterns applied relative to the root.
    pub exclude_patterns: Vec<String>,

    /// Skip hidden entries (names starting with `.`).
    pub skip_hidden: bool,

    /// Follow symbolic links. Directories that resolve to an already-visited
    /// real directory are skipped regardless, so cycles cannot recurse.
    pub follow_symlinks: bool,

    /// Number of consecutive per-entry I/O errors before the root is
    /// re-probed for availability.
    pub max_consecutive_errors: usize,

    /// Number of root probes attempted before declaring the source
    /// unavailable.
    pub source_retries: u32,

    /// Initial backoff between root probes; doubles per attempt.
    pub retry_backoff: Duration,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_patterns: Vec::new(),
            skip_hidden: true,
            follow_symlinks: true,
            max_consecutive_errors: 8,
            source_retries: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// The default extension allow-list: all known image and video types.
#[must_use]
pub fn default_extensions() -> Vec<String> {
    IMAGE_EXTENSIONS
        .iter()
        .chain(VIDEO_EXTENSIONS.iter())
        .map(|s| (*s).to_string())
        .collect()
}

/// Tracks runs of consecutive per-entry I/O errors for one root.
///
/// A single unreadable file never aborts a walk; a long unbroken run of
/// failures is the signal that the whole source may be gone and the root
/// should be probed.
#[derive(Debug)]
pub(crate) struct SourceHealth {
    consecutive: usize,
    threshold: usize,
}

impl SourceHealth {
    pub(crate) fn new(threshold: usize) -> Self {
        Self {
            consecutive: 0,
            threshold: threshold.max(1),
        }
    }

    /// Record a per-entry error. Returns `true` when the threshold is
    /// reached and the root should be probed.
    pub(crate) fn note_error(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.threshold
    }

    /// Record a successful entry, breaking any error run.
    pub(crate) fn note_ok(&mut self) {
        self.consecutive = 0;
    }

    /// Reset after a successful root probe.
    pub(crate) fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub(crate) fn consecutive(&self) -> usize {
        self.consecutive
    }
}

/// Directory walker for one scan root.
///
/// Finite and not restartable; call [`Walker::walk`] again to re-walk.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    options: WalkOptions,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path, options: WalkOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag becomes `true`, the walk stops at the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Walk the root, lazily yielding file records.
    ///
    /// Per-entry failures are yielded as [`ScanError`] values; the caller
    /// records them as skipped and keeps iterating. A fatal
    /// [`ScanError::SourceUnavailable`] is always the last item.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        let mut inner = WalkDir::new(&self.root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter();

        // Probe the root up front so a dead mount is reported as
        // SourceUnavailable rather than a lone per-entry error.
        let fatal = match fs::metadata(&self.root) {
            Ok(m) if m.is_dir() => None,
            Ok(_) => Some(ScanError::NotADirectory(self.root.clone())),
            Err(_) => {
                if self.await_root() {
                    None
                } else {
                    Some(ScanError::SourceUnavailable {
                        root: self.root.clone(),
                        consecutive_errors: self.options.source_retries as usize + 1,
                    })
                }
            }
        };
        if fatal.is_some() {
            // Drain the inner iterator; only the fatal error will be yielded.
            inner = WalkDir::new(PathBuf::new()).into_iter();
            inner.next();
        }

        Walk {
            walker: self,
            inner,
            exclude: self.build_exclude(),
            visited_dirs: HashSet::new(),
            health: SourceHealth::new(self.options.max_consecutive_errors),
            pending_fatal: fatal,
            done: false,
        }
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the exclusion matcher from configured patterns.
    fn build_exclude(&self) -> Option<Gitignore> {
        if self.options.exclude_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.options.exclude_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid exclude pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gi) if !gi.is_empty() => Some(gi),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build exclude patterns: {}", e);
                None
            }
        }
    }

    /// Probe the root with bounded retries and doubling backoff.
    ///
    /// Returns `true` if the root answered a directory listing within the
    /// retry budget.
    fn await_root(&self) -> bool {
        let mut backoff = self.options.retry_backoff;
        for attempt in 0..=self.options.source_retries {
            if fs::read_dir(&self.root).is_ok() {
                return true;
            }
            if attempt < self.options.source_retries {
                log::debug!(
                    "Root {} unreachable (attempt {}/{}), retrying in {:?}",
                    self.root.display(),
                    attempt + 1,
                    self.options.source_retries + 1,
                    backoff
                );
                std::thread::sleep(backoff);
                backoff = backoff.saturating_mul(2);
            }
        }
        false
    }

    /// Check the extension allow-list (case-insensitive).
    fn extension_allowed(&self, path: &Path) -> bool {
        if self.options.extensions.is_empty() {
            return true;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.options.extensions.iter().any(|allowed| *allowed == ext)
    }

    /// Check if an entry name is hidden.
    fn is_hidden(name: &std::ffi::OsStr) -> bool {
        name.to_string_lossy().starts_with('.')
    }

    /// Check the exclusion matcher for a path.
    fn is_excluded(&self, path: &Path, is_dir: bool, exclude: &Option<Gitignore>) -> bool {
        let Some(gi) = exclude else {
            return false;
        };
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        gi.matched(relative, is_dir).is_ignore()
    }
}

/// Lazy iterator over one root's file records.
///
/// Created by [`Walker::walk`].
pub struct Walk<'a> {
    walker: &'a Walker,
    inner: walkdir::IntoIter,
    exclude: Option<Gitignore>,
    /// Canonicalized directories already entered, for symlink cycle avoidance
    visited_dirs: HashSet<PathBuf>,
    health: SourceHealth,
    pending_fatal: Option<ScanError>,
    done: bool,
}

impl Walk<'_> {
    /// Handle a per-entry I/O failure: track source health and escalate to
    /// `SourceUnavailable` only when the root itself stops answering.
    fn entry_error(&mut self, error: ScanError) -> ScanError {
        if self.health.note_error() {
            if self.walker.await_root() {
                self.health.reset();
            } else {
                self.done = true;
                return ScanError::SourceUnavailable {
                    root: self.walker.root.clone(),
                    consecutive_errors: self.health.consecutive(),
                };
            }
        }
        error
    }

    /// Convert an I/O error on a specific path into a `ScanError`.
    fn classify_io(path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => ScanError::NotFound(path.to_path_buf()),
            _ => ScanError::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<FileRecord, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(fatal) = self.pending_fatal.take() {
            self.done = true;
            return Some(Err(fatal));
        }

        loop {
            if self.walker.is_shutdown_requested() {
                log::debug!("Walker: shutdown requested, stopping iteration");
                self.done = true;
                return None;
            }

            let entry = match self.inner.next() {
                Some(e) => e,
                None => {
                    self.done = true;
                    return None;
                }
            };

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.walker.root.clone(), Path::to_path_buf);
                    let scan_err = match e.into_io_error() {
                        Some(io_err) => Self::classify_io(&path, io_err),
                        // Loop errors from walkdir's own detection: treat as
                        // a silently skipped revisit, matching our own
                        // visited-set behavior.
                        None => {
                            log::debug!("Skipping traversal loop at {}", path.display());
                            continue;
                        }
                    };
                    log::warn!("{}", scan_err);
                    return Some(Err(self.entry_error(scan_err)));
                }
            };

            let path = entry.path();
            let is_root = entry.depth() == 0;

            // Hidden filtering applies below the root only.
            if !is_root
                && self.walker.options.skip_hidden
                && Walker::is_hidden(entry.file_name())
            {
                if entry.file_type().is_dir() {
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if entry.file_type().is_dir() {
                if !is_root && self.walker.is_excluded(path, true, &self.exclude) {
                    log::trace!("Excluding directory: {}", path.display());
                    self.inner.skip_current_dir();
                    continue;
                }

                // Cycle avoidance: resolve the real directory and skip it if
                // this run has already entered it (via a symlink or not).
                match fs::canonicalize(path) {
                    Ok(real) => {
                        if !self.visited_dirs.insert(real) {
                            log::debug!(
                                "Skipping already-visited directory: {}",
                                path.display()
                            );
                            self.inner.skip_current_dir();
                        }
                    }
                    Err(e) => {
                        let scan_err = Self::classify_io(path, e);
                        log::warn!("{}", scan_err);
                        self.inner.skip_current_dir();
                        return Some(Err(self.entry_error(scan_err)));
                    }
                }
                continue;
            }

            // Files from here on.
            if self.walker.is_excluded(path, false, &self.exclude) {
                log::trace!("Excluding file: {}", path.display());
                continue;
            }
            if !self.walker.extension_allowed(path) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    let io_err = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                    let scan_err = Self::classify_io(path, io_err);
                    log::warn!("{}", scan_err);
                    return Some(Err(self.entry_error(scan_err)));
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let size = metadata.len();
            if size == 0 {
                log::debug!("Skipping empty file: {}", path.display());
                continue;
            }

            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            self.health.note_ok();
            return Some(Ok(FileRecord::new(path.to_path_buf(), size, modified)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_media_tree() -> TempDir {
        let dir = TempDir::new().unwrap();

        let mut f = File::create(dir.path().join("a.jpg")).unwrap();
        f.write_all(b"aaa").unwrap();
        let mut f = File::create(dir.path().join("b.MP4")).unwrap();
        f.write_all(b"bbb").unwrap();
        let mut f = File::create(dir.path().join("notes.txt")).unwrap();
        f.write_all(b"ccc").unwrap();
        File::create(dir.path().join("empty.jpg")).unwrap();

        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let mut f = File::create(sub.join("c.png")).unwrap();
        f.write_all(b"ddd").unwrap();

        let hidden = dir.path().join(".cache");
        fs::create_dir(&hidden).unwrap();
        let mut f = File::create(hidden.join("d.png")).unwrap();
        f.write_all(b"eee").unwrap();
        let mut f = File::create(dir.path().join(".hidden.jpg")).unwrap();
        f.write_all(b"fff").unwrap();

        dir
    }

    fn quick_options() -> WalkOptions {
        WalkOptions {
            source_retries: 1,
            retry_backoff: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn collect_names(walker: &Walker) -> Vec<String> {
        walker
            .walk()
            .filter_map(Result::ok)
            .map(|r| {
                r.path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_extension_and_hidden_filtering() {
        let dir = create_media_tree();
        let walker = Walker::new(dir.path(), quick_options());

        let names = collect_names(&walker);
        // txt excluded, empty and hidden files skipped, hidden dir pruned
        assert_eq!(names, vec!["a.jpg", "b.MP4", "c.png"]);
    }

    #[test]
    fn test_walk_is_deterministic() {
        let dir = create_media_tree();
        let walker = Walker::new(dir.path(), quick_options());

        let first = collect_names(&walker);
        let second = collect_names(&walker);
        assert_eq!(first, second);
    }

    #[test]
    fn test_exclude_patterns() {
        let dir = create_media_tree();
        let options = WalkOptions {
            exclude_patterns: vec!["sub/".to_string()],
            ..quick_options()
        };
        let walker = Walker::new(dir.path(), options);

        let names = collect_names(&walker);
        assert_eq!(names, vec!["a.jpg", "b.MP4"]);
    }

    #[test]
    fn test_missing_root_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("vanished");
        let walker = Walker::new(&missing, quick_options());

        let items: Vec<_> = walker.walk().collect();
        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(ScanError::SourceUnavailable { root, .. }) => assert_eq!(root, &missing),
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_file_root_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("single.jpg");
        File::create(&file).unwrap().write_all(b"x").unwrap();

        let walker = Walker::new(&file, quick_options());
        let items: Vec<_> = walker.walk().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ScanError::NotADirectory(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_is_skipped() {
        let dir = create_media_tree();
        // sub/loop -> root, which would revisit everything forever
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("loop")).unwrap();

        let walker = Walker::new(dir.path(), quick_options());
        let names = collect_names(&walker);
        assert_eq!(names, vec!["a.jpg", "b.MP4", "c.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_followed() {
        let dir = create_media_tree();
        std::os::unix::fs::symlink(dir.path().join("a.jpg"), dir.path().join("link.jpg"))
            .unwrap();

        let walker = Walker::new(dir.path(), quick_options());
        let names = collect_names(&walker);
        assert!(names.contains(&"link.jpg".to_string()));
    }

    #[test]
    fn test_shutdown_stops_walk() {
        let dir = create_media_tree();
        let flag = Arc::new(AtomicBool::new(true));
        let walker = Walker::new(dir.path(), quick_options()).with_shutdown_flag(flag);

        assert_eq!(walker.walk().count(), 0);
    }

    #[test]
    fn test_source_health_threshold() {
        let mut health = SourceHealth::new(3);
        assert!(!health.note_error());
        assert!(!health.note_error());
        assert!(health.note_error());
        assert_eq!(health.consecutive(), 3);

        health.reset();
        assert_eq!(health.consecutive(), 0);
    }

    #[test]
    fn test_source_health_run_broken_by_success() {
        // Scenario: a few unreadable files interleaved with readable ones
        // never look like a dead source.
        let mut health = SourceHealth::new(3);
        assert!(!health.note_error());
        assert!(!health.note_error());
        health.note_ok();
        assert!(!health.note_error());
        assert!(!health.note_error());
    }
}
