//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Sequential, deterministic directory walking with symlink cycle avoidance
//! - Content hashing with BLAKE3 (partial prefix/suffix and full streaming)
//! - Media type classification by file extension
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (partial and full)
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
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

// Re-export main types
pub use hasher::{hash_to_hex, Hash, HashError, Hasher};
pub use walker::{WalkOptions, Walker};

/// Image extensions recognized by default (lowercase, without dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif", "raw", "cr2", "nef",
    "arw", "dng",
];

/// Video extensions recognized by default (lowercase, without dot).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "mts",
];

/// Media classification of a discovered file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image formats (jpg, png, raw, ...)
    Image,
    /// Video container formats (mp4, mkv, ...)
    Video,
}

impl MediaKind {
    /// Classify a lowercase extension (without the leading dot).
    ///
    /// Returns `None` for extensions that are neither image nor video.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        if IMAGE_EXTENSIONS.contains(&ext) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Classify a path by its extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::from_extension(&ext)
    }
}

/// Identity of a discovered file.
///
/// Path, size and modification time are captured at discovery time and never
/// change afterwards. The hash fields start out absent and are filled in by
/// the detector once the corresponding tier has been computed for the record.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Media classification, if the extension is a known image/video type
    pub media: Option<MediaKind>,
    /// Prefix/suffix hash, once computed (tier 2)
    pub partial_hash: Option<Hash>,
    /// Full content hash, once computed (tier 3)
    pub full_hash: Option<Hash>,
}

impl FileRecord {
    /// Create a new record for a discovered file.
    ///
    /// The media tag is derived from the path's extension; both hash fields
    /// start out absent.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let media = MediaKind::from_path(&path);
        Self {
            path,
            size,
            modified,
            media,
            partial_hash: None,
            full_hash: None,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The specified root is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The whole source collapsed: the root stopped responding and the retry
    /// budget was exhausted. Distinct from a few unreadable files, which are
    /// reported per entry and never abort the walk.
    #[error("source unavailable: {root} (after {consecutive_errors} consecutive I/O errors)")]
    SourceUnavailable {
        /// Root directory that became unreachable
        root: PathBuf,
        /// Number of consecutive I/O errors observed before giving up
        consecutive_errors: usize,
    },
}

impl ScanError {
    /// Whether this error aborts the walk of its root.
    ///
    /// Only [`ScanError::SourceUnavailable`] is fatal; every other variant is
    /// a per-entry fault that the caller records as skipped and continues.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }

    /// The path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } => path,
            Self::SourceUnavailable { root, .. } => root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_new() {
        let record = FileRecord::new(PathBuf::from("/test/photo.JPG"), 1024, SystemTime::now());

        assert_eq!(record.path, PathBuf::from("/test/photo.JPG"));
        assert_eq!(record.size, 1024);
        assert_eq!(record.media, Some(MediaKind::Image));
        assert!(record.partial_hash.is_none());
        assert!(record.full_hash.is_none());
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("jpg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("mkv"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("txt"), None);
    }

    #[test]
    fn test_media_kind_from_path_case_insensitive() {
        assert_eq!(
            MediaKind::from_path(Path::new("/a/B/clip.MP4")),
            Some(MediaKind::Video)
        );
        assert_eq!(MediaKind::from_path(Path::new("/a/noext")), None);
    }

    #[test]
    fn test_scan_error_fatal() {
        let err = ScanError::PermissionDenied(PathBuf::from("/test"));
        assert!(!err.is_fatal());

        let err = ScanError::SourceUnavailable {
            root: PathBuf::from("/mnt/nas"),
            consecutive_errors: 8,
        };
        assert!(err.is_fatal());
        assert_eq!(err.path(), Path::new("/mnt/nas"));
    }
}
