//! BLAKE3 file hasher with partial and streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing BLAKE3 digests of
//! file contents. Two fingerprints are offered:
//!
//! - **Partial hash**: the first `chunk_size` bytes plus, for files larger
//!   than `2 * chunk_size`, the last `chunk_size` bytes. Exactly two
//!   contiguous sequential reads, which keeps it cheap on slow network
//!   mounts where seek-heavy access patterns are expensive.
//! - **Full hash**: the entire file streamed in `buffer_size` chunks, so peak
//!   memory stays bounded regardless of file size.
//!
//! Hashing is deterministic and content-addressed: identical bytes produce
//! identical digests regardless of path or timestamps.
//!
//! # Example
//!
//! ```no_run
//! use mediadupe::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let partial = hasher.partial_hash(Path::new("photo.jpg"))?;
//! let full = hasher.full_hash(Path::new("photo.jpg"))?;
//! # Ok::<(), mediadupe::scanner::HashError>(())
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A 256-bit BLAKE3 digest.
pub type Hash = [u8; 32];

/// Default size of the prefix/suffix reads used for partial hashing (4 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default buffer size for full streaming hashes (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Convert a hash to its lowercase hex representation.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Errors that can occur during file hashing.
///
/// Every variant is attributable to a single file; the detector excludes the
/// failing record and continues with its siblings.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was not found (deleted between discovery and hashing).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The operation was cancelled mid-read; the file handle has been
    /// released.
    #[error("hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

/// Computes partial and full BLAKE3 fingerprints for single files.
///
/// The hasher is stateless beyond its configuration and is safe to share
/// across worker threads.
#[derive(Debug, Clone)]
pub struct Hasher {
    /// Size of the prefix/suffix reads for partial hashing
    chunk_size: usize,
    /// Buffer size for full streaming hashes
    buffer_size: usize,
    /// Optional cancellation flag, checked between chunks
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with default chunk and buffer sizes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the prefix/suffix read size for partial hashing.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(512);
        self
    }

    /// Set the buffer size for full streaming hashes.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(4096);
        self
    }

    /// Set the cancellation flag, checked between chunked reads.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured prefix/suffix read size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Whether a partial hash of a file of `size` bytes covers the whole
    /// content.
    ///
    /// For such files the partial and full hashes are identical and
    /// interchangeable; the detector reuses the partial digest instead of
    /// charging a second read.
    #[must_use]
    pub fn covers_whole_file(&self, size: u64) -> bool {
        size <= self.chunk_size as u64 * 2
    }

    /// Compute the partial (prefix/suffix) hash of a file.
    ///
    /// Files no larger than `2 * chunk_size` are hashed in full. Larger files
    /// are read with exactly two sequential reads: the first `chunk_size`
    /// bytes and, after one seek, the last `chunk_size` bytes. If the
    /// seek-to-end fails (seen on flaky network mounts) the hasher falls back
    /// to a full streaming read from the start.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file becomes unreadable mid-operation.
    pub fn partial_hash(&self, path: &Path) -> Result<Hash, HashError> {
        self.check_cancelled(path)?;

        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| map_io_error(path, e))?
            .len();

        if self.covers_whole_file(size) {
            return self.stream_hash(&mut file, path);
        }

        let mut hasher = blake3::Hasher::new();

        // Prefix: one sequential read. A short read means the file shrank
        // under us; hash what was actually there.
        let mut prefix = Vec::with_capacity(self.chunk_size);
        (&mut file)
            .take(self.chunk_size as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| map_io_error(path, e))?;
        hasher.update(&prefix);

        if prefix.len() < self.chunk_size {
            return Ok(*hasher.finalize().as_bytes());
        }

        self.check_cancelled(path)?;

        // Suffix: seek once, then one sequential read. Some network
        // filesystems reject end-relative seeks; fall back to streaming the
        // whole file from the start in that case.
        match file.seek(SeekFrom::End(-(self.chunk_size as i64))) {
            Ok(_) => {
                let mut suffix = Vec::with_capacity(self.chunk_size);
                (&mut file)
                    .take(self.chunk_size as u64)
                    .read_to_end(&mut suffix)
                    .map_err(|e| map_io_error(path, e))?;
                hasher.update(&suffix);
                Ok(*hasher.finalize().as_bytes())
            }
            Err(e) => {
                log::debug!(
                    "End-seek failed for {} ({}), falling back to full read",
                    path.display(),
                    e
                );
                file.seek(SeekFrom::Start(0))
                    .map_err(|e| map_io_error(path, e))?;
                self.stream_hash(&mut file, path)
            }
        }
    }

    /// Compute the full content hash of a file.
    ///
    /// The file is streamed in `buffer_size` chunks; peak memory is
    /// independent of file size. The cancellation flag is honored between
    /// chunks.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file becomes unreadable mid-operation.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        self.check_cancelled(path)?;

        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
        self.stream_hash(&mut file, path)
    }

    /// Stream the remainder of an open file through BLAKE3.
    fn stream_hash(&self, file: &mut File, path: &Path) -> Result<Hash, HashError> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            self.check_cancelled(path)?;

            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Return an error if cancellation has been requested.
    fn check_cancelled(&self, path: &Path) -> Result<(), HashError> {
        let cancelled = self
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst));
        if cancelled {
            Err(HashError::Interrupted(path.to_path_buf()))
        } else {
            Ok(())
        }
    }
}

/// Classify an I/O error for a specific file.
fn map_io_error(path: &Path, error: io::Error) -> HashError {
    match error.kind() {
        io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
