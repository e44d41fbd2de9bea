//! Application configuration management.
//!
//! Persisted defaults for scan tuning (chunk sizes, worker counts, retry
//! budget, keep policy, extension allow-list), loaded from the
//! platform-specific config directory and overridden by CLI flags.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::duplicates::{KeepPolicy, MAX_IO_THREADS};
use crate::scanner::hasher::{DEFAULT_BUFFER_SIZE, DEFAULT_CHUNK_SIZE};
use crate::scanner::walker::default_extensions;

/// Minimum allowed partial-hash chunk size in bytes.
pub const MIN_CHUNK_SIZE: usize = 4096;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix/suffix read size for partial hashing; power of two, >= 4 KiB.
    pub chunk_size: usize,
    /// Buffer size for full streaming hashes.
    pub buffer_size: usize,
    /// Hashing worker count; 0 selects the CPU core count.
    pub io_threads: usize,
    /// Default keep selection policy.
    pub keep_policy: KeepPolicy,
    /// Extension allow-list (lowercase, without dot).
    pub extensions: Vec<String>,
    /// Consecutive I/O errors before a root is probed for availability.
    pub max_consecutive_errors: usize,
    /// Root probes attempted before declaring a source unavailable.
    pub source_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            io_threads: 0,
            keep_policy: KeepPolicy::default(),
            extensions: default_extensions(),
            max_consecutive_errors: 8,
            source_retries: 3,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path,
    /// falling back to defaults on any failure.
    #[must_use]
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or the
    /// file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate tuning values.
    ///
    /// # Errors
    ///
    /// Returns an error when the chunk size is not a power of two of at
    /// least 4 KiB, or the worker count is outside 0..=16.
    pub fn validate(&self) -> Result<()> {
        if !self.chunk_size.is_power_of_two() {
            anyhow::bail!("chunk_size must be a power of two, got {}", self.chunk_size);
        }
        if self.chunk_size < MIN_CHUNK_SIZE {
            anyhow::bail!("chunk_size must be at least {}", MIN_CHUNK_SIZE);
        }
        if self.io_threads > MAX_IO_THREADS {
            anyhow::bail!(
                "io_threads must be between 0 (auto) and {}, got {}",
                MAX_IO_THREADS,
                self.io_threads
            );
        }
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("com", "mediadupe", "mediadupe")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_chunk_size_must_be_power_of_two() {
        let config = Config {
            chunk_size: 5000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunk_size_minimum() {
        let config = Config {
            chunk_size: 2048,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_io_threads_bounds() {
        let config = Config {
            io_threads: 16,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            io_threads: 17,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chunk_size, config.chunk_size);
        assert_eq!(back.extensions, config.extensions);
    }
}
