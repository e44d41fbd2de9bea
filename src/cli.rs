//! Command-line interface definitions.
//!
//! All CLI arguments and options using the clap derive API. Global options
//! (verbosity, JSON errors) sit on [`Cli`]; the `scan` subcommand carries
//! the per-run options.
//!
//! # Example
//!
//! ```bash
//! # Scan two roots with default media extensions
//! mediadupe scan ~/Pictures /mnt/nas/photos
//!
//! # Restrict extensions, cap workers for a slow mount
//! mediadupe scan /mnt/nas --ext jpg,mp4 --network
//!
//! # Move every redundant copy to the trash
//! mediadupe scan ~/Pictures --trash-duplicates --yes
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::duplicates::KeepPolicy;

/// Duplicate media file finder for local and network-mounted directories.
///
/// mediadupe finds byte-identical images and videos using tiered BLAKE3
/// hashing and can move redundant copies to the system trash.
#[derive(Debug, Parser)]
#[command(name = "mediadupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate media files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Root directories to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Comma-separated extension allow-list (default: known image/video types)
    #[arg(long, value_name = "EXT,EXT", value_delimiter = ',')]
    pub ext: Vec<String>,

    /// Gitignore-style exclusion patterns (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Number of hashing workers (default: CPU core count, max 16)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Cap workers for slow network mounts
    #[arg(long)]
    pub network: bool,

    /// Keep selection policy for each duplicate group
    /// (default: the persisted config value, or oldest)
    #[arg(long, value_enum)]
    pub keep: Option<KeepArg>,

    /// Root probe retries before a source is declared unavailable
    #[arg(long, value_name = "N")]
    pub retry: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Move every redundant copy to the system trash (requires --yes)
    #[arg(long)]
    pub trash_duplicates: bool,

    /// Confirm destructive operations without prompting
    #[arg(long)]
    pub yes: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable grouped listing
    Text,
    /// Machine-readable JSON report
    Json,
}

/// CLI-facing keep policy names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeepArg {
    /// Keep the oldest copy (default)
    Oldest,
    /// Keep the newest copy
    Newest,
    /// Keep the copy with the shortest path
    ShortestPath,
}

impl KeepArg {
    /// Convert to the detector's keep policy.
    #[must_use]
    pub fn to_policy(self) -> KeepPolicy {
        match self {
            Self::Oldest => KeepPolicy::OldestModified,
            Self::Newest => KeepPolicy::NewestModified,
            Self::ShortestPath => KeepPolicy::ShortestPath,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_scan() {
        let cli = Cli::try_parse_from(["mediadupe", "scan", "/photos"]).unwrap();
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.paths, vec![PathBuf::from("/photos")]);
                assert_eq!(args.output, OutputFormat::Text);
                // Absent --keep must stay absent so the persisted config
                // value can apply.
                assert_eq!(args.keep, None);
            }
        }
    }

    #[test]
    fn test_keep_flag_parses_when_given() {
        let cli = Cli::try_parse_from(["mediadupe", "scan", "/p", "--keep", "newest"]).unwrap();
        match cli.command {
            Commands::Scan(args) => assert_eq!(args.keep, Some(KeepArg::Newest)),
        }
    }

    #[test]
    fn test_cli_requires_path() {
        assert!(Cli::try_parse_from(["mediadupe", "scan"]).is_err());
    }

    #[test]
    fn test_ext_list_parsing() {
        let cli =
            Cli::try_parse_from(["mediadupe", "scan", "/p", "--ext", "jpg,png,mp4"]).unwrap();
        match cli.command {
            Commands::Scan(args) => assert_eq!(args.ext, vec!["jpg", "png", "mp4"]),
        }
    }

    #[test]
    fn test_keep_arg_mapping() {
        assert_eq!(KeepArg::Oldest.to_policy(), KeepPolicy::OldestModified);
        assert_eq!(KeepArg::Newest.to_policy(), KeepPolicy::NewestModified);
        assert_eq!(KeepArg::ShortestPath.to_policy(), KeepPolicy::ShortestPath);
    }

    #[test]
    fn test_verbose_quiet_conflict() {
        assert!(Cli::try_parse_from(["mediadupe", "-v", "-q", "scan", "/p"]).is_err());
    }
}
