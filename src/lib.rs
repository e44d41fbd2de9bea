//! mediadupe - Duplicate Media File Finder
//!
//! A cross-platform Rust library and CLI for finding byte-identical images
//! and videos across local and network-mounted directories, using tiered
//! BLAKE3 hashing (size, partial prefix/suffix hash, full hash), with safe
//! removal of redundant copies via the system trash.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{build_plan, execute_plan, plan_all_redundant, TrashRemover};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::WalkOptions;

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for unexpected failures and for interrupted runs; the
/// caller maps these to exit codes.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Scan(args) => run_scan(&args, cli.quiet),
    }
}

/// Apply CLI overrides on top of the persisted configuration.
///
/// Only flags the user actually passed take effect; absent flags leave the
/// persisted values in place.
fn apply_cli_overrides(config: &mut Config, args: &ScanArgs) {
    if let Some(threads) = args.threads {
        config.io_threads = threads;
    }
    if let Some(retries) = args.retry {
        config.source_retries = retries;
    }
    if let Some(keep) = args.keep {
        config.keep_policy = keep.to_policy();
    }
    if !args.ext.is_empty() {
        config.extensions = args
            .ext
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
    }
}

fn run_scan(args: &ScanArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let mut config = Config::load();
    apply_cli_overrides(&mut config, args);
    config.validate().context("invalid configuration")?;

    let handler = signal::install_handler().context("failed to install signal handler")?;

    let walk_options = WalkOptions {
        extensions: config.extensions.clone(),
        exclude_patterns: args.exclude.clone(),
        max_consecutive_errors: config.max_consecutive_errors,
        source_retries: config.source_retries,
        ..WalkOptions::default()
    };

    // Progress bars only make sense for the human-readable path.
    let show_progress = !quiet && args.output == OutputFormat::Text;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(!show_progress));

    let finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_network_mode(args.network)
        .with_chunk_size(config.chunk_size)
        .with_buffer_size(config.buffer_size)
        .with_keep_policy(config.keep_policy)
        .with_walk_options(walk_options)
        .with_shutdown_flag(handler.get_flag())
        .with_progress(Arc::clone(&progress));

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates(&args.paths)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => output::write_text_report(&mut out, &groups, &summary)?,
        OutputFormat::Json => output::write_json_report(&mut out, &groups, &summary)?,
    }

    if args.trash_duplicates && !groups.is_empty() {
        if !args.yes {
            anyhow::bail!("--trash-duplicates is destructive; pass --yes to confirm");
        }

        // The default plan is valid by construction; running it through the
        // validator keeps a single enforcement point for the survivor rules.
        let selection = plan_all_redundant(&groups).paths().map(Into::into).collect();
        let plan = build_plan(&groups, &selection)?;

        let cleanup = execute_plan(&plan, &TrashRemover, None);
        writeln!(out, "{}", cleanup.summary_line())?;
        for (path, reason) in &cleanup.failures {
            writeln!(out, "  failed: {} ({})", path.display(), reason)?;
        }
    }

    if handler.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }
    if groups.is_empty() {
        return Ok(ExitCode::NoDuplicates);
    }
    if summary.has_warnings() {
        return Ok(ExitCode::PartialSuccess);
    }
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::KeepPolicy;
    use clap::Parser;

    fn scan_args(argv: &[&str]) -> ScanArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Scan(args) => args,
        }
    }

    #[test]
    fn test_persisted_keep_policy_survives_absent_flag() {
        let mut config = Config {
            keep_policy: KeepPolicy::NewestModified,
            ..Config::default()
        };
        let args = scan_args(&["mediadupe", "scan", "/photos"]);

        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.keep_policy, KeepPolicy::NewestModified);
    }

    #[test]
    fn test_keep_flag_overrides_persisted_policy() {
        let mut config = Config {
            keep_policy: KeepPolicy::NewestModified,
            ..Config::default()
        };
        let args = scan_args(&["mediadupe", "scan", "/photos", "--keep", "oldest"]);

        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.keep_policy, KeepPolicy::OldestModified);
    }

    #[test]
    fn test_absent_flags_leave_config_untouched() {
        let mut config = Config {
            io_threads: 6,
            source_retries: 7,
            ..Config::default()
        };
        let args = scan_args(&["mediadupe", "scan", "/photos"]);

        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.io_threads, 6);
        assert_eq!(config.source_retries, 7);
        assert_eq!(config.extensions, Config::default().extensions);
    }

    #[test]
    fn test_ext_override_normalizes() {
        let mut config = Config::default();
        let args = scan_args(&["mediadupe", "scan", "/p", "--ext", ".JPG,png"]);

        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.extensions, vec!["jpg", "png"]);
    }
}
