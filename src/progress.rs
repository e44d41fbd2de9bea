//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`ProgressCallback`] trait through which the
//! detection pipeline emits its lazy progress stream (files discovered,
//! files hashed, groups found so far), and the [`Progress`] struct which
//! implements it with terminal progress bars for the CLI.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for duplicate detection phases.
///
/// Implement this trait to receive progress updates during the pipeline.
/// All methods may be called from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (`"discover"`, `"partial"`, `"full"`)
    /// * `total` - Total number of items, or 0 when unknown up front
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been fully processed, with its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called with run-level status messages (e.g. groups found so far).
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress reporter.
///
/// Manages one bar per pipeline phase; the discovery phase uses a spinner
/// since its total is unknown up front.
pub struct Progress {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// With `quiet` set, no bars are drawn and all callbacks are no-ops.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix:>8} [{bar:30.cyan/blue}] {pos}/{len} ({eta}) {wide_msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
    }

    fn finish_current(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        self.finish_current();

        let bar = if total == 0 {
            let spinner = self.multi.add(ProgressBar::new_spinner());
            spinner.set_style(Self::spinner_style());
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_message(format!("{}...", phase));
            spinner
        } else {
            let bar = self.multi.add(ProgressBar::new(total as u64));
            bar.set_style(Self::bar_style());
            bar.set_prefix(phase.to_string());
            bar
        };

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                if bar.length().is_some() {
                    bar.set_position(current as u64);
                    bar.set_message(truncate_path(path, 48));
                } else {
                    bar.set_message(format!("{} files: {}", current, truncate_path(path, 48)));
                }
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        self.finish_current();
        log::debug!("Phase {} complete", phase);
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.multi.println(message);
    }
}

/// Truncate a path for display, keeping the tail.
fn truncate_path(path: &str, max: usize) -> String {
    if path.chars().count() <= max {
        path.to_string()
    } else {
        let tail: String = path
            .chars()
            .rev()
            .take(max.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}
