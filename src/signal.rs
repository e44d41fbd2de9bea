//! Signal handling for graceful shutdown.
//!
//! Provides centralized Ctrl+C handling via an `AtomicBool` flag that is
//! shared with the walker, hasher and finder. When the flag is set, the
//! pipeline stops between work items, in-flight chunked reads bail out
//! promptly, and the process exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit code for SIGINT (Ctrl+C) interruption, per Unix convention.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Centralized shutdown handler for coordinated termination.
///
/// `ShutdownHandler` is cheap to clone; all clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared flag, for threading into workers.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Check whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown programmatically.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Install the Ctrl+C handler and return the shared shutdown handler.
///
/// # Errors
///
/// Returns an error if a signal handler is already installed for this
/// process.
pub fn install_handler() -> anyhow::Result<ShutdownHandler> {
    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            // Second signal: the user really wants out.
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Cleaning up...");
    })?;

    Ok(handler)
}
