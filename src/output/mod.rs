//! Report rendering for scan results.
//!
//! Two formats:
//! - [`text`]: human-readable grouped listing with totals and skipped files
//! - [`json`]: machine-readable report for scripting

pub mod json;
pub mod text;

pub use json::write_json_report;
pub use text::write_text_report;
