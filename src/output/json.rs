//! JSON report output.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::scanner::FileRecord;

/// Write the scan report as pretty-printed JSON.
///
/// Hashes are hex strings, timestamps RFC 3339; groups and members are in
/// their deterministic detection order.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json_report(
    writer: &mut impl Write,
    groups: &[DuplicateGroup],
    summary: &ScanSummary,
) -> anyhow::Result<()> {
    let report = json!({
        "groups": groups.iter().map(group_value).collect::<Vec<_>>(),
        "summary": {
            "total_files": summary.total_files,
            "total_bytes": summary.total_bytes,
            "groups_found": summary.groups_found,
            "duplicate_files": summary.duplicate_files,
            "reclaimable_bytes": summary.reclaimable_bytes,
            "partial_hashes": summary.partial_hashes,
            "full_hashes": summary.full_hashes,
            "full_reads_avoided": summary.full_reads_avoided,
        },
        "skipped": summary.skipped.iter().map(|s| json!({
            "path": s.path,
            "reason": s.reason,
        })).collect::<Vec<_>>(),
        "unavailable_roots": summary.unavailable_roots,
    });

    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

fn group_value(group: &DuplicateGroup) -> serde_json::Value {
    json!({
        "hash": group.hash_hex(),
        "size": group.size,
        "wasted_bytes": group.wasted_space(),
        "keep": group.keep_record().path,
        "files": group.files.iter().map(file_value).collect::<Vec<_>>(),
    })
}

fn file_value(file: &FileRecord) -> serde_json::Value {
    json!({
        "path": file.path,
        "size": file.size,
        "modified": DateTime::<Utc>::from(file.modified).to_rfc3339(),
        "media": file.media,
    })
}
