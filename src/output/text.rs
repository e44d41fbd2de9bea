//! Human-readable text report output.

use std::io::Write;

use bytesize::ByteSize;

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Write the scan report as a grouped listing.
///
/// Each group shows its shared size and hash prefix, the keep record first
/// (marked `keep`), then the redundant members.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_text_report(
    writer: &mut impl Write,
    groups: &[DuplicateGroup],
    summary: &ScanSummary,
) -> anyhow::Result<()> {
    if groups.is_empty() {
        writeln!(writer, "No duplicates found in {} files.", summary.total_files)?;
    }

    for (index, group) in groups.iter().enumerate() {
        writeln!(
            writer,
            "Group {} ({} each, {} members, hash {}...)",
            index + 1,
            ByteSize(group.size),
            group.len(),
            &group.hash_hex()[..12]
        )?;
        writeln!(writer, "  keep  {}", group.keep_record().path.display())?;
        for file in group.redundant() {
            writeln!(writer, "        {}", file.path.display())?;
        }
    }

    if !groups.is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "{} duplicate groups, {} redundant files, {} reclaimable",
            summary.groups_found,
            summary.duplicate_files - summary.groups_found,
            summary.reclaimable_display()
        )?;
    }

    if !summary.unavailable_roots.is_empty() {
        writeln!(writer)?;
        for root in &summary.unavailable_roots {
            writeln!(writer, "warning: source unavailable: {}", root.display())?;
        }
    }

    if !summary.skipped.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Skipped {} file(s):", summary.skipped.len())?;
        for skip in &summary.skipped {
            writeln!(writer, "  {} ({})", skip.path.display(), skip.reason)?;
        }
    }

    Ok(())
}
