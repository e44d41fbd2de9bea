//! Skip-and-continue and source-availability behavior.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use mediadupe::duplicates::{DuplicateFinder, FinderConfig};
use mediadupe::scanner::{FileRecord, ScanError, WalkOptions, Walker};

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn quick_walk_options() -> WalkOptions {
    WalkOptions {
        source_retries: 1,
        retry_backoff: Duration::from_millis(1),
        ..Default::default()
    }
}

#[test]
fn unreadable_records_skipped_but_siblings_grouped() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a.jpg", b"0123456789");
    let b = write_file(dir.path(), "b.jpg", b"0123456789");

    // Three records in the same size class point at files that no longer
    // exist; their hashes fail one by one but never discard the class.
    let mut records = vec![
        FileRecord::new(a.clone(), 10, SystemTime::UNIX_EPOCH),
        FileRecord::new(b.clone(), 10, SystemTime::UNIX_EPOCH),
    ];
    for i in 0..3 {
        records.push(FileRecord::new(
            dir.path().join(format!("ghost{}.jpg", i)),
            10,
            SystemTime::UNIX_EPOCH,
        ));
    }

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates_from_records(records).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.skipped.len(), 3);
    assert!(summary.unavailable_roots.is_empty());
    for skip in &summary.skipped {
        assert!(skip.reason.contains("not found"), "reason: {}", skip.reason);
    }
}

#[cfg(unix)]
#[test]
fn walk_time_failures_skipped_without_source_collapse() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.jpg", b"same picture");
    write_file(dir.path(), "b.jpg", b"same picture");

    // Dangling symlinks with media extensions fail at stat time, one after
    // another. They must land in the skipped list during discovery, well
    // short of looking like a dead source.
    for i in 0..3 {
        std::os::unix::fs::symlink(
            dir.path().join(format!("no-target{}.jpg", i)),
            dir.path().join(format!("dangling{}.jpg", i)),
        )
        .unwrap();
    }

    let config = FinderConfig::default().with_walk_options(quick_walk_options());
    let finder = DuplicateFinder::new(config);
    let (groups, summary) = finder
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.skipped.len(), 3);
    for (i, skip) in summary.skipped.iter().enumerate() {
        assert_eq!(skip.path, dir.path().join(format!("dangling{}.jpg", i)));
    }
    assert!(summary.unavailable_roots.is_empty());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn dead_root_reported_as_source_unavailable() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("unplugged-nas");

    let walker = Walker::new(&missing, quick_walk_options());
    let items: Vec<_> = walker.walk().collect();

    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(e @ ScanError::SourceUnavailable { root, .. }) => {
            assert!(e.is_fatal());
            assert_eq!(root, &missing);
        }
        other => panic!("expected SourceUnavailable, got {:?}", other),
    }
}

#[test]
fn dead_root_does_not_abort_sibling_roots() {
    let good = TempDir::new().unwrap();
    write_file(good.path(), "a.jpg", b"pair of bytes");
    write_file(good.path(), "b.jpg", b"pair of bytes");
    let dead = good.path().join("gone");

    let config = FinderConfig::default().with_walk_options(quick_walk_options());
    let finder = DuplicateFinder::new(config);
    let (groups, summary) = finder
        .find_duplicates(&[dead.clone(), good.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.unavailable_roots, vec![dead]);
    assert_eq!(groups.len(), 1);
    assert!(summary.has_warnings());
}

#[test]
fn skipped_list_is_sorted_and_complete() {
    let dir = TempDir::new().unwrap();
    let a = write_file(dir.path(), "a.jpg", b"yyyyyyyy");
    let b = write_file(dir.path(), "b.jpg", b"yyyyyyyy");

    let records = vec![
        FileRecord::new(dir.path().join("z-ghost.jpg"), 8, SystemTime::UNIX_EPOCH),
        FileRecord::new(a, 8, SystemTime::UNIX_EPOCH),
        FileRecord::new(dir.path().join("a-ghost.jpg"), 8, SystemTime::UNIX_EPOCH),
        FileRecord::new(b, 8, SystemTime::UNIX_EPOCH),
    ];

    let finder = DuplicateFinder::with_defaults();
    let (_, summary) = finder.find_duplicates_from_records(records).unwrap();

    let skipped: Vec<_> = summary.skipped.iter().map(|s| s.path.clone()).collect();
    assert_eq!(
        skipped,
        vec![dir.path().join("a-ghost.jpg"), dir.path().join("z-ghost.jpg")]
    );
}
