//! Tests for listing backups
//!

use backup_engine::catalog::list_backups;
use shared::test::{set_modified, write_bytes};

#[test]
fn filters_by_save_name() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("100_Alpha");
    write_bytes(&target.join("payload.bin"), 10);
    write_bytes(&root.path().join("101_Beta").join("payload.bin"), 10);
    write_bytes(&root.path().join("102_Alpha.zip"), 10);
    write_bytes(&root.path().join("103_AlphaBeta.zip"), 10);

    let backups = list_backups(root.path(), Some("Alpha")).unwrap();
    let mut names: Vec<_> = backups
        .iter()
        .map(|backup| backup.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();

    assert_eq!(names, ["100_Alpha", "102_Alpha.zip"]);
    assert!(backups.iter().all(|backup| backup.save_name.as_deref() == Some("Alpha")));
}

#[test]
fn newest_first() {
    let root = tempfile::tempdir().unwrap();
    for (index, modified) in [(0, 300), (1, 100), (2, 200)] {
        let path = root.path().join(format!("{index}_Alpha.zip"));
        write_bytes(&path, 10);
        set_modified(&path, modified);
    }

    let backups = list_backups(root.path(), None).unwrap();
    let names: Vec<_> = backups
        .iter()
        .map(|backup| backup.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();

    assert_eq!(names, ["0_Alpha.zip", "2_Alpha.zip", "1_Alpha.zip"]);
}

#[test]
fn ignores_loose_files() {
    let root = tempfile::tempdir().unwrap();
    write_bytes(&root.path().join("100_Alpha.txt"), 10);
    write_bytes(&root.path().join("notes"), 10);
    write_bytes(&root.path().join("101_Alpha.zip"), 10);
    write_bytes(&root.path().join("102_Alpha").join("payload.bin"), 10);

    let backups = list_backups(root.path(), None).unwrap();

    assert_eq!(backups.len(), 2);
    let archive = backups.iter().find(|backup| backup.is_archive).unwrap();
    assert!(archive.path.ends_with("101_Alpha.zip"));
    assert_eq!(archive.size_bytes(), 10);
}

#[test]
fn unprefixed_names_never_match_a_filter() {
    let root = tempfile::tempdir().unwrap();
    write_bytes(&root.path().join("Alpha").join("payload.bin"), 10);
    write_bytes(&root.path().join("100_Alpha").join("payload.bin"), 10);

    let filtered = list_backups(root.path(), Some("Alpha")).unwrap();
    let unfiltered = list_backups(root.path(), None).unwrap();

    assert_eq!(filtered.len(), 1);
    assert!(filtered[0].path.ends_with("100_Alpha"));
    assert_eq!(unfiltered.len(), 2);
}

#[test]
fn missing_directory_is_empty() {
    let root = tempfile::tempdir().unwrap();

    let backups = list_backups(&root.path().join("missing"), None).unwrap();

    assert!(backups.is_empty());
}
