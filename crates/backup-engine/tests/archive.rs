//! Tests for creating and restoring artifacts
//!

use std::fs;

use backup_engine::archive::{ArchiveError, create_artifact, restore_artifact};
use shared::test::{init_test_logger, write_bytes};

fn write_save(save: &std::path::Path) {
    fs::create_dir_all(save.join("nested").join("deeper")).unwrap();
    fs::write(save.join("map.bin"), [1u8, 2, 3, 4]).unwrap();
    fs::write(save.join("nested").join("file.txt"), "payload").unwrap();
    fs::write(save.join("nested").join("deeper").join("empty.txt"), "").unwrap();
}

#[test]
fn copy_round_trip() {
    init_test_logger();
    let root = tempfile::tempdir().unwrap();
    let save = root.path().join("saves").join("Gamma");
    write_save(&save);

    let artifact = create_artifact(&save, &root.path().join("1700000000_Gamma"), false).unwrap();
    assert!(artifact.is_dir());

    let restored = restore_artifact(&artifact, &root.path().join("GammaRestored")).unwrap();
    assert_eq!(
        fs::read_to_string(restored.join("nested").join("file.txt")).unwrap(),
        "payload"
    );
    assert_eq!(fs::read(restored.join("map.bin")).unwrap(), [1u8, 2, 3, 4]);
    assert!(restored.join("nested").join("deeper").join("empty.txt").is_file());
}

#[test]
fn archive_round_trip() {
    init_test_logger();
    let root = tempfile::tempdir().unwrap();
    let save = root.path().join("saves").join("Gamma");
    write_save(&save);
    fs::create_dir_all(save.join("empty_directory")).unwrap();

    let base = root.path().join("1700000000_Gamma");
    let artifact = create_artifact(&save, &base, true).unwrap();
    assert_eq!(artifact, root.path().join("1700000000_Gamma.zip"));
    assert!(artifact.is_file());

    let target = root.path().join("GammaRestored");
    let restored = restore_artifact(&artifact, &target).unwrap();
    assert_eq!(restored, target);

    // The save directory itself is not an entry, its contents are at the root.
    assert!(!restored.join("Gamma").exists());
    assert_eq!(
        fs::read_to_string(restored.join("nested").join("file.txt")).unwrap(),
        "payload"
    );
    assert_eq!(fs::read(restored.join("map.bin")).unwrap(), [1u8, 2, 3, 4]);
    assert!(restored.join("empty_directory").is_dir());
}

#[test]
fn create_missing_source_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let result = create_artifact(&root.path().join("missing"), &root.path().join("1_missing"), true);

    assert!(matches!(result, Err(ArchiveError::NotFound(_))));
}

#[test]
fn copy_never_overwrites() {
    let root = tempfile::tempdir().unwrap();
    let save = root.path().join("Alpha");
    let destination = root.path().join("1700000000_Alpha");
    write_bytes(&save.join("save.dat"), 8);
    write_bytes(&destination.join("existing.dat"), 8);

    let result = create_artifact(&save, &destination, false);

    assert!(matches!(result, Err(ArchiveError::AlreadyExists(_))));
    assert!(destination.join("existing.dat").exists());
    assert!(!destination.join("save.dat").exists());
}

#[test]
fn archive_never_overwrites() {
    let root = tempfile::tempdir().unwrap();
    let save = root.path().join("Alpha");
    let base = root.path().join("1700000000_Alpha");
    write_bytes(&save.join("save.dat"), 8);
    write_bytes(&root.path().join("1700000000_Alpha.zip"), 3);

    let result = create_artifact(&save, &base, true);

    assert!(matches!(result, Err(ArchiveError::AlreadyExists(_))));
    assert_eq!(fs::read(root.path().join("1700000000_Alpha.zip")).unwrap().len(), 3);
}

#[test]
fn restore_replaces_existing_target() {
    let root = tempfile::tempdir().unwrap();
    let save = root.path().join("Alpha");
    write_bytes(&save.join("save.dat"), 8);
    let artifact = create_artifact(&save, &root.path().join("1_Alpha"), true).unwrap();

    let target = root.path().join("Target");
    write_bytes(&target.join("stale.dat"), 8);

    restore_artifact(&artifact, &target).unwrap();

    assert!(target.join("save.dat").is_file());
    assert!(!target.join("stale.dat").exists());
}

#[test]
fn restore_missing_artifact_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("Target");
    write_bytes(&target.join("keep.dat"), 8);

    let result = restore_artifact(&root.path().join("1_Alpha.zip"), &target);

    assert!(matches!(result, Err(ArchiveError::NotFound(_))));
    assert!(target.join("keep.dat").exists());
}

#[test]
fn restore_loose_file_is_unsupported() {
    let root = tempfile::tempdir().unwrap();
    let artifact = root.path().join("1_Alpha.txt");
    write_bytes(&artifact, 8);
    let target = root.path().join("Target");
    write_bytes(&target.join("keep.dat"), 8);

    let result = restore_artifact(&artifact, &target);

    assert!(matches!(result, Err(ArchiveError::UnsupportedFormat(_))));
    assert!(target.join("keep.dat").exists());
}

#[test]
fn restore_corrupt_archive_keeps_target() {
    let root = tempfile::tempdir().unwrap();
    let artifact = root.path().join("1_Alpha.zip");
    write_bytes(&artifact, 64);
    let target = root.path().join("Target");
    write_bytes(&target.join("keep.dat"), 8);

    let result = restore_artifact(&artifact, &target);

    assert!(matches!(result, Err(ArchiveError::Zip(_))));
    assert!(target.join("keep.dat").exists());
}
