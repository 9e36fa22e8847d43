use std::fs;

use event_sink::{CheckpointStore, SaveOutcome, StorageError, StorageLayout};
use tempfile::tempdir;

#[test]
fn cold_start_loads_zero_and_creates_root() {
    let tmp = tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path().join("nested/root"));
    let store = CheckpointStore::open(&layout).expect("open without prior state");
    assert_eq!(store.watermark(), 0);
    assert_eq!(store.load().unwrap(), 0);
    assert!(layout.root().is_dir());
    assert!(!layout.checkpoint_path().exists());
}

#[test]
fn empty_checkpoint_file_reads_as_zero() {
    let tmp = tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    fs::write(layout.checkpoint_path(), "").unwrap();
    let store = CheckpointStore::open(&layout).unwrap();
    assert_eq!(store.watermark(), 0);
}

#[test]
fn save_persists_plain_decimal_across_reopen() {
    let tmp = tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    let mut store = CheckpointStore::open(&layout).unwrap();
    assert_eq!(store.save(42).unwrap(), SaveOutcome::Persisted(42));
    assert_eq!(fs::read_to_string(layout.checkpoint_path()).unwrap(), "42");
    assert_eq!(store.path(), layout.checkpoint_path().as_path());

    let reopened = CheckpointStore::open(&layout).unwrap();
    assert_eq!(reopened.watermark(), 42);
    assert_eq!(reopened.load().unwrap(), 42);
}

#[test]
fn stale_save_is_ignored() {
    let tmp = tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    let mut store = CheckpointStore::open(&layout).unwrap();
    store.save(100).unwrap();
    assert_eq!(
        store.save(99).unwrap(),
        SaveOutcome::Stale { watermark: 100 }
    );
    assert_eq!(store.watermark(), 100);
    assert_eq!(fs::read_to_string(layout.checkpoint_path()).unwrap(), "100");
}

#[test]
fn shorter_version_overwrites_whole_file() {
    let tmp = tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    fs::write(layout.checkpoint_path(), "0000012345").unwrap();
    let mut store = CheckpointStore::open(&layout).unwrap();
    assert_eq!(store.watermark(), 12345);
    store.save(12346).unwrap();
    assert_eq!(
        fs::read_to_string(layout.checkpoint_path()).unwrap(),
        "12346"
    );
}

#[test]
fn corrupt_checkpoint_is_reported() {
    let tmp = tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    fs::write(layout.checkpoint_path(), "not-a-number").unwrap();
    let err = CheckpointStore::open(&layout).expect_err("corrupt contents rejected");
    match err {
        StorageError::CorruptCheckpoint { contents, .. } => assert_eq!(contents, "not-a-number"),
        other => panic!("expected corrupt checkpoint, got {other:?}"),
    }
}

#[test]
fn failed_save_still_advances_in_memory_watermark() {
    let tmp = tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path());
    let mut store = CheckpointStore::open(&layout).unwrap();
    store.save(5).unwrap();
    // A directory in place of the checkpoint file makes the rename fail.
    fs::remove_file(layout.checkpoint_path()).unwrap();
    fs::create_dir(layout.checkpoint_path()).unwrap();

    let err = store.save(6).expect_err("rename onto a directory fails");
    assert!(matches!(err, StorageError::Io { op: "rename", .. }));
    assert_eq!(store.watermark(), 6);
}
