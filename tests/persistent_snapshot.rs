//! File snapshot persistence tests.
//!
//! These tests verify that the file backend:
//! - Restores every entity and relation after reopening
//! - Rejects a damaged snapshot file instead of loading it
//! - Refuses a second concurrent opener

#![cfg(feature = "persistent")]

use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use theatrekb::sample::load_sample_hospital;
use theatrekb::storage::persistent::{open_store, FileSnapshotStore, PersistentConfig, SNAPSHOT_FILE};
use theatrekb::{detect, KnowledgeBase, SnapshotStore, StorageError, ValidationLimits};

fn open_kb(dir: &std::path::Path) -> KnowledgeBase {
    let store: Arc<dyn SnapshotStore> = Arc::new(open_store(dir, None).unwrap());
    KnowledgeBase::with_store(ValidationLimits::default(), store).unwrap()
}

#[test]
fn test_reopen_restores_schedule_and_conflicts() {
    let dir = tempdir().unwrap();
    let (snapshot, report) = {
        let kb = open_kb(dir.path());
        load_sample_hospital(&kb).unwrap();
        let report = detect(&kb.read());
        (kb.snapshot(), report)
    };

    let kb = open_kb(dir.path());
    assert_eq!(kb.snapshot(), snapshot);
    assert_eq!(detect(&kb.read()), report);

    let view = kb.read();
    let smith = view.surgeon("Dr_Smith").unwrap();
    assert_eq!(smith.performs_operation.first().map(|s| s.as_str()), Some("Brain_Surgery"));
    let slot = view.timeslot("TimeSlot_08_00").unwrap();
    assert_eq!(slot.temporal_overlaps.first().map(|s| s.as_str()), Some("TimeSlot_10_45"));
}

#[test]
fn test_deletion_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let kb = open_kb(dir.path());
        load_sample_hospital(&kb).unwrap();
        kb.delete_surgery("Cardiac_Bypass_Surgery").unwrap();
    }

    let kb = open_kb(dir.path());
    assert!(kb.read().surgery("Cardiac_Bypass_Surgery").is_none());
    assert!(kb.read().patient("Patient_Mary_Smith").is_none());
    assert!(detect(&kb.read()).is_clean());
}

#[test]
fn test_corrupted_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    {
        let kb = open_kb(dir.path());
        kb.add_theatre("Neuro_Theatre", None, None).unwrap();
    }

    let path = dir.path().join(SNAPSHOT_FILE);
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let store = FileSnapshotStore::open(dir.path(), PersistentConfig::default()).unwrap();
    assert!(matches!(store.load(), Err(StorageError::Corrupted(_))));
}

#[test]
fn test_truncated_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    {
        let kb = open_kb(dir.path());
        kb.add_theatre("Neuro_Theatre", None, None).unwrap();
    }

    let path = dir.path().join(SNAPSHOT_FILE);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let store: Arc<dyn SnapshotStore> = Arc::new(open_store(dir.path(), None).unwrap());
    let err = KnowledgeBase::with_store(ValidationLimits::default(), store).unwrap_err();
    assert!(err.is_storage());
}

#[test]
fn test_second_opener_is_refused() {
    let dir = tempdir().unwrap();
    let _first = open_store(dir.path(), None).unwrap();
    assert!(open_store(dir.path(), None).is_err());
}
