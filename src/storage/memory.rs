//! In-memory storage backend.
//!
//! Intended for embedded usage and tests. Save counts and an injectable
//! failure switch let callers observe how often the knowledge base persists.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::knowledge::KnowledgeSnapshot;
use crate::storage::traits::{SnapshotStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Snapshot store that keeps the last snapshot in memory.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    current: RwLock<Option<KnowledgeSnapshot>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: KnowledgeSnapshot) -> Self {
        Self {
            current: RwLock::new(Some(snapshot)),
            ..Self::default()
        }
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Makes every following save fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<KnowledgeSnapshot>, StorageError> {
        let current = self.current.read().map_err(|_| lock_err("snapshot.read"))?;
        Ok(current.clone())
    }

    fn save(&self, snapshot: &KnowledgeSnapshot) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("save rejected".to_string()));
        }
        let mut current = self.current.write().map_err(|_| lock_err("snapshot.write"))?;
        *current = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_loads_none() {
        let store = InMemorySnapshotStore::new();
        assert!(store.load().unwrap().is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let store = InMemorySnapshotStore::new();
        let snap = KnowledgeSnapshot::default();
        store.save(&snap).unwrap();
        assert_eq!(store.load().unwrap(), Some(snap));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_failed_save_keeps_previous() {
        let store = InMemorySnapshotStore::with_snapshot(KnowledgeSnapshot::default());
        store.set_fail_saves(true);
        let mut next = KnowledgeSnapshot::default();
        next.format_version = 7;
        assert!(store.save(&next).is_err());
        assert_eq!(store.load().unwrap().map(|s| s.format_version), Some(1));
        assert_eq!(store.save_count(), 0);
    }
}
