//! Abstract storage traits for theatrekb.
//!
//! A [`SnapshotStore`] persists whole-graph snapshots. The knowledge base
//! saves once per mutation batch and loads once at startup, so backends only
//! need atomic whole-value writes, not incremental updates.

use thiserror::Error;

use crate::knowledge::KnowledgeSnapshot;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Stored data failed an integrity check.
    #[error("Corrupted snapshot: {0}")]
    Corrupted(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage trait for graph snapshots.
///
/// Implementations must make `save` atomic: after a failed save, `load`
/// returns the previously saved snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot, if any.
    fn load(&self) -> Result<Option<KnowledgeSnapshot>, StorageError>;

    /// Replace the stored snapshot.
    fn save(&self, snapshot: &KnowledgeSnapshot) -> Result<(), StorageError>;
}
