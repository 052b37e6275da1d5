//! Snapshot persistence backends.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::InMemorySnapshotStore;
pub use traits::{SnapshotStore, StorageError};
