//! Durable snapshot storage.
//!
//! ```text
//! <data_dir>/
//!   .lock            exclusive flock held by the open store
//!   schedule.kb      header + one CRC32-checked JSON frame
//!   schedule.kb.tmp  in-flight write, renamed over schedule.kb
//! ```

mod codec;
mod file_lock;
mod snapshot;

pub use file_lock::FileLock;
pub use snapshot::{FileSnapshotStore, SNAPSHOT_FILE};

use std::path::Path;

use crate::config::StorageSettings;
use crate::error::{ExecutionError, TheatreError, TheatreResult};

/// Configuration for persistent storage.
#[derive(Debug, Clone)]
pub struct PersistentConfig {
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
        }
    }
}

impl From<&StorageSettings> for PersistentConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self {
            sync_on_write: settings.fsync,
        }
    }
}

/// Opens or creates a file snapshot store at `path`.
///
/// # Errors
///
/// Fails if the directory cannot be created or is locked by another process.
pub fn open_store(
    path: impl AsRef<Path>,
    config: Option<PersistentConfig>,
) -> TheatreResult<FileSnapshotStore> {
    FileSnapshotStore::open(path, config.unwrap_or_default()).map_err(|e| {
        TheatreError::Execution(ExecutionError::Storage {
            message: e.to_string(),
        })
    })
}
