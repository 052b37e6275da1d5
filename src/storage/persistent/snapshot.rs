//! File-backed snapshot store.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use super::codec;
use super::file_lock::FileLock;
use super::PersistentConfig;
use crate::knowledge::KnowledgeSnapshot;
use crate::storage::traits::{SnapshotStore, StorageError};

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE: &str = "schedule.kb";

const TEMP_FILE: &str = "schedule.kb.tmp";

/// Stores the latest snapshot in `<dir>/schedule.kb`.
///
/// Holds an exclusive lock on the directory for its whole lifetime. Every
/// save writes a temp file, fsyncs it (unless disabled) and renames it over
/// the previous snapshot, so readers only ever see a complete file.
#[derive(Debug)]
pub struct FileSnapshotStore {
    dir: PathBuf,
    config: PersistentConfig,
    write_guard: Mutex<()>,
    _lock: FileLock,
}

impl FileSnapshotStore {
    /// Opens or creates a store in `dir`.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created or another process holds it.
    pub fn open(dir: impl AsRef<Path>, config: PersistentConfig) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let lock = FileLock::acquire(&dir)?;

        let stale = dir.join(TEMP_FILE);
        if stale.exists() {
            debug!(path = %stale.display(), "removing stale temp snapshot");
            fs::remove_file(&stale)?;
        }

        info!(dir = %dir.display(), "opened snapshot store");
        Ok(Self {
            dir,
            config,
            write_guard: Mutex::new(()),
            _lock: lock,
        })
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    fn write_temp(&self, path: &Path, snapshot: &KnowledgeSnapshot) -> Result<(), StorageError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        codec::write_header(&mut writer)?;
        let frame = codec::encode(snapshot).map_err(|e| StorageError::SerializationError(e.to_string()))?;
        writer.write_all(&frame)?;
        writer.flush()?;
        if self.config.sync_on_write {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<KnowledgeSnapshot>, StorageError> {
        let path = self.snapshot_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);

        let corrupted = |e: std::io::Error| StorageError::Corrupted(format!("{}: {e}", path.display()));
        let version = codec::read_header(&mut reader).map_err(corrupted)?;
        if version != codec::CODEC_VERSION {
            return Err(StorageError::Corrupted(format!(
                "{}: unsupported file version {version}",
                path.display()
            )));
        }
        let snapshot: KnowledgeSnapshot = codec::decode(&mut reader).map_err(corrupted)?;
        debug!(entities = snapshot.len(), "loaded snapshot");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &KnowledgeSnapshot) -> Result<(), StorageError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| StorageError::BackendError("poisoned lock: snapshot.save".to_string()))?;

        let temp = self.dir.join(TEMP_FILE);
        if let Err(e) = self.write_temp(&temp, snapshot) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        fs::rename(&temp, self.snapshot_path())?;
        debug!(entities = snapshot.len(), "saved snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path(), PersistentConfig::default()).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path(), PersistentConfig::default()).unwrap();
        store.save(&KnowledgeSnapshot::default()).unwrap();
        assert!(store.snapshot_path().exists());
        assert!(!dir.path().join(TEMP_FILE).exists());
    }

    #[test]
    fn test_truncated_file_is_corrupted() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::open(dir.path(), PersistentConfig::default()).unwrap();
        store.save(&KnowledgeSnapshot::default()).unwrap();
        let bytes = fs::read(store.snapshot_path()).unwrap();
        fs::write(store.snapshot_path(), &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupted(_))));
    }
}
