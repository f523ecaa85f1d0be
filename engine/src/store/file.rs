//! File-backed local store.
//!
//! The record is written as a [`LocalSnapshot`] JSON file inside a data
//! directory. Writes go to a temporary file that is fsynced and then renamed
//! over the target, so readers see either the old or the new record.

use super::LocalStore;
use crate::clock::{Clock, SystemClock};
use crate::{error::StorageError, LocalBudgetRecord, LocalSnapshot};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// File name of the persisted record.
pub const SNAPSHOT_FILE: &str = "current.json";

const SNAPSHOT_TEMP: &str = "current.json.tmp";

/// A local store persisting to a directory on disk.
pub struct FileStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    opened: AtomicBool,
    /// Serializes writers; readers rely on the atomic rename instead.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store rooted at `dir`. Nothing touches the disk until `open`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clock: Arc::new(SystemClock),
            opened: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    /// Use `clock` for the snapshot's `savedAt` stamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_TEMP)
    }

    async fn ensure_open(&self) -> Result<(), StorageError> {
        if self.opened.load(Ordering::Acquire) {
            return Ok(());
        }
        self.open().await
    }

    #[cfg(unix)]
    async fn sync_directory(&self) -> Result<(), StorageError> {
        let dir = tokio::fs::File::open(&self.dir).await?;
        dir.sync_all().await?;
        Ok(())
    }

    // NTFS journals metadata; there is no directory handle to fsync.
    #[cfg(not(unix))]
    async fn sync_directory(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("dir", &self.dir)
            .field("opened", &self.opened.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn open(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Unavailable(format!("{}: {}", self.dir.display(), e)))?;

        let _guard = self.write_lock.lock().await;

        // Leftover from a write interrupted before its rename.
        match tokio::fs::remove_file(self.temp_path()).await {
            Ok(()) => tracing::debug!(dir = %self.dir.display(), "removed stale snapshot temp file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.opened.store(true, Ordering::Release);
        Ok(())
    }

    async fn put(&self, record: &LocalBudgetRecord) -> Result<(), StorageError> {
        self.ensure_open().await?;
        let json = LocalSnapshot::new(record.clone(), self.clock.now()).to_json_pretty()?;

        let _guard = self.write_lock.lock().await;

        let temp_path = self.temp_path();
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, self.snapshot_path()).await?;
        self.sync_directory().await?;

        Ok(())
    }

    async fn get(&self) -> Result<Option<LocalBudgetRecord>, StorageError> {
        self.ensure_open().await?;

        let json = match tokio::fs::read_to_string(self.snapshot_path()).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot = LocalSnapshot::from_json(&json)?;
        Ok(Some(snapshot.record))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.ensure_open().await?;
        let _guard = self.write_lock.lock().await;

        match tokio::fs::remove_file(self.snapshot_path()).await {
            Ok(()) => self.sync_directory().await,
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
