//! In-memory local store.
//!
//! Clones share state, which makes it possible to "restart" an engine in
//! tests by building a fresh one over a clone of the same store.

use super::LocalStore;
use crate::{error::StorageError, LocalBudgetRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    record: RwLock<Option<LocalBudgetRecord>>,
    opened: AtomicBool,
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

/// A local store kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `record`.
    pub fn with_record(record: LocalBudgetRecord) -> Self {
        let store = Self::new();
        *store.shared.record.write() = Some(record);
        store
    }

    /// Simulate the platform denying storage access.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every subsequent `put`/`clear` fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    /// Whether `open` has succeeded at least once.
    pub fn is_open(&self) -> bool {
        self.shared.opened.load(Ordering::SeqCst)
    }

    /// Peek at the stored record without going through the async API.
    pub fn stored(&self) -> Option<LocalBudgetRecord> {
        self.shared.record.read().clone()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.shared.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "storage access denied".to_string(),
            ));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        self.check_available()?;
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io("write failed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn open(&self) -> Result<(), StorageError> {
        self.check_available()?;
        self.shared.opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn put(&self, record: &LocalBudgetRecord) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.shared.record.write() = Some(record.clone());
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self) -> Result<Option<LocalBudgetRecord>, StorageError> {
        self.check_available()?;
        Ok(self.shared.record.read().clone())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.shared.record.write() = None;
        Ok(())
    }
}
