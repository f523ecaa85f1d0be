//! Local store - durable persistence for the single budget record.
//!
//! The store holds at most one record under the fixed key
//! [`CURRENT_KEY`](crate::CURRENT_KEY). Writes overwrite the whole record
//! (last write wins, no merge) and are serialized per store; a reader never
//! observes a partially written record.

mod file;
mod memory;

pub use file::{FileStore, SNAPSHOT_FILE};
pub use memory::MemoryStore;

use crate::{error::StorageError, LocalBudgetRecord};
use async_trait::async_trait;

/// Durable single-record persistence.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Initialize the underlying storage. Idempotent.
    ///
    /// Fails with [`StorageError::Unavailable`] if the platform denies access.
    async fn open(&self) -> Result<(), StorageError>;

    /// Overwrite the stored record in full.
    async fn put(&self, record: &LocalBudgetRecord) -> Result<(), StorageError>;

    /// The stored record, or `None` if never written.
    async fn get(&self) -> Result<Option<LocalBudgetRecord>, StorageError>;

    /// Remove the stored record.
    async fn clear(&self) -> Result<(), StorageError>;
}
