//! On-disk envelope for the persisted budget record.
//!
//! Snapshots are the bridge between the in-memory record and durable storage.
//! The format is versioned so that older builds refuse files written by newer
//! ones instead of silently dropping fields.

use crate::{error::StorageError, LocalBudgetRecord, Timestamp, CURRENT_KEY};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A persisted copy of the local record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// Logical key of the record (always `current`)
    pub key: String,
    /// When the snapshot was written
    pub saved_at: Timestamp,
    pub record: LocalBudgetRecord,
}

impl LocalSnapshot {
    pub fn new(record: LocalBudgetRecord, saved_at: Timestamp) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            key: CURRENT_KEY.to_string(),
            saved_at,
            record,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, StorageError> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON, rejecting unknown format versions and keys.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| StorageError::Corrupt(e.to_string()))?;

        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(StorageError::Corrupt(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        if snapshot.key != CURRENT_KEY {
            return Err(StorageError::Corrupt(format!(
                "unexpected record key: {}",
                snapshot.key
            )));
        }

        Ok(snapshot)
    }
}
