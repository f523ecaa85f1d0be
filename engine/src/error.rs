//! Error types for the BudgetBox engine.

use crate::BudgetField;
use thiserror::Error;

/// Failures of the on-device store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The platform denied access to local persistence.
    #[error("local storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O failed: {0}")]
    Io(String),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("could not serialize record: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => StorageError::Unavailable(err.to_string()),
            _ => StorageError::Io(err.to_string()),
        }
    }
}

/// Failures talking to the remote backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never got a response (offline, DNS, timeout).
    #[error("network error: {0}")]
    Network(String),

    #[error("backend rejected credentials")]
    Unauthorized,

    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("remote record not found: {0}")]
    NotFound(String),

    #[error("could not decode backend response: {0}")]
    Decode(String),
}

/// All errors surfaced by the sync engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(RemoteError),

    #[error("no authenticated user")]
    NotAuthenticated,

    #[error("invalid amount for {field}: {value}")]
    InvalidAmount { field: BudgetField, value: f64 },
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Unauthorized => Error::NotAuthenticated,
            other => Error::Remote(other),
        }
    }
}

impl Error {
    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::InvalidAmount { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
