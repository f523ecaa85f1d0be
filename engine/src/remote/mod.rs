//! Remote store - the backend copy of each user's budget.
//!
//! The engine only needs three calls: look a user's record up, insert a new
//! one, or overwrite an existing one by id. Transport, query language and
//! timeouts belong to the implementation.

mod http;
mod memory;

pub use http::HttpRemote;
pub use memory::{MemoryRemote, RemoteCall};

use crate::{error::RemoteError, BudgetPayload, RemoteBudget};
use async_trait::async_trait;

/// Backend holding at most one budget record per user.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The user's record, if one exists.
    async fn find_by_user(&self, user_id: &str) -> Result<Option<RemoteBudget>, RemoteError>;

    /// Create the user's record.
    async fn insert(&self, payload: &BudgetPayload) -> Result<RemoteBudget, RemoteError>;

    /// Overwrite the record with identifier `id`.
    async fn update(&self, id: &str, payload: &BudgetPayload) -> Result<RemoteBudget, RemoteError>;
}
