//! In-memory remote store for tests and offline demos.

use super::RemoteStore;
use crate::clock::{Clock, SystemClock};
use crate::{error::RemoteError, BudgetPayload, RemoteBudget, RemoteId, UserId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A call received by [`MemoryRemote`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    FindByUser(UserId),
    Insert(BudgetPayload),
    Update(RemoteId, BudgetPayload),
}

impl RemoteCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, RemoteCall::FindByUser(_))
    }
}

struct Shared {
    rows: Mutex<HashMap<UserId, RemoteBudget>>,
    calls: Mutex<Vec<RemoteCall>>,
    failure: Mutex<Option<RemoteError>>,
    latency: Mutex<Option<Duration>>,
    clock: Arc<dyn Clock>,
}

/// Remote store kept in process memory. Clones share state.
#[derive(Clone)]
pub struct MemoryRemote {
    shared: Arc<Shared>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamp `updatedAt` with `clock` instead of the system clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                rows: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                failure: Mutex::new(None),
                latency: Mutex::new(None),
                clock,
            }),
        }
    }

    /// Store `row` as if another device had synced it.
    pub fn seed(&self, row: RemoteBudget) {
        self.shared.rows.lock().insert(row.user_id.clone(), row);
    }

    /// The row stored for `user_id`.
    pub fn row(&self, user_id: &str) -> Option<RemoteBudget> {
        self.shared.rows.lock().get(user_id).cloned()
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.shared.calls.lock().clone()
    }

    /// Number of insert/update calls received.
    pub fn write_count(&self) -> usize {
        self.shared
            .calls
            .lock()
            .iter()
            .filter(|call| call.is_write())
            .count()
    }

    /// Fail every subsequent call with `error` (`None` to recover).
    pub fn fail_with(&self, error: Option<RemoteError>) {
        *self.shared.failure.lock() = error;
    }

    /// Delay every call, to hold a sync in flight.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.shared.latency.lock() = latency;
    }

    async fn begin(&self, call: RemoteCall) -> Result<(), RemoteError> {
        self.shared.calls.lock().push(call);
        let latency = *self.shared.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.shared.failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRemote")
            .field("rows", &self.shared.rows.lock().len())
            .field("calls", &self.shared.calls.lock().len())
            .finish()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn find_by_user(&self, user_id: &str) -> Result<Option<RemoteBudget>, RemoteError> {
        self.begin(RemoteCall::FindByUser(user_id.to_string()))
            .await?;
        Ok(self.row(user_id))
    }

    async fn insert(&self, payload: &BudgetPayload) -> Result<RemoteBudget, RemoteError> {
        self.begin(RemoteCall::Insert(payload.clone())).await?;

        let mut rows = self.shared.rows.lock();
        if rows.contains_key(&payload.user_id) {
            return Err(RemoteError::Rejected {
                status: 409,
                message: format!("budget already exists for user {}", payload.user_id),
            });
        }

        let row = RemoteBudget::from_payload(
            uuid::Uuid::new_v4().to_string(),
            payload,
            Some(self.shared.clock.now()),
            Some(1),
        );
        rows.insert(payload.user_id.clone(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, payload: &BudgetPayload) -> Result<RemoteBudget, RemoteError> {
        self.begin(RemoteCall::Update(id.to_string(), payload.clone()))
            .await?;

        let mut rows = self.shared.rows.lock();
        // A row is only visible to its owner.
        let existing = rows
            .get_mut(&payload.user_id)
            .filter(|row| row.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

        let version = existing.version.unwrap_or(0) + 1;
        *existing = RemoteBudget::from_payload(
            id,
            payload,
            Some(self.shared.clock.now()),
            Some(version),
        );
        Ok(existing.clone())
    }
}
