//! Sync engine - the session's owner of the budget record.
//!
//! The engine holds the authoritative in-memory [`LocalBudgetRecord`] and
//! mediates between the [`LocalStore`] and the [`RemoteStore`]:
//!
//! - edits land in memory immediately, are marked dirty and are persisted
//!   locally in the background;
//! - [`SyncEngine::sync`] pushes the current amounts to the remote store,
//!   client always wins;
//! - a connectivity transition to online makes a dirty record sync-pending.
//!
//! The record lives in a `watch` channel and is replaced wholesale by every
//! operation; each modification is one critical section with no suspension.

use crate::auth::AuthProvider;
use crate::clock::{Clock, SystemClock};
use crate::connectivity::{ConnectivityEvent, ConnectivityMonitor, Subscription};
use crate::error::{Error, Result, StorageError};
use crate::remote::RemoteStore;
use crate::store::LocalStore;
use crate::summary::BudgetSummary;
use crate::{BudgetField, BudgetPayload, LocalBudgetRecord, RemoteBudget, SyncStatus, Timestamp};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Why a sync returned without contacting the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nobody is signed in.
    SignedOut,
    /// Connectivity is down.
    Offline,
    /// Another sync is still running.
    InFlight,
    /// The budget was reset while the remote write was in flight; its
    /// result was discarded.
    Reset,
}

/// Result of a [`SyncEngine::sync`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The remote write succeeded; carries the record after the merge.
    Synced(LocalBudgetRecord),
    Skipped(SkipReason),
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }
}

/// Clears the in-flight flag when the sync that set it ends, however it ends.
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct Inner {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    connectivity: ConnectivityMonitor,
    clock: Arc<dyn Clock>,
    record: watch::Sender<LocalBudgetRecord>,
    last_saved: Mutex<Option<Timestamp>>,
    syncing: AtomicBool,
    /// Bumped by `reset`; work started under an older generation is dropped.
    generation: AtomicU64,
    /// Serializes local writes; each write stores the latest record.
    persist_gate: tokio::sync::Mutex<()>,
}

impl Inner {
    fn snapshot(&self) -> LocalBudgetRecord {
        self.record.borrow().clone()
    }

    fn adopt(&self, record: LocalBudgetRecord) {
        self.record.send_replace(record);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Write the latest record, unless a reset happened since `generation`.
    async fn persist(&self, generation: u64) -> std::result::Result<(), StorageError> {
        let _gate = self.persist_gate.lock().await;
        if self.generation() != generation {
            tracing::debug!("budget was reset; skipping stale write");
            return Ok(());
        }
        let record = self.snapshot();
        self.local.put(&record).await
    }

    fn on_connectivity(&self, event: ConnectivityEvent) {
        if event != ConnectivityEvent::BecameOnline {
            return;
        }
        if self.record.send_if_modified(LocalBudgetRecord::mark_reachable) {
            tracing::debug!("connectivity restored; dirty budget is now sync-pending");
        }
    }
}

/// Builder for [`SyncEngine`].
pub struct SyncEngineBuilder {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    connectivity: ConnectivityMonitor,
    clock: Arc<dyn Clock>,
}

impl SyncEngineBuilder {
    /// Use `clock` for `lastSaved` and `lastSyncedAt`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> SyncEngine {
        let (record, _) = watch::channel(LocalBudgetRecord::initial());
        let inner = Arc::new(Inner {
            local: self.local,
            remote: self.remote,
            auth: self.auth,
            connectivity: self.connectivity.clone(),
            clock: self.clock,
            record,
            last_saved: Mutex::new(None),
            syncing: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            persist_gate: tokio::sync::Mutex::new(()),
        });

        let weak = Arc::downgrade(&inner);
        let subscription = self.connectivity.on_change(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_connectivity(event);
            }
        });

        SyncEngine {
            inner,
            _connectivity: subscription,
        }
    }
}

/// Owns the budget record for one session.
pub struct SyncEngine {
    inner: Arc<Inner>,
    _connectivity: Subscription,
}

impl SyncEngine {
    /// Start building an engine over the given collaborators.
    pub fn builder(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
        connectivity: ConnectivityMonitor,
    ) -> SyncEngineBuilder {
        SyncEngineBuilder {
            local,
            remote,
            auth,
            connectivity,
            clock: Arc::new(SystemClock),
        }
    }

    /// Establish the in-memory record for a new session.
    ///
    /// A locally stored record always wins, since it may hold unsynced edits.
    /// Otherwise the user's remote record is adopted as synced, or a zero
    /// record is created. Failures are logged and fall back to whatever the
    /// local store holds; this never fails.
    ///
    /// A local store that cannot be read is left alone: the remote is not
    /// consulted and nothing is written, so an unreadable record is never
    /// replaced by one fetched from elsewhere.
    pub async fn load(&self) -> LocalBudgetRecord {
        let inner = &self.inner;

        if let Err(err) = inner.local.open().await {
            tracing::warn!(error = %err, "local store unavailable; budget will not survive restart");
        }

        match inner.local.get().await {
            Ok(Some(record)) => {
                tracing::info!(
                    status = %record.sync_status,
                    dirty = record.is_dirty,
                    "loaded budget from local store"
                );
                inner.adopt(record.clone());
                return record;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "failed to read local budget; keeping it untouched for this session"
                );
                return inner.snapshot();
            }
        }

        match self.load_remote().await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load budget from remote; using local state");
                match inner.local.get().await {
                    Ok(Some(record)) => {
                        inner.adopt(record.clone());
                        record
                    }
                    Ok(None) => inner.snapshot(),
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to re-read local budget");
                        inner.snapshot()
                    }
                }
            }
        }
    }

    async fn load_remote(&self) -> Result<LocalBudgetRecord> {
        let inner = &self.inner;
        let generation = inner.generation();
        let user = inner.auth.current_user().ok_or(Error::NotAuthenticated)?;

        let record = match inner.remote.find_by_user(&user.id).await? {
            Some(remote) => {
                tracing::info!(user_id = %user.id, remote_id = %remote.id, "adopted remote budget");
                LocalBudgetRecord::from_remote(remote)
            }
            None => {
                tracing::info!(user_id = %user.id, "no budget anywhere; starting from zero");
                LocalBudgetRecord::initial()
            }
        };

        inner.adopt(record.clone());
        if let Err(err) = inner.persist(generation).await {
            tracing::warn!(error = %err, "failed to persist loaded budget");
        }
        Ok(record)
    }

    /// Replace one amount.
    ///
    /// The edit is visible through [`record`](Self::record) as soon as this
    /// returns. Persistence runs as a spawned task whose handle is returned;
    /// awaiting it is optional and a failed write is only logged. Must be
    /// called from within a Tokio runtime.
    pub fn update_field(&self, field: BudgetField, value: f64) -> Result<JoinHandle<()>> {
        if !value.is_finite() {
            return Err(Error::InvalidAmount { field, value });
        }

        let inner = &self.inner;
        let online = inner.connectivity.is_online();
        let generation = inner.generation();
        inner
            .record
            .send_modify(|record| record.apply_edit(field, value, online));
        *inner.last_saved.lock() = Some(inner.clock.now());
        tracing::debug!(%field, value, online, "budget field updated");

        let inner = self.inner.clone();
        Ok(tokio::spawn(async move {
            if let Err(err) = inner.persist(generation).await {
                tracing::warn!(%field, error = %err, "failed to persist budget edit");
            }
        }))
    }

    /// Push the current amounts to the remote store.
    ///
    /// Returns [`SyncOutcome::Skipped`] without any remote call when signed
    /// out, offline or already syncing. Remote failures leave the record
    /// untouched and are returned. If [`reset`](Self::reset) ran while the
    /// remote write was in flight, the result is discarded and
    /// [`SkipReason::Reset`] is returned.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let inner = &self.inner;

        let Some(user) = inner.auth.current_user() else {
            return Ok(SyncOutcome::Skipped(SkipReason::SignedOut));
        };
        if !inner.connectivity.is_online() {
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }
        let Some(_guard) = SyncGuard::acquire(&inner.syncing) else {
            tracing::debug!("sync already in flight");
            return Ok(SyncOutcome::Skipped(SkipReason::InFlight));
        };
        let generation = inner.generation();

        let (saved, sent) = match self.push(&user.id).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "sync failed");
                return Err(err);
            }
        };

        let now = inner.clock.now();
        // Checked inside the record's lock, which `reset` also bumps under.
        let merged = inner.record.send_if_modified(|record| {
            if inner.generation() != generation {
                return false;
            }
            record.apply_sync(&saved, &sent, now);
            true
        });
        if !merged {
            tracing::info!(user_id = %user.id, "budget reset during sync; discarding result");
            return Ok(SyncOutcome::Skipped(SkipReason::Reset));
        }
        if let Err(err) = inner.persist(generation).await {
            tracing::warn!(error = %err, "failed to persist synced budget");
        }

        let record = inner.snapshot();
        tracing::info!(
            user_id = %user.id,
            remote_id = %saved.id,
            status = %record.sync_status,
            "budget synced"
        );
        Ok(SyncOutcome::Synced(record))
    }

    /// Insert-or-update the remote copy. Returns the stored row and what was sent.
    async fn push(&self, user_id: &str) -> Result<(RemoteBudget, BudgetPayload)> {
        let inner = &self.inner;
        let existing = inner.remote.find_by_user(user_id).await?;

        // Amounts are captured here, after the lookup, not at call start.
        let payload = inner.record.borrow().budget.payload(user_id);

        let saved = match existing {
            Some(remote) => inner.remote.update(&remote.id, &payload).await?,
            None => inner.remote.insert(&payload).await?,
        };
        Ok((saved, payload))
    }

    /// Forget the budget: clear the local store and start from zero.
    ///
    /// Pending writes from earlier edits are dropped, and a sync still in
    /// flight returns [`SkipReason::Reset`] without touching the new record.
    pub async fn reset(&self) -> Result<()> {
        let inner = &self.inner;
        {
            let _gate = inner.persist_gate.lock().await;
            inner.local.clear().await?;
            inner.record.send_modify(|record| {
                *record = LocalBudgetRecord::initial();
                inner.generation.fetch_add(1, Ordering::AcqRel);
            });
        }
        *inner.last_saved.lock() = None;
        tracing::info!("budget reset");
        Ok(())
    }

    /// The current in-memory record.
    pub fn record(&self) -> LocalBudgetRecord {
        self.inner.snapshot()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.inner.record.borrow().sync_status
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.record.borrow().is_dirty
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::Acquire)
    }

    /// When the last edit reached the in-memory record.
    pub fn last_saved(&self) -> Option<Timestamp> {
        *self.inner.last_saved.lock()
    }

    /// Observe every replacement of the record.
    pub fn subscribe(&self) -> watch::Receiver<LocalBudgetRecord> {
        self.inner.record.subscribe()
    }

    /// Figures derived from the current amounts.
    pub fn summary(&self) -> BudgetSummary {
        BudgetSummary::from_record(&self.inner.record.borrow().budget)
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("record", &*self.inner.record.borrow())
            .field("syncing", &self.is_syncing())
            .finish()
    }
}
