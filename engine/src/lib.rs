//! # BudgetBox Engine
//!
//! A local-first sync engine for a single budget record.
//!
//! The record is edited in memory, persisted to an on-device store with every
//! edit, and reconciled with a remote backend when the user asks and the
//! network allows.
//!
//! ## Design Principles
//!
//! - **Local first**: edits never wait for the network; the in-memory record
//!   is the source of truth for the session
//! - **Injected collaborators**: the local store, remote store, auth provider,
//!   connectivity monitor and clock are passed in, never global
//! - **Client wins**: a sync overwrites the remote amounts unconditionally
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`LocalBudgetRecord`] is a [`BudgetRecord`] (income plus five expense
//! categories and server metadata) with client-only sync state:
//! - [`SyncStatus::LocalOnly`] - dirty while offline
//! - [`SyncStatus::SyncPending`] - dirty while online
//! - [`SyncStatus::Synced`] - confirmed on the remote
//!
//! ### Stores
//!
//! [`LocalStore`] persists the one record under the key `current`
//! ([`MemoryStore`], [`FileStore`]). [`RemoteStore`] holds one record per
//! user ([`MemoryRemote`], [`HttpRemote`]).
//!
//! ### Engine
//!
//! [`SyncEngine`] owns the record: [`SyncEngine::load`],
//! [`SyncEngine::update_field`], [`SyncEngine::sync`].
//!
//! ## Quick Start
//!
//! ```rust
//! use budgetbox_engine::{
//!     BudgetField, ConnectivityMonitor, MemoryRemote, MemoryStore, StaticAuth, SyncEngine,
//!     SyncStatus, User,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = SyncEngine::builder(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryRemote::new()),
//!     Arc::new(StaticAuth::signed_in(User::new("user-1", "me@example.com"))),
//!     ConnectivityMonitor::new(true),
//! )
//! .build();
//!
//! engine.load().await;
//! engine.update_field(BudgetField::Income, 50000.0).unwrap();
//! assert_eq!(engine.sync_status(), SyncStatus::SyncPending);
//!
//! let outcome = engine.sync().await.unwrap();
//! assert!(outcome.is_synced());
//! assert_eq!(engine.sync_status(), SyncStatus::Synced);
//! # }
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod record;
pub mod remote;
pub mod snapshot;
pub mod store;
pub mod summary;

// Re-export main types at crate root
pub use auth::{AuthProvider, StaticAuth, User};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor, Subscription};
pub use engine::{SkipReason, SyncEngine, SyncEngineBuilder, SyncOutcome};
pub use error::{Error, RemoteError, Result, StorageError};
pub use record::{
    BudgetField, BudgetPayload, BudgetRecord, LocalBudgetRecord, RemoteBudget, SyncStatus,
    UnknownField, CURRENT_KEY,
};
pub use remote::{HttpRemote, MemoryRemote, RemoteCall, RemoteStore};
pub use snapshot::{LocalSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use store::{FileStore, LocalStore, MemoryStore};
pub use summary::{BudgetSummary, BudgetWarning, CategoryShare};

/// Type aliases for clarity
pub type UserId = String;
pub type RemoteId = String;
pub type Timestamp = chrono::DateTime<chrono::Utc>;
