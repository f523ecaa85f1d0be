//! The budget record and its client-side sync state.

use crate::{RemoteId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed local key of the one budget record per installation.
pub const CURRENT_KEY: &str = "current";

/// An editable amount on the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetField {
    Income,
    Bills,
    Food,
    Transport,
    Subscriptions,
    Miscellaneous,
}

impl BudgetField {
    /// Every field, income first.
    pub const ALL: [BudgetField; 6] = [
        BudgetField::Income,
        BudgetField::Bills,
        BudgetField::Food,
        BudgetField::Transport,
        BudgetField::Subscriptions,
        BudgetField::Miscellaneous,
    ];

    /// The five expense categories.
    pub const EXPENSES: [BudgetField; 5] = [
        BudgetField::Bills,
        BudgetField::Food,
        BudgetField::Transport,
        BudgetField::Subscriptions,
        BudgetField::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetField::Income => "income",
            BudgetField::Bills => "bills",
            BudgetField::Food => "food",
            BudgetField::Transport => "transport",
            BudgetField::Subscriptions => "subscriptions",
            BudgetField::Miscellaneous => "miscellaneous",
        }
    }

    pub fn is_expense(&self) -> bool {
        !matches!(self, BudgetField::Income)
    }
}

impl fmt::Display for BudgetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown budget field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for BudgetField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BudgetField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Where the record stands relative to the remote copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatus {
    /// Dirty while believed unreachable (or never synced).
    #[default]
    LocalOnly,
    /// Dirty while believed reachable; eligible for a sync attempt.
    SyncPending,
    /// Confirmed written to the remote.
    Synced,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncStatus::LocalOnly => "local-only",
            SyncStatus::SyncPending => "sync-pending",
            SyncStatus::Synced => "synced",
        })
    }
}

/// The budget amounts plus the server-assigned metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecord {
    /// Identifier assigned by the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    /// Owner, once associated with an authenticated user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub income: f64,
    pub bills: f64,
    pub food: f64,
    pub transport: f64,
    pub subscriptions: f64,
    pub miscellaneous: f64,
    /// Last server-side modification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Carried for the backend; reconciliation never reads it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl BudgetRecord {
    /// Read one amount.
    pub fn get(&self, field: BudgetField) -> f64 {
        match field {
            BudgetField::Income => self.income,
            BudgetField::Bills => self.bills,
            BudgetField::Food => self.food,
            BudgetField::Transport => self.transport,
            BudgetField::Subscriptions => self.subscriptions,
            BudgetField::Miscellaneous => self.miscellaneous,
        }
    }

    /// Replace one amount.
    pub fn set(&mut self, field: BudgetField, value: f64) {
        let slot = match field {
            BudgetField::Income => &mut self.income,
            BudgetField::Bills => &mut self.bills,
            BudgetField::Food => &mut self.food,
            BudgetField::Transport => &mut self.transport,
            BudgetField::Subscriptions => &mut self.subscriptions,
            BudgetField::Miscellaneous => &mut self.miscellaneous,
        };
        *slot = value;
    }

    /// The outgoing payload for `user_id`: amounts only.
    pub fn payload(&self, user_id: &str) -> BudgetPayload {
        BudgetPayload {
            user_id: user_id.to_string(),
            income: self.income,
            bills: self.bills,
            food: self.food,
            transport: self.transport,
            subscriptions: self.subscriptions,
            miscellaneous: self.miscellaneous,
        }
    }

    /// Whether the amounts equal those of `payload`.
    pub fn matches(&self, payload: &BudgetPayload) -> bool {
        BudgetField::ALL
            .into_iter()
            .all(|field| self.get(field) == payload.get(field))
    }
}

/// What the client sends to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPayload {
    pub user_id: UserId,
    pub income: f64,
    pub bills: f64,
    pub food: f64,
    pub transport: f64,
    pub subscriptions: f64,
    pub miscellaneous: f64,
}

impl BudgetPayload {
    pub fn get(&self, field: BudgetField) -> f64 {
        match field {
            BudgetField::Income => self.income,
            BudgetField::Bills => self.bills,
            BudgetField::Food => self.food,
            BudgetField::Transport => self.transport,
            BudgetField::Subscriptions => self.subscriptions,
            BudgetField::Miscellaneous => self.miscellaneous,
        }
    }

    /// The first amount that is NaN or infinite, if any.
    pub fn non_finite_field(&self) -> Option<BudgetField> {
        BudgetField::ALL
            .into_iter()
            .find(|field| !self.get(*field).is_finite())
    }
}

/// A budget row as held by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBudget {
    pub id: RemoteId,
    pub user_id: UserId,
    pub income: f64,
    pub bills: f64,
    pub food: f64,
    pub transport: f64,
    pub subscriptions: f64,
    pub miscellaneous: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl RemoteBudget {
    /// Build a stored row from a payload and server-assigned metadata.
    pub fn from_payload(
        id: impl Into<RemoteId>,
        payload: &BudgetPayload,
        updated_at: Option<Timestamp>,
        version: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: payload.user_id.clone(),
            income: payload.income,
            bills: payload.bills,
            food: payload.food,
            transport: payload.transport,
            subscriptions: payload.subscriptions,
            miscellaneous: payload.miscellaneous,
            updated_at,
            version,
        }
    }

    pub fn get(&self, field: BudgetField) -> f64 {
        match field {
            BudgetField::Income => self.income,
            BudgetField::Bills => self.bills,
            BudgetField::Food => self.food,
            BudgetField::Transport => self.transport,
            BudgetField::Subscriptions => self.subscriptions,
            BudgetField::Miscellaneous => self.miscellaneous,
        }
    }
}

impl From<RemoteBudget> for BudgetRecord {
    fn from(remote: RemoteBudget) -> Self {
        Self {
            remote_id: Some(remote.id),
            user_id: Some(remote.user_id),
            income: remote.income,
            bills: remote.bills,
            food: remote.food,
            transport: remote.transport,
            subscriptions: remote.subscriptions,
            miscellaneous: remote.miscellaneous,
            updated_at: remote.updated_at,
            version: remote.version,
        }
    }
}

/// The budget record as the client holds it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBudgetRecord {
    #[serde(flatten)]
    pub budget: BudgetRecord,
    pub sync_status: SyncStatus,
    /// Local edits not yet confirmed written to the remote store
    pub is_dirty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<Timestamp>,
}

impl LocalBudgetRecord {
    /// The zero-valued record adopted when nothing exists yet.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Adopt a remote row as a clean, synced record.
    pub fn from_remote(remote: RemoteBudget) -> Self {
        Self {
            budget: remote.into(),
            sync_status: SyncStatus::Synced,
            is_dirty: false,
            last_synced_at: None,
        }
    }

    pub fn get(&self, field: BudgetField) -> f64 {
        self.budget.get(field)
    }

    /// Apply a local edit: replace the field and mark the record dirty.
    pub fn apply_edit(&mut self, field: BudgetField, value: f64, online: bool) {
        self.budget.set(field, value);
        self.is_dirty = true;
        self.sync_status = if online {
            SyncStatus::SyncPending
        } else {
            SyncStatus::LocalOnly
        };
    }

    /// Connectivity came back: a dirty record becomes eligible for sync.
    ///
    /// Returns whether the status changed.
    pub fn mark_reachable(&mut self) -> bool {
        if self.is_dirty && self.sync_status != SyncStatus::SyncPending {
            self.sync_status = SyncStatus::SyncPending;
            true
        } else {
            false
        }
    }

    /// Fold a successful remote write into the record.
    ///
    /// Only server-assigned metadata is taken from `remote`; the amounts stay
    /// the client's. The record is clean only if its amounts still equal the
    /// `sent` payload.
    pub fn apply_sync(&mut self, remote: &RemoteBudget, sent: &BudgetPayload, now: Timestamp) {
        self.budget.remote_id = Some(remote.id.clone());
        self.budget.user_id = Some(remote.user_id.clone());
        self.budget.updated_at = remote.updated_at;
        self.budget.version = remote.version;
        self.last_synced_at = Some(now);

        if self.budget.matches(sent) {
            self.is_dirty = false;
            self.sync_status = SyncStatus::Synced;
        } else {
            self.is_dirty = true;
            self.sync_status = SyncStatus::SyncPending;
        }
    }
}
