//! Edge case tests for budgetbox-engine
//!
//! These tests cover boundary conditions, unusual inputs and damaged storage.

use budgetbox_engine::{
    BudgetField, ConnectivityMonitor, FileStore, LocalBudgetRecord, LocalSnapshot, LocalStore,
    MemoryRemote, MemoryStore, RemoteBudget, RemoteCall, StaticAuth, SyncEngine, SyncStatus, User,
};
use std::sync::Arc;
use tempfile::TempDir;

fn signed_in(id: &str) -> StaticAuth {
    StaticAuth::signed_in(User::new(id, "someone@example.com"))
}

fn engine_over(
    local: Arc<dyn LocalStore>,
    remote: &MemoryRemote,
    auth: &StaticAuth,
    online: bool,
) -> SyncEngine {
    SyncEngine::builder(
        local,
        Arc::new(remote.clone()),
        Arc::new(auth.clone()),
        ConnectivityMonitor::new(online),
    )
    .build()
}

// ============================================================================
// File Store Restarts
// ============================================================================

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let remote = MemoryRemote::new();
    let auth = signed_in("user-1");

    let engine = engine_over(Arc::new(FileStore::new(dir.path())), &remote, &auth, false);
    engine.load().await;
    engine.update_field(BudgetField::Income, 4200.0).unwrap();
    engine
        .update_field(BudgetField::Subscriptions, 19.99)
        .unwrap()
        .await
        .unwrap();
    drop(engine);

    let restarted = engine_over(Arc::new(FileStore::new(dir.path())), &remote, &auth, false);
    let loaded = restarted.load().await;

    assert_eq!(loaded.budget.income, 4200.0);
    assert_eq!(loaded.budget.subscriptions, 19.99);
    assert_eq!(loaded.sync_status, SyncStatus::LocalOnly);
    assert!(loaded.is_dirty);
}

#[tokio::test]
async fn data_dir_is_created_on_first_load() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("deeply").join("nested").join("budgetbox");
    let store = FileStore::new(&nested);
    let path = store.snapshot_path();

    let engine = engine_over(Arc::new(store), &MemoryRemote::new(), &signed_in("u"), true);
    engine.load().await;

    assert!(nested.is_dir());
    assert!(path.is_file());
}

#[tokio::test]
async fn remote_id_survives_restart() {
    let dir = TempDir::new().unwrap();
    let remote = MemoryRemote::new();
    let auth = signed_in("user-1");

    let engine = engine_over(Arc::new(FileStore::new(dir.path())), &remote, &auth, true);
    engine.load().await;
    engine.update_field(BudgetField::Food, 30.0).unwrap();
    engine.sync().await.unwrap();
    let remote_id = engine.record().budget.remote_id;
    assert!(remote_id.is_some());
    drop(engine);

    let restarted = engine_over(Arc::new(FileStore::new(dir.path())), &remote, &auth, true);
    let loaded = restarted.load().await;
    assert_eq!(loaded.budget.remote_id, remote_id);

    restarted.update_field(BudgetField::Food, 31.0).unwrap();
    restarted.sync().await.unwrap();
    assert_eq!(remote.write_count(), 2);
    assert!(matches!(
        remote.calls().last(),
        Some(RemoteCall::Update(id, _)) if Some(id) == remote_id.as_ref()
    ));
}

// ============================================================================
// Damaged Storage
// ============================================================================

fn seed_remote(remote: &MemoryRemote, user_id: &str, income: f64) {
    let mut elsewhere = LocalBudgetRecord::initial();
    elsewhere.budget.income = income;
    remote.seed(RemoteBudget::from_payload(
        "remote-9",
        &elsewhere.budget.payload(user_id),
        None,
        Some(2),
    ));
}

#[tokio::test]
async fn corrupt_snapshot_is_left_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let path = store.snapshot_path();
    std::fs::write(&path, "{ not json").unwrap();

    let remote = MemoryRemote::new();
    seed_remote(&remote, "user-1", 777.0);

    let engine = engine_over(Arc::new(store), &remote, &signed_in("user-1"), true);
    let loaded = engine.load().await;

    assert_eq!(loaded, LocalBudgetRecord::initial());
    assert!(remote.calls().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[tokio::test]
async fn snapshot_from_newer_build_is_not_trusted() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let path = store.snapshot_path();
    let mut record = LocalBudgetRecord::initial();
    record.apply_edit(BudgetField::Bills, 1234.0, true);
    let mut snapshot = serde_json::to_value(LocalSnapshot::new(record, chrono::Utc::now())).unwrap();
    snapshot["formatVersion"] = 99.into();
    let bytes = snapshot.to_string();
    std::fs::write(&path, &bytes).unwrap();

    let remote = MemoryRemote::new();
    let engine = engine_over(Arc::new(store), &remote, &signed_in("u"), true);
    let loaded = engine.load().await;

    assert_eq!(loaded, LocalBudgetRecord::initial());
    assert!(remote.calls().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), bytes);
}

#[tokio::test]
async fn unreadable_snapshot_keeps_unsynced_edits_over_remote_row() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let path = store.snapshot_path();
    let mut record = LocalBudgetRecord::initial();
    record.apply_edit(BudgetField::Bills, 1234.0, true);
    let mut snapshot = serde_json::to_value(LocalSnapshot::new(record, chrono::Utc::now())).unwrap();
    snapshot["formatVersion"] = 99.into();
    let bytes = snapshot.to_string();
    std::fs::write(&path, &bytes).unwrap();

    // Another device already synced a different budget for this user.
    let remote = MemoryRemote::new();
    seed_remote(&remote, "user-1", 777.0);

    let engine = engine_over(Arc::new(store), &remote, &signed_in("user-1"), true);
    engine.load().await;
    drop(engine);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), bytes);
    let on_disk: serde_json::Value = serde_json::from_str(&bytes).unwrap();
    assert_eq!(on_disk["record"]["bills"], 1234.0);
    assert_eq!(on_disk["record"]["isDirty"], true);
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn unavailable_storage_still_edits_in_memory() {
    let local = MemoryStore::new();
    local.set_unavailable(true);
    let engine = engine_over(
        Arc::new(local.clone()),
        &MemoryRemote::new(),
        &signed_in("u"),
        true,
    );

    let loaded = engine.load().await;
    assert_eq!(loaded, LocalBudgetRecord::initial());

    engine
        .update_field(BudgetField::Transport, 45.0)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(engine.record().budget.transport, 45.0);
    assert!(engine.is_dirty());
    assert_eq!(local.stored(), None);

    assert!(engine.sync().await.unwrap().is_synced());
    assert!(!engine.is_dirty());
}

#[tokio::test]
async fn stale_temp_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("current.json.tmp"), "half a wri").unwrap();
    let store = FileStore::new(dir.path());

    store.open().await.unwrap();
    assert_eq!(store.get().await.unwrap(), None);
    assert!(!dir.path().join("current.json.tmp").exists());
}

// ============================================================================
// Amount Boundaries
// ============================================================================

#[tokio::test]
async fn amounts_survive_disk_exactly() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let values = [
        (BudgetField::Income, 1e15),
        (BudgetField::Bills, 0.01),
        (BudgetField::Food, -250.75),
        (BudgetField::Transport, 19.99),
        (BudgetField::Subscriptions, 123456.78),
        (BudgetField::Miscellaneous, 9_007_199_254_740_992.0),
    ];

    let mut record = LocalBudgetRecord::initial();
    for (field, value) in values {
        record.apply_edit(field, value, false);
    }
    store.put(&record).await.unwrap();

    let restored = store.get().await.unwrap().unwrap();
    for (field, value) in values {
        assert_eq!(restored.get(field), value, "lost precision in {}", field);
    }
}

#[tokio::test]
async fn non_finite_amounts_never_reach_storage() {
    let local = MemoryStore::new();
    let engine = engine_over(
        Arc::new(local.clone()),
        &MemoryRemote::new(),
        &signed_in("u"),
        true,
    );

    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(engine.update_field(BudgetField::Income, value).is_err());
    }
    assert_eq!(local.write_count(), 0);
    assert!(!engine.is_dirty());
}

#[tokio::test]
async fn zero_edit_still_marks_dirty() {
    let engine = engine_over(
        Arc::new(MemoryStore::new()),
        &MemoryRemote::new(),
        &signed_in("u"),
        true,
    );
    engine.update_field(BudgetField::Food, 0.0).unwrap();
    assert!(engine.is_dirty());
    assert_eq!(engine.sync_status(), SyncStatus::SyncPending);
}

// ============================================================================
// Identity Edge Cases
// ============================================================================

#[tokio::test]
async fn unicode_user_ids() {
    let ids = ["ユーザー-1", "пользователь", "user with spaces", "🎉", "a/b?c=d&e"];

    for id in ids {
        let remote = MemoryRemote::new();
        let engine = engine_over(Arc::new(MemoryStore::new()), &remote, &signed_in(id), true);
        engine.update_field(BudgetField::Bills, 5.0).unwrap();

        assert!(engine.sync().await.unwrap().is_synced(), "failed for {}", id);
        assert_eq!(remote.row(id).unwrap().bills, 5.0);
        assert_eq!(engine.record().budget.user_id.as_deref(), Some(id));
    }
}

#[tokio::test]
async fn signing_in_later_syncs_offline_edits() {
    let auth = StaticAuth::signed_out();
    let remote = MemoryRemote::new();
    let engine = engine_over(Arc::new(MemoryStore::new()), &remote, &auth, true);

    engine.load().await;
    engine.update_field(BudgetField::Income, 100.0).unwrap();
    assert!(!engine.sync().await.unwrap().is_synced());
    assert!(remote.calls().is_empty());

    auth.sign_in(User::new("late", "late@example.com"));
    assert!(engine.sync().await.unwrap().is_synced());
    assert_eq!(remote.row("late").unwrap().income, 100.0);
}

// ============================================================================
// Volume
// ============================================================================

#[tokio::test]
async fn rapid_edits_persist_the_last_value() {
    let local = MemoryStore::new();
    let engine = engine_over(
        Arc::new(local.clone()),
        &MemoryRemote::new(),
        &signed_in("u"),
        false,
    );

    let handles: Vec<_> = (0..500)
        .map(|i| engine.update_field(BudgetField::Miscellaneous, i as f64).unwrap())
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(engine.record().budget.miscellaneous, 499.0);
    assert_eq!(local.stored().unwrap().budget.miscellaneous, 499.0);
    assert_eq!(local.write_count(), 500);
}

#[tokio::test]
async fn reset_removes_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let store = FileStore::new(dir.path());
    let path = store.snapshot_path();
    let engine = engine_over(Arc::new(store), &MemoryRemote::new(), &signed_in("u"), false);

    engine
        .update_field(BudgetField::Income, 1.0)
        .unwrap()
        .await
        .unwrap();
    assert!(path.exists());

    engine.reset().await.unwrap();
    assert!(!path.exists());
    assert_eq!(engine.record(), LocalBudgetRecord::initial());

    // Clearing twice is harmless.
    engine.reset().await.unwrap();
}
