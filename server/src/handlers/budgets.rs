//! Budget handlers - lookup, creation and unconditional overwrite.

use crate::db;
use crate::error::{AppError, Result};
use budgetbox_engine::{BudgetPayload, RemoteBudget};
use serde::Deserialize;
use sqlx::PgPool;

/// Query parameters for a budget lookup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetQuery {
    pub user_id: String,
}

/// Reject payloads the table cannot meaningfully hold.
pub fn validate_payload(payload: &BudgetPayload) -> Result<()> {
    if payload.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("userId must not be empty".to_string()));
    }
    if let Some(field) = payload.non_finite_field() {
        return Err(AppError::BadRequest(format!(
            "{} must be a finite number",
            field
        )));
    }
    Ok(())
}

/// Fetch the budget owned by `user_id`, if any.
pub async fn handle_find(pool: &PgPool, user_id: &str) -> Result<Option<RemoteBudget>> {
    let stored = db::find_budget_by_user(pool, user_id).await?;
    Ok(stored.map(db::StoredBudget::into_remote))
}

/// Create the first budget for a user.
pub async fn handle_insert(pool: &PgPool, payload: &BudgetPayload) -> Result<RemoteBudget> {
    validate_payload(payload)?;

    let stored = db::insert_budget(pool, payload).await?.ok_or_else(|| {
        AppError::Conflict(format!("budget already exists for user {}", payload.user_id))
    })?;

    tracing::info!(user_id = %stored.user_id, id = %stored.id, "budget created");
    Ok(stored.into_remote())
}

/// Overwrite an existing budget's amounts. The client always wins.
pub async fn handle_update(
    pool: &PgPool,
    id: &str,
    payload: &BudgetPayload,
) -> Result<RemoteBudget> {
    validate_payload(payload)?;

    let stored = db::update_budget(pool, id, payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("budget {}", id)))?;

    tracing::debug!(
        user_id = %stored.user_id,
        id = %stored.id,
        version = stored.version,
        "budget overwritten"
    );
    Ok(stored.into_remote())
}
