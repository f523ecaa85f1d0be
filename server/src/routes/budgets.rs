//! Budget endpoint routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use budgetbox_engine::{BudgetPayload, RemoteBudget};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{handle_find, handle_insert, handle_update, BudgetQuery};
use crate::AppState;

/// Create budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(find_handler).post(insert_handler))
        .route("/budgets/{id}", put(update_handler))
}

/// GET /budgets?userId= - The user's budget, or `null`.
async fn find_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BudgetQuery>,
) -> Result<Json<Option<RemoteBudget>>> {
    auth.authorize(&query.user_id)?;
    let budget = handle_find(&state.pool, &query.user_id).await?;
    Ok(Json(budget))
}

/// POST /budgets - Create the user's budget.
async fn insert_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<BudgetPayload>,
) -> Result<(StatusCode, Json<RemoteBudget>)> {
    auth.authorize(&payload.user_id)?;
    let budget = handle_insert(&state.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// PUT /budgets/{id} - Overwrite the budget's amounts.
async fn update_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<BudgetPayload>,
) -> Result<Json<RemoteBudget>> {
    auth.authorize(&payload.user_id)?;
    let budget = handle_update(&state.pool, &id, &payload).await?;
    Ok(Json(budget))
}
