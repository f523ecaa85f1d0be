//! Database operations for the budgets table.

use budgetbox_engine::{BudgetPayload, RemoteBudget};
use sqlx::{PgPool, Row};

/// A stored budget row from the database.
#[derive(Debug)]
pub struct StoredBudget {
    pub id: String,
    pub user_id: String,
    pub income: f64,
    pub bills: f64,
    pub food: f64,
    pub transport: f64,
    pub subscriptions: f64,
    pub miscellaneous: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub version: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredBudget {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredBudget {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            income: row.try_get("income")?,
            bills: row.try_get("bills")?,
            food: row.try_get("food")?,
            transport: row.try_get("transport")?,
            subscriptions: row.try_get("subscriptions")?,
            miscellaneous: row.try_get("miscellaneous")?,
            updated_at: row.try_get("updated_at")?,
            version: row.try_get("version")?,
        })
    }
}

impl StoredBudget {
    /// Convert a database row to the wire representation.
    pub fn into_remote(self) -> RemoteBudget {
        RemoteBudget {
            id: self.id,
            user_id: self.user_id,
            income: self.income,
            bills: self.bills,
            food: self.food,
            transport: self.transport,
            subscriptions: self.subscriptions,
            miscellaneous: self.miscellaneous,
            updated_at: Some(self.updated_at),
            version: Some(self.version),
        }
    }
}

const COLUMNS: &str = "id, user_id, income, bills, food, transport, subscriptions, \
                       miscellaneous, updated_at, version";

/// Get the budget owned by `user_id`.
pub async fn find_budget_by_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<StoredBudget>, sqlx::Error> {
    sqlx::query_as::<_, StoredBudget>(&format!(
        "SELECT {} FROM budgets WHERE user_id = $1",
        COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Insert a new budget with a fresh id.
///
/// Returns `None` if the user already has a budget.
pub async fn insert_budget(
    pool: &PgPool,
    payload: &BudgetPayload,
) -> Result<Option<StoredBudget>, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query_as::<_, StoredBudget>(&format!(
        r#"
        INSERT INTO budgets (id, user_id, income, bills, food, transport,
                             subscriptions, miscellaneous, updated_at, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), 1)
        ON CONFLICT (user_id) DO NOTHING
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(&id)
    .bind(&payload.user_id)
    .bind(payload.income)
    .bind(payload.bills)
    .bind(payload.food)
    .bind(payload.transport)
    .bind(payload.subscriptions)
    .bind(payload.miscellaneous)
    .fetch_optional(pool)
    .await
}

/// Overwrite the amounts of budget `id`, which must belong to the payload's user.
///
/// Returns `None` if no such budget exists.
pub async fn update_budget(
    pool: &PgPool,
    id: &str,
    payload: &BudgetPayload,
) -> Result<Option<StoredBudget>, sqlx::Error> {
    sqlx::query_as::<_, StoredBudget>(&format!(
        r#"
        UPDATE budgets
        SET income = $3, bills = $4, food = $5, transport = $6,
            subscriptions = $7, miscellaneous = $8,
            updated_at = now(), version = version + 1
        WHERE id = $1 AND user_id = $2
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(id)
    .bind(&payload.user_id)
    .bind(payload.income)
    .bind(payload.bills)
    .bind(payload.food)
    .bind(payload.transport)
    .bind(payload.subscriptions)
    .bind(payload.miscellaneous)
    .fetch_optional(pool)
    .await
}
