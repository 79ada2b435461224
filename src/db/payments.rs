use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Payment;

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    amount: i64,
    currency: &str,
    bank_txn_id: &str,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (user_id, amount, currency, bank_txn_id)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(amount)
    .bind(currency)
    .bind(bank_txn_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Webhook correlation lookup. bank_txn_id is unique, so this is the only
/// key the webhook may match on.
pub async fn find_by_bank_txn_id(
    pool: &PgPool,
    bank_txn_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE bank_txn_id = $1")
        .bind(bank_txn_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn mark_paid(
    pool: &PgPool,
    id: Uuid,
    paid_at: DateTime<Utc>,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "UPDATE payments SET status = 'paid', paid_at = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(paid_at)
    .fetch_one(pool)
    .await
}

/// Sum of paid amounts within the trailing window; the tier derivation input.
pub async fn paid_total_since(
    pool: &PgPool,
    user_id: Uuid,
    window_days: i64,
) -> Result<i64, sqlx::Error> {
    let since = Utc::now() - Duration::days(window_days);
    // SUM(bigint) widens to numeric; cast back for the i64 decode.
    let row: (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payments
         WHERE user_id = $1 AND status = 'paid' AND paid_at >= $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
