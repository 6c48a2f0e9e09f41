use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::Merchant;

pub async fn fetch_merchant(id: &str, conn: &mut SqliteConnection) -> Result<Option<Merchant>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, payout_currency, banking, company FROM merchants WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Inserts the merchant, or replaces its profile if it already exists.
pub async fn upsert_merchant(
    merchant: &Merchant,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Merchant, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO merchants (id, name, payout_currency, banking, company, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                payout_currency = excluded.payout_currency,
                banking = excluded.banking,
                company = excluded.company,
                updated_at = excluded.updated_at
            RETURNING id, name, payout_currency, banking, company;
        "#,
    )
    .bind(&merchant.id)
    .bind(&merchant.name)
    .bind(&merchant.payout_currency)
    .bind(&merchant.banking)
    .bind(&merchant.company)
    .bind(now)
    .fetch_one(conn)
    .await
}
