use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{AccountingEntry, EntrySource, LedgerLine, NewAccountingEntry};

/// Appends an entry to the ledger. There is deliberately no update or delete counterpart, and the table's triggers
/// reject both.
pub async fn insert_entry(
    entry: NewAccountingEntry,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<AccountingEntry, sqlx::Error> {
    let original_amount = entry.original_amount.unwrap_or(entry.amount);
    let original_currency = entry.original_currency.clone().unwrap_or_else(|| entry.currency.clone());
    let local_amount = entry.local_amount.unwrap_or(entry.amount);
    let local_currency = entry.local_currency.clone().unwrap_or_else(|| entry.currency.clone());
    let available_on = entry.available_on.unwrap_or(now);
    let result: AccountingEntry = sqlx::query_as(
        r#"
            INSERT INTO accounting_entries (
                entry_type,
                source_id,
                source_type,
                merchant_id,
                amount,
                currency,
                original_amount,
                original_currency,
                local_amount,
                local_currency,
                country,
                reason,
                status,
                created_at,
                available_on
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *;
        "#,
    )
    .bind(entry.entry_type)
    .bind(&entry.source.id)
    .bind(&entry.source.source_type)
    .bind(&entry.merchant_id)
    .bind(entry.amount)
    .bind(&entry.currency)
    .bind(original_amount)
    .bind(original_currency)
    .bind(local_amount)
    .bind(local_currency)
    .bind(&entry.country)
    .bind(&entry.reason)
    .bind(entry.status)
    .bind(now)
    .bind(available_on)
    .fetch_one(conn)
    .await?;
    debug!(
        "🧾️ Entry #{} ({}) of {} {} recorded for merchant {}",
        result.id, result.entry_type, result.amount, result.currency, result.merchant_id
    );
    Ok(result)
}

pub async fn fetch_entry(id: i64, conn: &mut SqliteConnection) -> Result<Option<AccountingEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM accounting_entries WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_entries_for_merchant(
    merchant_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<AccountingEntry>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM accounting_entries
            WHERE merchant_id = $1 AND available_on >= $2 AND available_on < $3
            ORDER BY available_on, id
        "#,
    )
    .bind(merchant_id)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}

pub async fn fetch_entries_for_source(
    source: &EntrySource,
    conn: &mut SqliteConnection,
) -> Result<Vec<AccountingEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM accounting_entries WHERE source_type = $1 AND source_id = $2 ORDER BY id")
        .bind(&source.source_type)
        .bind(&source.id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_merchants_with_entries(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
            SELECT DISTINCT merchant_id FROM accounting_entries
            WHERE available_on >= $1 AND available_on < $2
            ORDER BY merchant_id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}

/// Entries in the window, each with the product of the order it came from. Refund entries reach their order through
/// the refund record.
pub async fn fetch_ledger_lines(
    merchant_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerLine>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT e.*, COALESCE(o.product, ro.product) AS product
            FROM accounting_entries e
            LEFT JOIN orders o ON e.source_type = 'order' AND o.order_id = e.source_id
            LEFT JOIN refunds r ON e.source_type = 'refund' AND r.refund_id = e.source_id
            LEFT JOIN orders ro ON ro.order_id = r.order_id
            WHERE e.merchant_id = $1 AND e.available_on >= $2 AND e.available_on < $3
            ORDER BY e.available_on, e.id
        "#,
    )
    .bind(merchant_id)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}
