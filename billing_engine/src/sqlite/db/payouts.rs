use chrono::{DateTime, Utc};
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewPayoutDocument, PayoutDocument, PayoutTransition};

pub async fn insert_payout(
    payout: &NewPayoutDocument,
    autoincrement_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PayoutDocument, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO payout_documents (
                merchant_id,
                source_ids,
                total_fees,
                balance,
                currency,
                total_transactions,
                destination,
                company,
                status,
                autoincrement_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10, $10)
            RETURNING *;
        "#,
    )
    .bind(&payout.merchant_id)
    .bind(Json(&payout.source_ids))
    .bind(payout.total_fees)
    .bind(payout.balance)
    .bind(&payout.currency)
    .bind(payout.total_transactions)
    .bind(Json(&payout.destination))
    .bind(Json(&payout.company))
    .bind(autoincrement_id)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Applies `transition` if the document is in one of the statuses the transition is allowed from. Returns `None` when
/// the document does not exist or is in any other status.
pub async fn transition(
    id: i64,
    transition: &PayoutTransition,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<PayoutDocument>, sqlx::Error> {
    let allowed =
        transition.allowed_from().iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(", ");
    match transition {
        PayoutTransition::InProgress { transaction_id } => {
            let sql = format!(
                "UPDATE payout_documents SET status = 'in_progress', transaction_id = $2, updated_at = $3 WHERE id = \
                 $1 AND status IN ({allowed}) RETURNING *"
            );
            sqlx::query_as(&sql).bind(id).bind(transaction_id).bind(now).fetch_optional(conn).await
        },
        PayoutTransition::Paid { transaction_id, arrival_date } => {
            let sql = format!(
                "UPDATE payout_documents SET status = 'paid', transaction_id = $2, arrival_date = $3, paid_at = $4, \
                 updated_at = $4 WHERE id = $1 AND status IN ({allowed}) RETURNING *"
            );
            sqlx::query_as(&sql)
                .bind(id)
                .bind(transaction_id)
                .bind(arrival_date)
                .bind(now)
                .fetch_optional(conn)
                .await
        },
        PayoutTransition::Failed { code, message, failure_transaction } => {
            let sql = format!(
                "UPDATE payout_documents SET status = 'failed', failure_code = $2, failure_message = $3, \
                 failure_transaction = $4, updated_at = $5 WHERE id = $1 AND status IN ({allowed}) RETURNING *"
            );
            sqlx::query_as(&sql)
                .bind(id)
                .bind(code)
                .bind(message)
                .bind(failure_transaction)
                .bind(now)
                .fetch_optional(conn)
                .await
        },
    }
}

pub async fn fetch_payout(id: i64, conn: &mut SqliteConnection) -> Result<Option<PayoutDocument>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payout_documents WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_payouts_for_merchant(
    merchant_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<PayoutDocument>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payout_documents WHERE merchant_id = $1 ORDER BY id")
        .bind(merchant_id)
        .fetch_all(conn)
        .await
}
