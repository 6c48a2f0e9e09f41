use chrono::{DateTime, Utc};
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewRoyaltyReport, RoyaltyReport};

pub async fn insert_report(
    report: NewRoyaltyReport,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<RoyaltyReport, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO royalty_reports (
                merchant_id,
                currency,
                period_from,
                period_to,
                status,
                totals,
                summary,
                accept_expire_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(report.merchant_id)
    .bind(report.currency)
    .bind(report.period_from)
    .bind(report.period_to)
    .bind(Json(report.totals))
    .bind(Json(report.summary))
    .bind(report.accept_expire_at)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_report(id: i64, conn: &mut SqliteConnection) -> Result<Option<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM royalty_reports WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_reports_for_merchant(
    merchant_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM royalty_reports WHERE merchant_id = $1 ORDER BY period_from, id")
        .bind(merchant_id)
        .fetch_all(conn)
        .await
}

pub async fn accept(id: i64, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Option<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE royalty_reports
            SET status = 'accepted', accepted_at = $2, is_auto_accepted = FALSE, updated_at = $2
            WHERE id = $1 AND status IN ('pending', 'dispute_closed') AND accept_expire_at > $2
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(now)
    .fetch_optional(conn)
    .await
}

pub async fn dispute(
    id: i64,
    reason: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE royalty_reports
            SET status = 'dispute', dispute_reason = $2, dispute_started_at = $3, updated_at = $3
            WHERE id = $1 AND status = 'pending' AND accept_expire_at > $3
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(reason)
    .bind(now)
    .fetch_optional(conn)
    .await
}

pub async fn close_dispute(
    id: i64,
    accept_expire_at: DateTime<Utc>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE royalty_reports
            SET status = 'dispute_closed', dispute_closed_at = $3, accept_expire_at = $2, updated_at = $3
            WHERE id = $1 AND status = 'dispute'
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(accept_expire_at)
    .bind(now)
    .fetch_optional(conn)
    .await
}

pub async fn auto_accept(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Vec<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE royalty_reports
            SET status = 'accepted', accepted_at = $1, is_auto_accepted = TRUE, updated_at = $1
            WHERE status IN ('pending', 'dispute_closed') AND accept_expire_at <= $1
            RETURNING *;
        "#,
    )
    .bind(now)
    .fetch_all(conn)
    .await
}

/// Accepted reports of the merchant that no payout document has claimed yet.
pub async fn fetch_claimable(merchant_id: &str, conn: &mut SqliteConnection) -> Result<Vec<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM royalty_reports
            WHERE merchant_id = $1 AND status = 'accepted' AND payout_document_id IS NULL
            ORDER BY period_from, id
        "#,
    )
    .bind(merchant_id)
    .fetch_all(conn)
    .await
}

/// Links the report to a payout document if, and only if, no document has claimed it yet.
pub async fn claim(
    id: i64,
    payout_document_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE royalty_reports
            SET payout_document_id = $2, updated_at = $3
            WHERE id = $1 AND status = 'accepted' AND payout_document_id IS NULL
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(payout_document_id)
    .bind(now)
    .fetch_optional(conn)
    .await
}

pub async fn stamp_payout_date(
    payout_document_id: i64,
    payout_date: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<RoyaltyReport>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE royalty_reports SET payout_date = $2, updated_at = $2
            WHERE payout_document_id = $1
            RETURNING *;
        "#,
    )
    .bind(payout_document_id)
    .bind(payout_date)
    .fetch_all(conn)
    .await
}
