use chrono::{DateTime, Utc};
use payment_gateways::GatewayRefund;
use sqlx::SqliteConnection;

use crate::db_types::{NewRefund, Refund, RefundStatusType};

pub async fn insert_refund(refund: NewRefund, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Refund, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO refunds (refund_id, order_id, amount, currency, reason, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'created', $6, $6)
            RETURNING *;
        "#,
    )
    .bind(refund.refund_id)
    .bind(refund.order_id)
    .bind(refund.amount)
    .bind(refund.currency)
    .bind(refund.reason)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_refund(refund_id: &str, conn: &mut SqliteConnection) -> Result<Option<Refund>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM refunds WHERE refund_id = $1").bind(refund_id).fetch_optional(conn).await
}

pub async fn fetch_refunds_for_order(order_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Refund>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM refunds WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// Writes the gateway's view of the refund while the stored refund is not terminal.
pub async fn update_refund(
    refund: &GatewayRefund,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Refund>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE refunds SET status = $2, external_id = $3, updated_at = $4
            WHERE refund_id = $1 AND status NOT IN ('completed', 'rejected')
            RETURNING *;
        "#,
    )
    .bind(&refund.refund_id)
    .bind(RefundStatusType::from(refund.status))
    .bind(&refund.external_id)
    .bind(now)
    .fetch_optional(conn)
    .await
}
