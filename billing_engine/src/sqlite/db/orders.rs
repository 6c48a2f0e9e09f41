use chrono::{DateTime, Utc};
use log::debug;
use payment_gateways::GatewayOrder;
use sqlx::SqliteConnection;

use crate::db_types::{NewOrder, Order, OrderStatusType};

pub async fn insert_order(order: NewOrder, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                merchant_id,
                product,
                description,
                amount,
                currency,
                country,
                payment_method_id,
                mcc_code,
                operating_company_id,
                card_brand,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'created', $12, $12)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.merchant_id)
    .bind(order.product)
    .bind(order.description)
    .bind(order.amount)
    .bind(order.currency)
    .bind(order.country)
    .bind(order.payment_method_id)
    .bind(order.mcc_code)
    .bind(order.operating_company_id)
    .bind(order.card_brand)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted with id {}", order.order_id, order.id);
    Ok(order)
}

pub async fn fetch_order(order_id: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

/// Writes the gateway's view of the order, but only while the stored order is not terminal.
pub async fn update_order(
    order: &GatewayOrder,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $2,
                payment_method_txn_id = $3,
                masked_pan = $4,
                recurring_id = $5,
                decline_reason = $6,
                paid_at = $7,
                updated_at = $8
            WHERE order_id = $1 AND status NOT IN ('paid', 'rejected', 'refunded')
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(OrderStatusType::from(order.status))
    .bind(&order.payment_method_txn_id)
    .bind(&order.masked_pan)
    .bind(&order.recurring_id)
    .bind(&order.decline_reason)
    .bind(order.paid_at)
    .bind(now)
    .fetch_optional(conn)
    .await
}

/// Moves a paid order to `refunded`. Returns `None` unless the order was `paid`.
/// Moves a paid order to `refunded` once its completed refunds add up to the order amount. Returns `None` while the
/// order is only partially refunded, or if it is not paid.
pub async fn mark_refunded(
    order_id: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET status = 'refunded', updated_at = $2
            WHERE order_id = $1 AND status = 'paid'
              AND (
                SELECT COALESCE(SUM(r.amount), 0) FROM refunds r
                WHERE r.order_id = orders.order_id AND r.status = 'completed'
              ) >= orders.amount
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(now)
    .fetch_optional(conn)
    .await
}
