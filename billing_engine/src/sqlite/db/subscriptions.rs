use chrono::{DateTime, Utc};
use payment_gateways::RecurringSubscription;
use sqlx::SqliteConnection;

use crate::db_types::{Subscription, SubscriptionStatusType};

pub async fn insert_subscription(
    order_id: &str,
    subscription: &RecurringSubscription,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO recurring_subscriptions (
                order_id,
                plan_id,
                subscription_id,
                amount,
                currency,
                period,
                interval_count,
                charge_amount,
                charge_currency,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(&subscription.plan_id)
    .bind(&subscription.subscription_id)
    .bind(subscription.amount)
    .bind(&subscription.currency)
    .bind(subscription.period.to_string())
    .bind(i64::from(subscription.interval))
    .bind(subscription.charge_amount)
    .bind(&subscription.charge_currency)
    .bind(SubscriptionStatusType::from(subscription.status))
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn fetch_subscription(order_id: &str, conn: &mut SqliteConnection) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM recurring_subscriptions WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn update_subscription(
    order_id: &str,
    subscription: &RecurringSubscription,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE recurring_subscriptions SET
                plan_id = $2,
                subscription_id = $3,
                charge_amount = $4,
                charge_currency = $5,
                status = $6,
                updated_at = $7
            WHERE order_id = $1
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(&subscription.plan_id)
    .bind(&subscription.subscription_id)
    .bind(subscription.charge_amount)
    .bind(&subscription.charge_currency)
    .bind(SubscriptionStatusType::from(subscription.status))
    .bind(now)
    .fetch_optional(conn)
    .await
}
