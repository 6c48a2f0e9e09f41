use sqlx::SqliteConnection;

use crate::db_types::PaymentMethodRecord;

pub async fn insert_payment_method(
    name: &str,
    handler: &str,
    external_id: &str,
    params: &serde_json::Value,
    conn: &mut SqliteConnection,
) -> Result<PaymentMethodRecord, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO payment_methods (name, handler, external_id, params) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(name)
    .bind(handler)
    .bind(external_id)
    .bind(params.to_string())
    .fetch_one(conn)
    .await
}

pub async fn fetch_payment_method(id: i64, conn: &mut SqliteConnection) -> Result<Option<PaymentMethodRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_methods WHERE id = $1").bind(id).fetch_optional(conn).await
}
