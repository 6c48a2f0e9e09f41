use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::Autoincrement;

/// Increments the counter for `collection` in a single upsert and returns the new value. A new collection starts at 1.
pub async fn next_value(collection: &str, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let counter: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO sequence_counters (collection, counter, updated_at) VALUES ($1, 1, $2)
            ON CONFLICT (collection) DO UPDATE SET counter = counter + 1, updated_at = excluded.updated_at
            RETURNING counter;
        "#,
    )
    .bind(collection)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🔢️ {collection} -> {counter}");
    Ok(counter)
}

pub async fn fetch_sequence(collection: &str, conn: &mut SqliteConnection) -> Result<Option<Autoincrement>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sequence_counters WHERE collection = $1")
        .bind(collection)
        .fetch_optional(conn)
        .await
}
