use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{Actor, ChangeRecord};

/// The two append-only audit tables.
#[derive(Debug, Clone, Copy)]
pub enum ChangeLog {
    RoyaltyReport,
    PayoutDocument,
}

impl ChangeLog {
    fn table(&self) -> &'static str {
        match self {
            Self::RoyaltyReport => "royalty_report_changes",
            Self::PayoutDocument => "payout_document_changes",
        }
    }
}

pub async fn record_change(
    log: ChangeLog,
    document_id: i64,
    actor: &Actor,
    hash: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<ChangeRecord, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} (document_id, source, ip, hash, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        log.table()
    );
    sqlx::query_as(&sql)
        .bind(document_id)
        .bind(&actor.source)
        .bind(&actor.ip)
        .bind(hash)
        .bind(now)
        .fetch_one(conn)
        .await
}

pub async fn fetch_changes(
    log: ChangeLog,
    document_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ChangeRecord>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} WHERE document_id = $1 ORDER BY id", log.table());
    sqlx::query_as(&sql).bind(document_id).fetch_all(conn).await
}
