//! # SQLite database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction and pass `&mut tx` through, without any
//! other changes. Timestamps are always bound from Rust so that every stored instant has the same text encoding and
//! compares correctly as a string.
use std::{str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod changes;
pub mod exchange_rates;
pub mod ledger;
pub mod merchants;
pub mod orders;
pub mod payment_methods;
pub mod payouts;
pub mod refunds;
pub mod royalty_reports;
pub mod sequence;
pub mod subscriptions;

pub async fn new_pool(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<SqlitePool, SqlxError> {
    info!("🗃️ Opening SQLite pool at {url} with up to {max_connections} connections");
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).busy_timeout(acquire_timeout);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}
