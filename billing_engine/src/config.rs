//! Engine configuration, read from `BILLING_*` environment variables.
use std::{env, time::Duration};

use billing_common::helpers::env_or_default;
use log::*;
use payment_gateways::GatewayConfig;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/billing_store.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;
/// One week.
pub const DEFAULT_ACCEPT_GRACE_HOURS: i64 = 168;
pub const DEFAULT_AUTO_ACCEPT_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection or SQLite's write lock.
    pub acquire_timeout: Duration,
    /// How long a merchant has to accept or dispute a fresh royalty report.
    pub accept_grace: chrono::Duration,
    pub auto_accept_interval: Duration,
    pub gateways: GatewayConfig,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            accept_grace: chrono::Duration::hours(DEFAULT_ACCEPT_GRACE_HOURS),
            auto_accept_interval: Duration::from_secs(DEFAULT_AUTO_ACCEPT_INTERVAL_SECS),
            gateways: GatewayConfig::default(),
        }
    }
}

impl BillingConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("BILLING_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BILLING_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = match env_or_default("BILLING_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS) {
            0 => {
                warn!("🪛️ BILLING_DB_MAX_CONNECTIONS cannot be zero. Using {DEFAULT_MAX_CONNECTIONS}.");
                DEFAULT_MAX_CONNECTIONS
            },
            n => n,
        };
        let acquire_timeout =
            Duration::from_secs(env_or_default("BILLING_DB_ACQUIRE_TIMEOUT_SECS", DEFAULT_ACQUIRE_TIMEOUT_SECS));
        let grace_hours = match env_or_default("BILLING_ROYALTY_ACCEPT_GRACE_HOURS", DEFAULT_ACCEPT_GRACE_HOURS) {
            h if h < 0 => {
                warn!("🪛️ BILLING_ROYALTY_ACCEPT_GRACE_HOURS cannot be negative. Using {DEFAULT_ACCEPT_GRACE_HOURS}.");
                DEFAULT_ACCEPT_GRACE_HOURS
            },
            h => h,
        };
        let interval = match env_or_default("BILLING_AUTO_ACCEPT_INTERVAL_SECS", DEFAULT_AUTO_ACCEPT_INTERVAL_SECS) {
            0 => {
                warn!(
                    "🪛️ BILLING_AUTO_ACCEPT_INTERVAL_SECS must be positive. Using {DEFAULT_AUTO_ACCEPT_INTERVAL_SECS}."
                );
                DEFAULT_AUTO_ACCEPT_INTERVAL_SECS
            },
            s => s,
        };
        let gateways = GatewayConfig::from_env_or_default();
        Self {
            database_url,
            max_connections,
            acquire_timeout,
            accept_grace: chrono::Duration::hours(grace_hours),
            auto_accept_interval: Duration::from_secs(interval),
            gateways,
        }
    }
}
