use std::{env, time::Duration};

use billing_common::{
    helpers::{env_or_default, parse_boolean_flag},
    Secret,
};
use log::*;

pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Applied to every outbound gateway HTTP call.
    pub timeout: Duration,
    /// Registers the in-process `mock` gateway alongside CardPay.
    pub enable_mock: bool,
    pub mock_callback_secret: Secret<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
            enable_mock: false,
            mock_callback_secret: Secret::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let timeout = env_or_default("BILLING_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT_SECS);
        let timeout = if timeout == 0 {
            warn!(
                "🪛️ BILLING_GATEWAY_TIMEOUT_SECS must be positive. Using the default of {DEFAULT_GATEWAY_TIMEOUT_SECS}s."
            );
            Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS)
        } else {
            Duration::from_secs(timeout)
        };
        let enable_mock = parse_boolean_flag(env::var("BILLING_ENABLE_MOCK_GATEWAY").ok(), false);
        let mock_callback_secret = Secret::new(env::var("BILLING_MOCK_GATEWAY_SECRET").unwrap_or_default());
        if enable_mock {
            warn!("🪛️ The mock payment gateway is enabled. Do not use this setting in production.");
            if mock_callback_secret.is_empty() {
                warn!("🪛️ BILLING_MOCK_GATEWAY_SECRET is not set. Mock callbacks are signed with an empty key.");
            }
        }
        Self { timeout, enable_mock, mock_callback_secret }
    }
}
