use std::collections::HashMap;

use log::*;

use crate::{
    transport::{HttpTransport, ReqwestTransport},
    CardPayGateway,
    GatewayAdapter,
    GatewayConfig,
    GatewayError,
    MockGateway,
    MockOutcome,
    PaymentGateway,
};

pub const CARDPAY_GATEWAY: &str = "cardpay";
pub const MOCK_GATEWAY: &str = "mock";

/// Name-keyed gateway adapters, populated once at startup.
pub struct GatewayRegistry<T = ReqwestTransport> {
    gateways: HashMap<String, GatewayAdapter<T>>,
}

impl<T> Default for GatewayRegistry<T> {
    fn default() -> Self {
        Self { gateways: HashMap::new() }
    }
}

impl<T: HttpTransport> GatewayRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter` under its own name, replacing any earlier adapter with that name.
    pub fn register(&mut self, adapter: GatewayAdapter<T>) -> &mut Self {
        let name = adapter.name().to_string();
        if self.gateways.insert(name.clone(), adapter).is_some() {
            warn!("💳️ Gateway handler '{name}' was registered twice. The last registration wins.");
        } else {
            info!("💳️ Gateway handler '{name}' registered");
        }
        self
    }

    /// Registers `adapter` under an explicit name.
    pub fn register_as(&mut self, name: &str, adapter: GatewayAdapter<T>) -> &mut Self {
        self.gateways.insert(name.to_string(), adapter);
        self
    }

    pub fn get_gateway(&self, name: &str) -> Result<&GatewayAdapter<T>, GatewayError> {
        self.gateways.get(name).ok_or_else(|| {
            warn!("💳️ No gateway handler is registered as '{name}'");
            GatewayError::HandlerNotFound(name.to_string())
        })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.gateways.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort();
        names
    }
}

impl GatewayRegistry<ReqwestTransport> {
    /// Builds the production registry: CardPay always, the mock gateway when enabled.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut registry = Self::new();
        let transport = ReqwestTransport::new(config.timeout)?;
        registry.register(GatewayAdapter::CardPay(CardPayGateway::new(transport)));
        if config.enable_mock {
            let mock = MockGateway::new(MockOutcome::Succeed, config.mock_callback_secret.clone());
            registry.register(GatewayAdapter::Mock(mock));
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod test {
    use billing_common::Secret;

    use super::*;

    #[test]
    fn lookup_by_name() {
        let mut registry = GatewayRegistry::<ReqwestTransport>::new();
        registry.register(GatewayAdapter::Mock(MockGateway::new(MockOutcome::Succeed, Secret::default())));
        assert_eq!(registry.get_gateway(MOCK_GATEWAY).unwrap().name(), MOCK_GATEWAY);
        let err = registry.get_gateway("paypal").err().unwrap();
        assert!(matches!(err, GatewayError::HandlerNotFound(ref n) if n == "paypal"));
        assert_eq!(err.code(), "handler_not_found");
    }

    #[test]
    fn production_registry() {
        let config = GatewayConfig::default();
        let registry = GatewayRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec![CARDPAY_GATEWAY]);
        let config = GatewayConfig { enable_mock: true, ..GatewayConfig::default() };
        let registry = GatewayRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec![CARDPAY_GATEWAY, MOCK_GATEWAY]);
    }
}
