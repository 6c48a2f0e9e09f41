//! # Payment gateways
//!
//! Provider-specific adapters behind one capability set ([`PaymentGateway`]), and the name-keyed dispatch
//! ([`GatewayRegistry`]) that resolves the adapter configured for a payment method.
//!
//! Adapters never touch storage. They build and sign outbound requests, verify inbound webhooks against the exact raw
//! bytes received, and mutate the [`GatewayOrder`], [`GatewayRefund`] or [`RecurringSubscription`] handed to them.
//! Persisting the result is the caller's job.
mod adapter;
pub mod cardpay;
mod config;
mod data_objects;
mod error;
mod mock;
mod registry;
pub mod signer;
mod traits;
pub mod transport;

pub use adapter::GatewayAdapter;
pub use cardpay::CardPayGateway;
pub use config::GatewayConfig;
pub use data_objects::{
    GatewayOrder,
    GatewayRefund,
    GatewayRequest,
    PaymentMethod,
    PaymentMethodParams,
    PaymentStatus,
    RecurringPeriod,
    RecurringSubscription,
    RefundStatus,
    Requisites,
    SubscriptionStatus,
    TerminalCredentials,
};
pub use error::{ErrorKind, GatewayError};
pub use mock::{MockGateway, MockOutcome};
pub use registry::{GatewayRegistry, CARDPAY_GATEWAY, MOCK_GATEWAY};
pub use traits::PaymentGateway;
