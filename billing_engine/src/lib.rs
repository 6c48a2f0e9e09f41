//! Billing Engine
//!
//! The billing engine is the financial reconciliation pipeline of a payment platform. It records every money movement
//! in an append-only accounting ledger, closes each merchant's earnings into periodic royalty reports, and aggregates
//! accepted reports into numbered payout documents. Payments, refunds and recurring subscriptions reach the ledger
//! through the gateway adapters of the `payment_gateways` crate.
//!
//! The library is divided into these main sections:
//! 1. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). You should
//!    rarely need to access the database directly. The exception is the data types stored in it, which are defined in
//!    [`db_types`] and are public.
//! 2. The public API ([`mod@billing_api`]). Each API is generic over the storage traits it needs, so hosts can swap in
//!    their own merchant repository or exchange rate service.
//!
//! The engine also emits events when a report is accepted or disputed and when a payout document is created or changes
//! status. See [`events`] for how to hook into them, for example to send e-mail notifications.
pub mod billing_api;
pub mod config;
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;
#[cfg(feature = "sqlite")]
pub mod workers;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use billing_api::{
    CallbackOutcome,
    LedgerApi,
    PaymentFlowApi,
    PaymentFlowError,
    PayoutApi,
    RoyaltyReportApi,
    SequenceApi,
};
pub use config::BillingConfig;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
