//! # Billing engine public API
//!
//! The `billing_api` module exposes the programmatic API for the billing engine. The API is modular, so that clients
//! can pick the parts they need and back each one with any storage that implements the required traits.
//!
//! * [`LedgerApi`] appends entries to the accounting ledger, including corrections and rolling reserves.
//! * [`RoyaltyReportApi`] generates royalty reports and drives the accept / dispute / auto-accept workflow.
//! * [`PayoutApi`] aggregates accepted reports into numbered payout documents and tracks their transfer status.
//! * [`SequenceApi`] hands out per-collection sequence numbers.
//! * [`PaymentFlowApi`] routes orders, refunds and subscriptions through the configured payment gateways.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs:
//!
//! ```rust,ignore
//! use billing_engine::{db_types::Actor, events::EventProducers, PayoutApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/billing_store.db", 25).await?;
//! let api = PayoutApi::new(db, EventProducers::default());
//! let payout = api.create_payout_document("merchant-1", &Actor::new("ops@example.com", "10.0.0.1")).await?;
//! ```
mod errors;
mod ledger_api;
mod payment_flow_api;
mod payout_api;
pub mod report_summary;
mod royalty_report_api;
mod sequence_api;

pub use errors::PaymentFlowError;
pub use ledger_api::LedgerApi;
pub use payment_flow_api::{CallbackOutcome, PaymentFlowApi};
pub use payout_api::{PayoutApi, PAYOUT_SEQUENCE};
pub use royalty_report_api::{RoyaltyReportApi, AUTO_ACCEPT_ACTOR};
pub use sequence_api::SequenceApi;
