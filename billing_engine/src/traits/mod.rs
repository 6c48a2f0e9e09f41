//! # Backend contracts
//!
//! The traits in this module define what a storage backend must provide for the billing engine. The public APIs in
//! [`crate::billing_api`] are generic over these traits, so a backend only has to implement the traits an API needs.
//!
//! * [`LedgerManagement`] appends to, and reads from, the accounting ledger. There is no update or delete.
//! * [`RoyaltyReportManagement`] stores royalty reports and applies their state transitions as conditional updates.
//! * [`PayoutManagement`] creates payout documents (claiming reports atomically) and applies payout status changes.
//! * [`SequenceManagement`] hands out per-collection sequence numbers.
//! * [`PaymentFlowDatabase`] stores orders, refunds, payment methods and recurring subscriptions for the gateway flow.
//! * [`MerchantRepository`] and [`ExchangeRates`] are read-only views of external collaborators.
pub(crate) mod errors;
mod exchange_rates;
mod ledger_management;
mod merchant_repository;
mod payment_flow_database;
mod payout_management;
mod royalty_report_management;
mod sequence_management;

pub use errors::ErrorKind;
pub use exchange_rates::{ExchangeRateError, ExchangeRates};
pub use ledger_management::{LedgerError, LedgerManagement};
pub use merchant_repository::{MerchantError, MerchantRepository};
pub use payment_flow_database::{PaymentFlowDatabase, PaymentFlowDatabaseError};
pub use payout_management::{PayoutError, PayoutManagement};
pub use royalty_report_management::{RoyaltyReportError, RoyaltyReportManagement};
pub use sequence_management::{SequenceError, SequenceManagement};
