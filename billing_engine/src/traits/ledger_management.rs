use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{AccountingEntry, EntrySource, NewAccountingEntry},
    traits::{ErrorKind, ExchangeRateError, MerchantError},
};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Accounting entry {0} does not exist")]
    EntryNotFound(i64),
    #[error("Merchant {0} does not exist")]
    MerchantNotFound(String),
    #[error("Invalid ledger amount: {0}")]
    InvalidAmount(String),
    #[error("Could not convert the entry into the settlement currency. {0}")]
    ExchangeRate(#[from] ExchangeRateError),
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::EntryNotFound(_) => "entry_not_found",
            Self::MerchantNotFound(_) => "merchant_not_found",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::ExchangeRate(e) => e.code(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Transport,
            Self::ExchangeRate(e) => e.kind(),
            _ => ErrorKind::Validation,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<MerchantError> for LedgerError {
    fn from(e: MerchantError) -> Self {
        match e {
            MerchantError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

/// The append-only accounting ledger.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Appends one entry. Missing original and local amounts default to the entry amount, and a missing
    /// `available_on` defaults to the creation time.
    async fn insert_entry(&self, entry: NewAccountingEntry) -> Result<AccountingEntry, LedgerError>;

    async fn fetch_entry(&self, id: i64) -> Result<Option<AccountingEntry>, LedgerError>;

    /// Entries for the merchant with `available_on` in `[from, to)`, oldest first.
    async fn fetch_entries_for_merchant(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AccountingEntry>, LedgerError>;

    async fn fetch_entries_for_source(&self, source: &EntrySource) -> Result<Vec<AccountingEntry>, LedgerError>;

    /// Every merchant with at least one entry available in `[from, to)`.
    async fn fetch_merchants_with_entries(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<String>, LedgerError>;
}
