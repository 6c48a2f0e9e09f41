use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Actor, ChangeRecord, LedgerLine, NewRoyaltyReport, ReportStatus, RoyaltyReport},
    traits::{ErrorKind, ExchangeRateError, LedgerError, MerchantError},
};

#[derive(Debug, Clone, Error)]
pub enum RoyaltyReportError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Royalty report {0} does not exist")]
    ReportNotFound(i64),
    #[error("A royalty report for merchant {merchant_id} already covers {period_from} to {period_to}")]
    ReportAlreadyExists { merchant_id: String, period_from: DateTime<Utc>, period_to: DateTime<Utc> },
    #[error("Royalty report {id} cannot {action} while it is {status}")]
    InvalidTransition { id: i64, status: ReportStatus, action: &'static str },
    #[error("The accept window for royalty report {0} has closed")]
    AcceptWindowExpired(i64),
    #[error("Invalid report period: {0}")]
    InvalidPeriod(String),
    #[error("Merchant {0} does not exist")]
    MerchantNotFound(String),
    #[error("Could not convert a ledger entry into the report currency. {0}")]
    ExchangeRate(#[from] ExchangeRateError),
}

impl RoyaltyReportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::ReportNotFound(_) => "report_not_found",
            Self::ReportAlreadyExists { .. } => "report_already_exists",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AcceptWindowExpired(_) => "accept_window_expired",
            Self::InvalidPeriod(_) => "invalid_period",
            Self::MerchantNotFound(_) => "merchant_not_found",
            Self::ExchangeRate(e) => e.code(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Transport,
            Self::ReportAlreadyExists { .. } => ErrorKind::Consistency,
            Self::ExchangeRate(e) => e.kind(),
            _ => ErrorKind::Validation,
        }
    }
}

impl From<sqlx::Error> for RoyaltyReportError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<MerchantError> for RoyaltyReportError {
    fn from(e: MerchantError) -> Self {
        match e {
            MerchantError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

impl From<LedgerError> for RoyaltyReportError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ExchangeRate(e) => Self::ExchangeRate(e),
            LedgerError::MerchantNotFound(m) => Self::MerchantNotFound(m),
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

/// Royalty report storage. Every state-changing method is a conditional update that only succeeds from the expected
/// prior state, and records an audit row in the same transaction.
#[allow(async_fn_in_trait)]
pub trait RoyaltyReportManagement {
    /// Ledger entries available in `[from, to)` for the merchant, each with the product of its source order.
    async fn fetch_ledger_lines(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LedgerLine>, RoyaltyReportError>;

    /// Stores a new pending report. Fails with [`RoyaltyReportError::ReportAlreadyExists`] if the merchant already
    /// has a report for the same period.
    async fn insert_report(&self, report: NewRoyaltyReport, actor: &Actor) -> Result<RoyaltyReport, RoyaltyReportError>;

    async fn fetch_report(&self, id: i64) -> Result<Option<RoyaltyReport>, RoyaltyReportError>;

    async fn fetch_reports_for_merchant(&self, merchant_id: &str) -> Result<Vec<RoyaltyReport>, RoyaltyReportError>;

    async fn fetch_report_changes(&self, id: i64) -> Result<Vec<ChangeRecord>, RoyaltyReportError>;

    /// `pending | dispute_closed → accepted`, only while `accept_expire_at > now`. Returns `None` if the report was
    /// not in an acceptable state.
    async fn accept_report(
        &self,
        id: i64,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Option<RoyaltyReport>, RoyaltyReportError>;

    /// `pending → dispute`, only while `accept_expire_at > now`. Returns `None` if the report was not pending or the
    /// window has closed.
    async fn dispute_report(
        &self,
        id: i64,
        reason: &str,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Option<RoyaltyReport>, RoyaltyReportError>;

    /// `dispute → dispute_closed`, setting a fresh `accept_expire_at`.
    async fn close_dispute(
        &self,
        id: i64,
        accept_expire_at: DateTime<Utc>,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Option<RoyaltyReport>, RoyaltyReportError>;

    /// Accepts every `pending` or `dispute_closed` report whose `accept_expire_at` is at or before `now`, marking it
    /// auto-accepted. Returns the reports that changed.
    async fn auto_accept_expired(&self, now: DateTime<Utc>, actor: &Actor)
        -> Result<Vec<RoyaltyReport>, RoyaltyReportError>;
}
