use billing_common::Amount;
use thiserror::Error;

use crate::{
    db_types::{Actor, ChangeRecord, Merchant, PayoutDocument, PayoutStatus, PayoutTransition},
    traits::{ErrorKind, MerchantError, SequenceError},
};

#[derive(Debug, Clone, Error)]
pub enum PayoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Merchant {0} does not exist")]
    MerchantNotFound(String),
    #[error("The accepted royalty reports of merchant {merchant_id} span several currencies: {currencies}")]
    BalanceHasMoreOneCurrency { merchant_id: String, currencies: String },
    #[error("Merchant {0} has no accepted royalty reports awaiting payout")]
    NoReportsToPayout(String),
    #[error("The payout balance for merchant {merchant_id} is {balance}, which is not positive")]
    PayoutAmountNotPositive { merchant_id: String, balance: Amount },
    #[error("Royalty report {0} was claimed by another payout document")]
    ReportAlreadyClaimed(i64),
    #[error("Payout document {0} does not exist")]
    PayoutNotFound(i64),
    #[error("Payout document {id} cannot move from {status} to {target}")]
    InvalidTransition { id: i64, status: PayoutStatus, target: PayoutStatus },
    #[error("Could not number the payout document. {0}")]
    Sequence(#[from] SequenceError),
}

impl PayoutError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::MerchantNotFound(_) => "merchant_not_found",
            Self::BalanceHasMoreOneCurrency { .. } => "balance_has_more_one_currency",
            Self::NoReportsToPayout(_) => "no_reports_to_payout",
            Self::PayoutAmountNotPositive { .. } => "payout_amount_not_positive",
            Self::ReportAlreadyClaimed(_) => "report_already_claimed",
            Self::PayoutNotFound(_) => "payout_not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Sequence(e) => e.code(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Transport,
            Self::BalanceHasMoreOneCurrency { .. } | Self::ReportAlreadyClaimed(_) => ErrorKind::Consistency,
            Self::Sequence(e) => e.kind(),
            _ => ErrorKind::Validation,
        }
    }
}

impl From<sqlx::Error> for PayoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<MerchantError> for PayoutError {
    fn from(e: MerchantError) -> Self {
        match e {
            MerchantError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait PayoutManagement {
    /// In one transaction: takes the next number from the `sequence` collection, selects the merchant's accepted and
    /// unclaimed reports, checks they share one currency and add up to a positive balance, claims each of them with a
    /// conditional update, and stores the document with a snapshot of the merchant's banking and company details.
    ///
    /// Any failure rolls back everything, including the sequence number.
    async fn create_payout_document(
        &self,
        merchant: &Merchant,
        sequence: &str,
        actor: &Actor,
    ) -> Result<PayoutDocument, PayoutError>;

    /// Applies a status change if the document is in one of the transition's allowed prior states. Returns `None`
    /// otherwise. A transition to `paid` also stamps the payout date on every linked report.
    async fn transition_payout(
        &self,
        id: i64,
        transition: &PayoutTransition,
        actor: &Actor,
    ) -> Result<Option<PayoutDocument>, PayoutError>;

    async fn fetch_payout(&self, id: i64) -> Result<Option<PayoutDocument>, PayoutError>;

    async fn fetch_payouts_for_merchant(&self, merchant_id: &str) -> Result<Vec<PayoutDocument>, PayoutError>;

    async fn fetch_payout_changes(&self, id: i64) -> Result<Vec<ChangeRecord>, PayoutError>;
}
