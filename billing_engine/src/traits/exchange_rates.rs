use billing_common::Amount;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::traits::ErrorKind;

#[derive(Debug, Clone, Error)]
pub enum ExchangeRateError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No exchange rate is known for {from} to {to}")]
    RateDoesNotExist { from: String, to: String },
    #[error("The converted amount cannot be represented: {0}")]
    ConversionOverflow(String),
}

impl ExchangeRateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::RateDoesNotExist { .. } => "rate_does_not_exist",
            Self::ConversionOverflow(_) => "conversion_overflow",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Transport,
            _ => ErrorKind::Validation,
        }
    }
}

impl From<sqlx::Error> for ExchangeRateError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Read-only access to the currency exchange service.
#[allow(async_fn_in_trait)]
pub trait ExchangeRates {
    /// The number of `to` units one `from` unit buys.
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, ExchangeRateError>;

    /// Converts `amount` from one currency to another, rounding half away from zero to the minor unit. Converting to
    /// the same currency is the identity and never consults the rate store.
    async fn convert(&self, amount: Amount, from: &str, to: &str) -> Result<Amount, ExchangeRateError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(amount);
        }
        let rate = self.fetch_rate(from, to).await?;
        let converted = amount
            .to_decimal()
            .checked_mul(rate)
            .ok_or_else(|| ExchangeRateError::ConversionOverflow(format!("{amount} {from} at {rate}")))?;
        Amount::try_from(converted).map_err(|e| ExchangeRateError::ConversionOverflow(e.to_string()))
    }
}
