use thiserror::Error;

use crate::{db_types::Merchant, traits::ErrorKind};

#[derive(Debug, Clone, Error)]
pub enum MerchantError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl MerchantError {
    pub fn code(&self) -> &'static str {
        "database_error"
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Transport
    }
}

impl From<sqlx::Error> for MerchantError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Read-only access to merchant profiles. Profile management lives elsewhere.
#[allow(async_fn_in_trait)]
pub trait MerchantRepository {
    async fn fetch_merchant(&self, merchant_id: &str) -> Result<Option<Merchant>, MerchantError>;
}
