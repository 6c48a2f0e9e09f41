use thiserror::Error;

use crate::traits::ErrorKind;

#[derive(Debug, Clone, Error)]
pub enum SequenceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A sequence needs a collection name")]
    EmptyCollectionName,
}

impl SequenceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::EmptyCollectionName => "empty_collection_name",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Transport,
            Self::EmptyCollectionName => ErrorKind::Validation,
        }
    }
}

impl From<sqlx::Error> for SequenceError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait SequenceManagement {
    /// Atomically increments the counter for `collection` and returns the new value. The first value of a collection
    /// is 1.
    async fn next_value(&self, collection: &str) -> Result<i64, SequenceError>;

    /// The last value handed out for `collection`, if any.
    async fn current_value(&self, collection: &str) -> Result<Option<i64>, SequenceError>;
}
