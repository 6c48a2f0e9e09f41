use std::fmt::Debug;

use log::*;

use crate::traits::{SequenceError, SequenceManagement};

/// Hands out human-facing sequence numbers, one independent counter per collection name.
pub struct SequenceApi<B> {
    db: B,
}

impl<B> Debug for SequenceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SequenceApi")
    }
}

impl<B> SequenceApi<B>
where B: SequenceManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The next number in `collection`. Concurrent callers always receive distinct, increasing values.
    pub async fn next(&self, collection: &str) -> Result<i64, SequenceError> {
        let value = self.db.next_value(collection).await?;
        debug!("🔢️ Issued {collection} #{value}");
        Ok(value)
    }

    pub async fn current(&self, collection: &str) -> Result<Option<i64>, SequenceError> {
        self.db.current_value(collection).await
    }
}
