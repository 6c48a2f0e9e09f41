use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Actor, ChangeRecord, PayoutDocument, PayoutTransition},
    events::{EventProducers, PayoutCreatedEvent, PayoutStatusChangedEvent},
    traits::{MerchantRepository, PayoutError, PayoutManagement},
};

/// The sequence collection that numbers payout documents.
pub const PAYOUT_SEQUENCE: &str = "payout_document";

/// `PayoutApi` turns a merchant's accepted royalty reports into a numbered payout document and tracks the bank
/// transfer that settles it.
pub struct PayoutApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PayoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutApi")
    }
}

impl<B> PayoutApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> PayoutApi<B>
where B: PayoutManagement + MerchantRepository
{
    /// Aggregates every accepted, unclaimed royalty report of the merchant into a new payout document.
    ///
    /// The reports must share one currency ([`PayoutError::BalanceHasMoreOneCurrency`] otherwise) and add up to a
    /// positive balance. The merchant's current banking and company details are copied onto the document. Nothing is
    /// written unless every step succeeds.
    pub async fn create_payout_document(&self, merchant_id: &str, actor: &Actor) -> Result<PayoutDocument, PayoutError> {
        let merchant = self
            .db
            .fetch_merchant(merchant_id)
            .await?
            .ok_or_else(|| PayoutError::MerchantNotFound(merchant_id.to_string()))?;
        let payout = self.db.create_payout_document(&merchant, PAYOUT_SEQUENCE, actor).await?;
        self.producers.payout_created(PayoutCreatedEvent::new(payout.clone())).await;
        Ok(payout)
    }

    /// `pending → in_progress`, once the bank transfer has been initiated.
    pub async fn mark_in_progress(
        &self,
        payout_id: i64,
        transaction_id: &str,
        actor: &Actor,
    ) -> Result<PayoutDocument, PayoutError> {
        let transition = PayoutTransition::InProgress { transaction_id: transaction_id.to_string() };
        self.apply(payout_id, transition, actor).await
    }

    /// `in_progress → paid`. The payout date is stamped on every report the document covers.
    pub async fn mark_paid(
        &self,
        payout_id: i64,
        transaction_id: &str,
        arrival_date: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<PayoutDocument, PayoutError> {
        let transition = PayoutTransition::Paid { transaction_id: transaction_id.to_string(), arrival_date };
        self.apply(payout_id, transition, actor).await
    }

    /// `in_progress → failed`. The reports stay linked to the failed document.
    pub async fn mark_failed(
        &self,
        payout_id: i64,
        code: &str,
        message: &str,
        failure_transaction: Option<&str>,
        actor: &Actor,
    ) -> Result<PayoutDocument, PayoutError> {
        let transition = PayoutTransition::Failed {
            code: code.to_string(),
            message: message.to_string(),
            failure_transaction: failure_transaction.map(String::from),
        };
        self.apply(payout_id, transition, actor).await
    }

    pub async fn fetch_payout(&self, payout_id: i64) -> Result<Option<PayoutDocument>, PayoutError> {
        self.db.fetch_payout(payout_id).await
    }

    pub async fn payouts_for_merchant(&self, merchant_id: &str) -> Result<Vec<PayoutDocument>, PayoutError> {
        self.db.fetch_payouts_for_merchant(merchant_id).await
    }

    pub async fn changes_for_payout(&self, payout_id: i64) -> Result<Vec<ChangeRecord>, PayoutError> {
        self.db.fetch_payout_changes(payout_id).await
    }

    async fn apply(
        &self,
        payout_id: i64,
        transition: PayoutTransition,
        actor: &Actor,
    ) -> Result<PayoutDocument, PayoutError> {
        let current = self.db.fetch_payout(payout_id).await?.ok_or(PayoutError::PayoutNotFound(payout_id))?;
        let target = transition.target();
        match self.db.transition_payout(payout_id, &transition, actor).await? {
            Some(payout) => {
                info!("💸️ Payout document #{payout_id} moved from {} to {target}", current.status);
                let event = PayoutStatusChangedEvent::new(current.status, payout.clone());
                self.producers.payout_status_changed(event).await;
                Ok(payout)
            },
            None => {
                // Re-read: the status may have moved since `current` was fetched.
                let status = self.db.fetch_payout(payout_id).await?.map(|p| p.status).unwrap_or(current.status);
                warn!("💸️ Payout document #{payout_id} cannot move from {status} to {target}");
                Err(PayoutError::InvalidTransition { id: payout_id, status, target })
            },
        }
    }
}
