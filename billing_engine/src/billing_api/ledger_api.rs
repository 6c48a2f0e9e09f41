use std::fmt::Debug;

use billing_common::Amount;
use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{AccountingEntry, EntrySource, EntryType, NewAccountingEntry, SOURCE_MERCHANT},
    traits::{ExchangeRates, LedgerError, LedgerManagement, MerchantRepository},
};

/// `LedgerApi` appends money movements to the accounting ledger and reads them back.
///
/// There is no way to change or remove an entry. A mistake is fixed by recording a correction that references the
/// entry it adjusts.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement + MerchantRepository + ExchangeRates
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Appends one entry.
    ///
    /// Amounts are magnitudes; the entry type decides the direction. Only corrections may be negative. The local
    /// amount is converted into the merchant's payout currency unless the caller already supplied it.
    pub async fn record_entry(&self, entry: NewAccountingEntry) -> Result<AccountingEntry, LedgerError> {
        if entry.amount.is_zero() {
            return Err(LedgerError::InvalidAmount(format!("{} entries cannot be zero", entry.entry_type)));
        }
        if !entry.entry_type.is_correction() && !entry.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "{} entries carry a magnitude, but {} was given",
                entry.entry_type, entry.amount
            )));
        }
        let entry = prepare_entry(&self.db, entry).await?;
        let entry = self.db.insert_entry(entry).await?;
        info!(
            "🧾️ {} of {} {} recorded for merchant {} (entry #{})",
            entry.entry_type, entry.amount, entry.currency, entry.merchant_id, entry.id
        );
        Ok(entry)
    }

    /// Records a signed adjustment against an existing entry. The correction belongs to the same merchant and is in
    /// the same currency as the original.
    pub async fn record_correction(
        &self,
        original_entry_id: i64,
        amount: Amount,
        reason: &str,
        available_on: Option<DateTime<Utc>>,
    ) -> Result<AccountingEntry, LedgerError> {
        let original =
            self.db.fetch_entry(original_entry_id).await?.ok_or(LedgerError::EntryNotFound(original_entry_id))?;
        let mut entry = NewAccountingEntry::new(
            EntryType::MerchantRoyaltyCorrection,
            EntrySource::entry(original.id),
            &original.merchant_id,
            amount,
            &original.currency,
        )
        .with_reason(reason)
        .with_country(&original.country);
        if let Some(at) = available_on {
            entry = entry.with_available_on(at);
        }
        self.record_entry(entry).await
    }

    /// Holds back (`release == false`) or releases part of a merchant's earnings.
    pub async fn record_rolling_reserve(
        &self,
        merchant_id: &str,
        amount: Amount,
        currency: &str,
        reason: &str,
        available_on: Option<DateTime<Utc>>,
        release: bool,
    ) -> Result<AccountingEntry, LedgerError> {
        let entry_type =
            if release { EntryType::MerchantRollingReserveRelease } else { EntryType::MerchantRollingReserveCreate };
        let source = EntrySource::new(merchant_id, SOURCE_MERCHANT);
        let mut entry = NewAccountingEntry::new(entry_type, source, merchant_id, amount, currency).with_reason(reason);
        if let Some(at) = available_on {
            entry = entry.with_available_on(at);
        }
        self.record_entry(entry).await
    }

    pub async fn fetch_entry(&self, id: i64) -> Result<Option<AccountingEntry>, LedgerError> {
        self.db.fetch_entry(id).await
    }

    pub async fn entries_for_merchant(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AccountingEntry>, LedgerError> {
        self.db.fetch_entries_for_merchant(merchant_id, from, to).await
    }

    pub async fn entries_for_source(&self, source: &EntrySource) -> Result<Vec<AccountingEntry>, LedgerError> {
        self.db.fetch_entries_for_source(source).await
    }
}

/// Fills in the original and local amounts of a new entry. The local currency is the merchant's payout currency.
pub(crate) async fn prepare_entry<B>(db: &B, mut entry: NewAccountingEntry) -> Result<NewAccountingEntry, LedgerError>
where B: MerchantRepository + ExchangeRates {
    let merchant =
        db.fetch_merchant(&entry.merchant_id).await?.ok_or_else(|| LedgerError::MerchantNotFound(entry.merchant_id.clone()))?;
    if entry.original_amount.is_none() {
        entry.original_amount = Some(entry.amount);
        entry.original_currency = Some(entry.currency.clone());
    }
    if entry.local_amount.is_none() {
        let local = db.convert(entry.amount, &entry.currency, &merchant.payout_currency).await?;
        trace!(
            "🧾️ {} {} is {local} {} for merchant {}",
            entry.amount,
            entry.currency,
            merchant.payout_currency,
            merchant.id
        );
        entry.local_amount = Some(local);
        entry.local_currency = Some(merchant.payout_currency);
    }
    Ok(entry)
}
