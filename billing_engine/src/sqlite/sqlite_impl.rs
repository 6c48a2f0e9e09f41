//! `SqliteDatabase` is a concrete implementation of a billing engine backend.
//!
//! It uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module. Every write,
//! including single `INSERT ... RETURNING` statements, runs in a transaction that is committed before the method
//! returns, so the change is visible to every other connection in the pool. Multi-statement transactions start with a
//! write, so that concurrent writers queue on SQLite's write lock (bounded by the pool's busy timeout) instead of
//! failing on a lock upgrade.
use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use payment_gateways::{GatewayOrder, GatewayRefund, RecurringSubscription};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use super::db::{
    changes::{self, ChangeLog},
    exchange_rates,
    ledger,
    merchants,
    new_pool,
    orders,
    payment_methods,
    payouts,
    refunds,
    royalty_reports,
    sequence,
    subscriptions,
};
use crate::{
    config::BillingConfig,
    db_types::{
        AccountingEntry,
        Actor,
        ChangeRecord,
        EntrySource,
        LedgerLine,
        Merchant,
        NewAccountingEntry,
        NewOrder,
        NewPayoutDocument,
        NewRefund,
        NewRoyaltyReport,
        Order,
        PaymentMethodRecord,
        PayoutDocument,
        PayoutDraftError,
        PayoutTransition,
        Refund,
        RoyaltyReport,
        Subscription,
    },
    helpers::state_hash,
    traits::{
        errors::is_unique_violation,
        ExchangeRateError,
        ExchangeRates,
        LedgerError,
        LedgerManagement,
        MerchantError,
        MerchantRepository,
        PaymentFlowDatabase,
        PaymentFlowDatabaseError,
        PayoutError,
        PayoutManagement,
        RoyaltyReportError,
        RoyaltyReportManagement,
        SequenceError,
        SequenceManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object from the given configuration.
    pub async fn new(config: &BillingConfig) -> Result<Self, sqlx::Error> {
        Self::new_with_options(&config.database_url, config.max_connections, config.acquire_timeout).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        Self::new_with_options(url, max_connections, BillingConfig::default().acquire_timeout).await
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections, acquire_timeout).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Stores or replaces a merchant profile. Profiles are owned by another service; this exists to seed development
    /// and test databases.
    pub async fn upsert_merchant(&self, merchant: &Merchant) -> Result<Merchant, MerchantError> {
        let mut tx = self.pool.begin().await?;
        let merchant = merchants::upsert_merchant(merchant, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Merchant {} saved", merchant.id);
        Ok(merchant)
    }

    /// Stores the rate for one unit of `base` in `quote`.
    pub async fn set_exchange_rate(&self, base: &str, quote: &str, rate: Decimal) -> Result<(), ExchangeRateError> {
        let mut tx = self.pool.begin().await?;
        exchange_rates::set_rate(base, quote, rate, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl MerchantRepository for SqliteDatabase {
    async fn fetch_merchant(&self, merchant_id: &str) -> Result<Option<Merchant>, MerchantError> {
        let mut conn = self.pool.acquire().await?;
        let merchant = merchants::fetch_merchant(merchant_id, &mut conn).await?;
        Ok(merchant)
    }
}

impl ExchangeRates for SqliteDatabase {
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, ExchangeRateError> {
        let mut conn = self.pool.acquire().await?;
        exchange_rates::fetch_rate(from, to, &mut conn)
            .await?
            .ok_or_else(|| ExchangeRateError::RateDoesNotExist { from: from.to_string(), to: to.to_string() })
    }
}

impl SequenceManagement for SqliteDatabase {
    async fn next_value(&self, collection: &str) -> Result<i64, SequenceError> {
        if collection.is_empty() {
            return Err(SequenceError::EmptyCollectionName);
        }
        let mut tx = self.pool.begin().await?;
        let value = sequence::next_value(collection, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(value)
    }

    async fn current_value(&self, collection: &str) -> Result<Option<i64>, SequenceError> {
        if collection.is_empty() {
            return Err(SequenceError::EmptyCollectionName);
        }
        let mut conn = self.pool.acquire().await?;
        let record = sequence::fetch_sequence(collection, &mut conn).await?;
        Ok(record.map(|r| r.counter))
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn insert_entry(&self, entry: NewAccountingEntry) -> Result<AccountingEntry, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let entry = ledger::insert_entry(entry, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn fetch_entry(&self, id: i64) -> Result<Option<AccountingEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entry = ledger::fetch_entry(id, &mut conn).await?;
        Ok(entry)
    }

    async fn fetch_entries_for_merchant(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AccountingEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entries = ledger::fetch_entries_for_merchant(merchant_id, from, to, &mut conn).await?;
        Ok(entries)
    }

    async fn fetch_entries_for_source(&self, source: &EntrySource) -> Result<Vec<AccountingEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let entries = ledger::fetch_entries_for_source(source, &mut conn).await?;
        Ok(entries)
    }

    async fn fetch_merchants_with_entries(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<String>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let merchants = ledger::fetch_merchants_with_entries(from, to, &mut conn).await?;
        Ok(merchants)
    }
}

impl RoyaltyReportManagement for SqliteDatabase {
    async fn fetch_ledger_lines(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LedgerLine>, RoyaltyReportError> {
        let mut conn = self.pool.acquire().await?;
        let lines = ledger::fetch_ledger_lines(merchant_id, from, to, &mut conn).await?;
        Ok(lines)
    }

    async fn insert_report(&self, report: NewRoyaltyReport, actor: &Actor) -> Result<RoyaltyReport, RoyaltyReportError> {
        let now = Utc::now();
        let merchant_id = report.merchant_id.clone();
        let (period_from, period_to) = (report.period_from, report.period_to);
        let mut tx = self.pool.begin().await?;
        let report = match royalty_reports::insert_report(report, now, &mut tx).await {
            Ok(r) => r,
            Err(e) if is_unique_violation(&e) => {
                return Err(RoyaltyReportError::ReportAlreadyExists { merchant_id, period_from, period_to });
            },
            Err(e) => return Err(e.into()),
        };
        changes::record_change(ChangeLog::RoyaltyReport, report.id, actor, &state_hash(&report), now, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Royalty report #{} stored for merchant {}", report.id, report.merchant_id);
        Ok(report)
    }

    async fn fetch_report(&self, id: i64) -> Result<Option<RoyaltyReport>, RoyaltyReportError> {
        let mut conn = self.pool.acquire().await?;
        let report = royalty_reports::fetch_report(id, &mut conn).await?;
        Ok(report)
    }

    async fn fetch_reports_for_merchant(&self, merchant_id: &str) -> Result<Vec<RoyaltyReport>, RoyaltyReportError> {
        let mut conn = self.pool.acquire().await?;
        let reports = royalty_reports::fetch_reports_for_merchant(merchant_id, &mut conn).await?;
        Ok(reports)
    }

    async fn fetch_report_changes(&self, id: i64) -> Result<Vec<ChangeRecord>, RoyaltyReportError> {
        let mut conn = self.pool.acquire().await?;
        let changes = changes::fetch_changes(ChangeLog::RoyaltyReport, id, &mut conn).await?;
        Ok(changes)
    }

    async fn accept_report(
        &self,
        id: i64,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Option<RoyaltyReport>, RoyaltyReportError> {
        let mut tx = self.pool.begin().await?;
        let report = royalty_reports::accept(id, now, &mut tx).await?;
        if let Some(report) = &report {
            changes::record_change(ChangeLog::RoyaltyReport, id, actor, &state_hash(report), now, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(report)
    }

    async fn dispute_report(
        &self,
        id: i64,
        reason: &str,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Option<RoyaltyReport>, RoyaltyReportError> {
        let mut tx = self.pool.begin().await?;
        let report = royalty_reports::dispute(id, reason, now, &mut tx).await?;
        if let Some(report) = &report {
            changes::record_change(ChangeLog::RoyaltyReport, id, actor, &state_hash(report), now, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(report)
    }

    async fn close_dispute(
        &self,
        id: i64,
        accept_expire_at: DateTime<Utc>,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Option<RoyaltyReport>, RoyaltyReportError> {
        let mut tx = self.pool.begin().await?;
        let report = royalty_reports::close_dispute(id, accept_expire_at, now, &mut tx).await?;
        if let Some(report) = &report {
            changes::record_change(ChangeLog::RoyaltyReport, id, actor, &state_hash(report), now, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(report)
    }

    async fn auto_accept_expired(
        &self,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<Vec<RoyaltyReport>, RoyaltyReportError> {
        let mut tx = self.pool.begin().await?;
        let reports = royalty_reports::auto_accept(now, &mut tx).await?;
        for report in &reports {
            changes::record_change(ChangeLog::RoyaltyReport, report.id, actor, &state_hash(report), now, &mut tx)
                .await?;
        }
        tx.commit().await?;
        Ok(reports)
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn create_payout_document(
        &self,
        merchant: &Merchant,
        sequence: &str,
        actor: &Actor,
    ) -> Result<PayoutDocument, PayoutError> {
        if sequence.is_empty() {
            return Err(SequenceError::EmptyCollectionName.into());
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let autoincrement_id =
            sequence::next_value(sequence, now, &mut tx).await.map_err(|e| PayoutError::Sequence(e.into()))?;
        let reports = royalty_reports::fetch_claimable(&merchant.id, &mut tx).await?;
        let draft = NewPayoutDocument::from_reports(merchant, &reports).map_err(|e| match e {
            PayoutDraftError::NoReports => PayoutError::NoReportsToPayout(merchant.id.clone()),
            PayoutDraftError::MixedCurrencies(currencies) => {
                error!("💸️ Merchant {} has accepted reports in several currencies: {currencies:?}", merchant.id);
                PayoutError::BalanceHasMoreOneCurrency {
                    merchant_id: merchant.id.clone(),
                    currencies: currencies.join(", "),
                }
            },
            PayoutDraftError::NotPositive(balance) => {
                PayoutError::PayoutAmountNotPositive { merchant_id: merchant.id.clone(), balance }
            },
        })?;
        let payout = payouts::insert_payout(&draft, autoincrement_id, now, &mut tx).await?;
        changes::record_change(ChangeLog::PayoutDocument, payout.id, actor, &state_hash(&payout), now, &mut tx).await?;
        for report_id in &draft.source_ids {
            let claimed = royalty_reports::claim(*report_id, payout.id, now, &mut tx).await?;
            let Some(report) = claimed else {
                error!("💸️ Royalty report #{report_id} was claimed by another payout. Rolling back payout creation.");
                return Err(PayoutError::ReportAlreadyClaimed(*report_id));
            };
            changes::record_change(ChangeLog::RoyaltyReport, report.id, actor, &state_hash(&report), now, &mut tx)
                .await?;
        }
        tx.commit().await?;
        info!(
            "💸️ Payout document #{} (number {}) created for merchant {}: {} {} from {} reports",
            payout.id,
            payout.autoincrement_id,
            payout.merchant_id,
            payout.balance,
            payout.currency,
            draft.source_ids.len()
        );
        Ok(payout)
    }

    async fn transition_payout(
        &self,
        id: i64,
        transition: &PayoutTransition,
        actor: &Actor,
    ) -> Result<Option<PayoutDocument>, PayoutError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let Some(payout) = payouts::transition(id, transition, now, &mut tx).await? else {
            return Ok(None);
        };
        changes::record_change(ChangeLog::PayoutDocument, id, actor, &state_hash(&payout), now, &mut tx).await?;
        if matches!(transition, PayoutTransition::Paid { .. }) {
            let reports = royalty_reports::stamp_payout_date(id, now, &mut tx).await?;
            for report in &reports {
                changes::record_change(ChangeLog::RoyaltyReport, report.id, actor, &state_hash(report), now, &mut tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(Some(payout))
    }

    async fn fetch_payout(&self, id: i64) -> Result<Option<PayoutDocument>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let payout = payouts::fetch_payout(id, &mut conn).await?;
        Ok(payout)
    }

    async fn fetch_payouts_for_merchant(&self, merchant_id: &str) -> Result<Vec<PayoutDocument>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let payouts = payouts::fetch_payouts_for_merchant(merchant_id, &mut conn).await?;
        Ok(payouts)
    }

    async fn fetch_payout_changes(&self, id: i64) -> Result<Vec<ChangeRecord>, PayoutError> {
        let mut conn = self.pool.acquire().await?;
        let changes = changes::fetch_changes(ChangeLog::PayoutDocument, id, &mut conn).await?;
        Ok(changes)
    }
}

impl PaymentFlowDatabase for SqliteDatabase {
    async fn insert_payment_method(
        &self,
        name: &str,
        handler: &str,
        external_id: &str,
        params: &serde_json::Value,
    ) -> Result<PaymentMethodRecord, PaymentFlowDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let method = payment_methods::insert_payment_method(name, handler, external_id, params, &mut tx).await?;
        tx.commit().await?;
        Ok(method)
    }

    async fn fetch_payment_method(&self, id: i64) -> Result<Option<PaymentMethodRecord>, PaymentFlowDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let method = payment_methods::fetch_payment_method(id, &mut conn).await?;
        Ok(method)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentFlowDatabaseError> {
        let order_id = order.order_id.clone();
        let mut tx = self.pool.begin().await?;
        let order = match orders::insert_order(order, Utc::now(), &mut tx).await {
            Ok(order) => order,
            Err(e) if is_unique_violation(&e) => return Err(PaymentFlowDatabaseError::OrderAlreadyExists(order_id)),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>, PaymentFlowDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn update_order_progress(&self, order: &GatewayOrder) -> Result<bool, PaymentFlowDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_order(order, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(updated.is_some())
    }

    async fn settle_order(
        &self,
        order: &GatewayOrder,
        entry: Option<NewAccountingEntry>,
    ) -> Result<bool, PaymentFlowDatabaseError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        if orders::update_order(order, now, &mut tx).await?.is_none() {
            debug!("🗃️ Order {} is already settled. Nothing to do.", order.order_id);
            return Ok(false);
        }
        if let Some(entry) = entry {
            ledger::insert_entry(entry, now, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} settled as {}", order.order_id, order.status);
        Ok(true)
    }

    async fn insert_refund(&self, refund: NewRefund) -> Result<Refund, PaymentFlowDatabaseError> {
        let refund_id = refund.refund_id.clone();
        let mut tx = self.pool.begin().await?;
        let refund = match refunds::insert_refund(refund, Utc::now(), &mut tx).await {
            Ok(refund) => refund,
            Err(e) if is_unique_violation(&e) => return Err(PaymentFlowDatabaseError::RefundAlreadyExists(refund_id)),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(refund)
    }

    async fn fetch_refund(&self, refund_id: &str) -> Result<Option<Refund>, PaymentFlowDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let refund = refunds::fetch_refund(refund_id, &mut conn).await?;
        Ok(refund)
    }

    async fn fetch_refunds_for_order(&self, order_id: &str) -> Result<Vec<Refund>, PaymentFlowDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let refunds = refunds::fetch_refunds_for_order(order_id, &mut conn).await?;
        Ok(refunds)
    }

    async fn update_refund_progress(&self, refund: &GatewayRefund) -> Result<bool, PaymentFlowDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let updated = refunds::update_refund(refund, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(updated.is_some())
    }

    async fn settle_refund(
        &self,
        refund: &GatewayRefund,
        order: Option<&GatewayOrder>,
        entry: Option<NewAccountingEntry>,
    ) -> Result<bool, PaymentFlowDatabaseError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        if refunds::update_refund(refund, now, &mut tx).await?.is_none() {
            debug!("🗃️ Refund {} is already settled. Nothing to do.", refund.refund_id);
            return Ok(false);
        }
        if let Some(order) = order {
            match orders::mark_refunded(&order.order_id, now, &mut tx).await? {
                Some(_) => debug!("🗃️ Order {} is fully refunded", order.order_id),
                None => debug!("🗃️ Order {} is partially refunded and stays paid", order.order_id),
            }
        }
        if let Some(entry) = entry {
            ledger::insert_entry(entry, now, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn insert_subscription(
        &self,
        order_id: &str,
        subscription: &RecurringSubscription,
    ) -> Result<Subscription, PaymentFlowDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let sub = match subscriptions::insert_subscription(order_id, subscription, Utc::now(), &mut tx).await {
            Ok(sub) => sub,
            Err(e) if is_unique_violation(&e) => {
                return Err(PaymentFlowDatabaseError::SubscriptionAlreadyExists(order_id.to_string()));
            },
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(sub)
    }

    async fn fetch_subscription(&self, order_id: &str) -> Result<Option<Subscription>, PaymentFlowDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let sub = subscriptions::fetch_subscription(order_id, &mut conn).await?;
        Ok(sub)
    }

    async fn update_subscription(
        &self,
        order_id: &str,
        subscription: &RecurringSubscription,
    ) -> Result<Subscription, PaymentFlowDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let sub = subscriptions::update_subscription(order_id, subscription, Utc::now(), &mut tx)
            .await?
            .ok_or_else(|| PaymentFlowDatabaseError::SubscriptionNotFound(order_id.to_string()))?;
        tx.commit().await?;
        Ok(sub)
    }
}
