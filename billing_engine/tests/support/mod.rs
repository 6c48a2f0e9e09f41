#![allow(dead_code)]

use billing_common::Amount;
use billing_engine::{
    db_types::{Actor, BankingDetails, CompanyInfo, EntrySource, EntryType, Merchant, NewAccountingEntry, RoyaltyReport},
    events::EventProducers,
    test_utils::{prepare_test_env, random_db_path},
    LedgerApi,
    PayoutApi,
    RoyaltyReportApi,
    SqliteDatabase,
};
use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
}

impl TestSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Test database ready at {url}");
        Self { url, db }
    }

    pub async fn add_merchant(&self, id: &str, payout_currency: &str) -> Merchant {
        let banking = BankingDetails {
            account_holder: format!("Merchant {id}"),
            account_number: format!("DE00{id}"),
            bank_name: "Test Bank".into(),
            swift: "TESTDEFF".into(),
            country: "DE".into(),
        };
        let company = CompanyInfo {
            legal_name: format!("{id} GmbH"),
            address: "1 Test Street".into(),
            country: "DE".into(),
            tax_id: format!("TAX-{id}"),
        };
        let merchant = Merchant::new(id, &format!("Merchant {id}"), payout_currency)
            .with_banking(banking)
            .with_company(company);
        self.db.upsert_merchant(&merchant).await.expect("Error adding merchant")
    }

    pub fn ledger(&self) -> LedgerApi<SqliteDatabase> {
        LedgerApi::new(self.db.clone())
    }

    pub fn reports(&self, accept_grace: Duration) -> RoyaltyReportApi<SqliteDatabase> {
        RoyaltyReportApi::new(self.db.clone(), EventProducers::default(), accept_grace)
    }

    pub fn payouts(&self) -> PayoutApi<SqliteDatabase> {
        PayoutApi::new(self.db.clone(), EventProducers::default())
    }

    /// Records gross revenue of `amount` for the merchant inside the test week.
    pub async fn earn(&self, merchant_id: &str, source: &str, amount: i64, currency: &str) {
        self.record_on(EntryType::MerchantGrossRevenue, merchant_id, source, amount, currency, in_week()).await;
    }

    pub async fn record_on(
        &self,
        entry_type: EntryType,
        merchant_id: &str,
        source: &str,
        amount: i64,
        currency: &str,
        at: DateTime<Utc>,
    ) {
        let amount = Amount::from(amount);
        let entry = NewAccountingEntry::new(entry_type, EntrySource::order(source), merchant_id, amount, currency)
            .with_available_on(at);
        self.ledger().record_entry(entry).await.expect("Error recording entry");
    }

    /// Generates the merchant's report for the test week and accepts it.
    pub async fn accepted_report(&self, merchant_id: &str) -> RoyaltyReport {
        let (from, to) = week();
        self.accepted_report_for(merchant_id, from, to).await
    }

    pub async fn accepted_report_for(
        &self,
        merchant_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RoyaltyReport {
        let reports = self.reports(Duration::hours(1));
        let report = reports.generate(merchant_id, from, to, &operator()).await.expect("Error generating report");
        reports.accept(report.id, &operator()).await.expect("Error accepting report")
    }

    pub async fn teardown(self) {
        self.db.close().await;
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🚀️ Could not remove test database {}: {e}", self.url);
        }
    }
}

pub fn utc(s: &str) -> DateTime<Utc> {
    s.parse().expect("Invalid timestamp")
}

pub fn week() -> (DateTime<Utc>, DateTime<Utc>) {
    (utc("2026-01-05T00:00:00Z"), utc("2026-01-12T00:00:00Z"))
}

pub fn in_week() -> DateTime<Utc> {
    utc("2026-01-07T10:00:00Z")
}

pub fn operator() -> Actor {
    Actor::new("finance@example.com", "10.0.0.7")
}
