use billing_engine::{
    db_types::{Actor, RoyaltyReport},
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    LedgerApi,
    PayoutApi,
    RoyaltyReportApi,
    SqliteDatabase,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct BillingWorld {
    pub system: Option<BillingSystem>,
    /// The error code of the last step that was allowed to fail.
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct BillingSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub reports: RoyaltyReportApi<SqliteDatabase>,
    pub payouts: PayoutApi<SqliteDatabase>,
}

impl BillingWorld {
    pub fn system(&self) -> &BillingSystem {
        self.system.as_ref().expect("Billing system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut BillingSystem {
        self.system.as_mut().expect("Billing system not initialised")
    }

    pub async fn report_for_week(&self, merchant_id: &str, week: &str) -> RoyaltyReport {
        let (from, _) = week_of(week);
        let reports = self.system().reports.reports_for_merchant(merchant_id).await.expect("Error fetching reports");
        reports
            .into_iter()
            .find(|r| r.period_from == from)
            .unwrap_or_else(|| panic!("Merchant {merchant_id} has no report for the week of {week}"))
    }
}

impl BillingSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let ledger = LedgerApi::new(db.clone());
        let reports = RoyaltyReportApi::new(db.clone(), EventProducers::default(), Duration::hours(24));
        let payouts = PayoutApi::new(db.clone(), EventProducers::default());
        Self { db_path: url, db, ledger, reports, payouts }
    }

    pub fn set_accept_grace(&mut self, grace: Duration) {
        self.reports = RoyaltyReportApi::new(self.db.clone(), EventProducers::default(), grace);
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}

/// The Monday-to-Monday window starting on `date` (YYYY-MM-DD).
pub fn week_of(date: &str) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("Invalid date");
    let from = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).expect("Invalid time"));
    (from, from + Duration::days(7))
}

pub fn operator() -> Actor {
    Actor::new("operator", "127.0.0.1")
}

pub fn merchant_actor(merchant_id: &str) -> Actor {
    Actor::new(&format!("merchant:{merchant_id}"), "127.0.0.1")
}
