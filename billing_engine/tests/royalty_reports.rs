mod support;

use billing_common::Amount;
use billing_engine::{
    billing_api::{report_summary::UNASSIGNED_PRODUCT, AUTO_ACCEPT_ACTOR},
    db_types::{Actor, EntrySource, EntryType, NewAccountingEntry, NewOrder, ReportStatus},
    helpers::RoyaltyPeriod,
    traits::{PaymentFlowDatabase, RoyaltyReportError, RoyaltyReportManagement},
};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use crate::support::{in_week, operator, utc, week, TestSystem};

async fn seed_orders(sys: &TestSystem) {
    let method = sys.db.insert_payment_method("Mock", "mock", "", &json!([])).await.unwrap();
    for (order_id, product) in [("ord-a", "pro"), ("ord-b", "basic")] {
        let order = NewOrder::new(order_id, "m-1", Amount::from(1), "EUR", method.id).with_product(product);
        sys.db.insert_order(order).await.unwrap();
    }
}

async fn record(sys: &TestSystem, entry_type: EntryType, source: EntrySource, amount: i64, currency: &str) -> i64 {
    let entry =
        NewAccountingEntry::new(entry_type, source, "m-1", Amount::from(amount), currency).with_available_on(in_week());
    sys.ledger().record_entry(entry).await.unwrap().id
}

#[tokio::test]
async fn report_totals_reconcile_with_the_ledger() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    sys.db.set_exchange_rate("USD", "EUR", dec!(0.9)).await.unwrap();
    seed_orders(&sys).await;

    let gross_a = record(&sys, EntryType::MerchantGrossRevenue, EntrySource::order("ord-a"), 10_000, "EUR").await;
    record(&sys, EntryType::MerchantGrossRevenue, EntrySource::order("ord-b"), 5_000, "EUR").await;
    record(&sys, EntryType::MerchantTaxFee, EntrySource::order("ord-a"), 1_900, "EUR").await;
    record(&sys, EntryType::MerchantMethodFee, EntrySource::order("ord-a"), 250, "EUR").await;
    record(&sys, EntryType::MerchantRefund, EntrySource::order("ord-b"), 1_000, "EUR").await;
    record(&sys, EntryType::MerchantGrossRevenue, EntrySource::order("ord-c"), 2_000, "USD").await;
    sys.ledger().record_correction(gross_a, Amount::from(-200), "Fee adjustment", Some(in_week())).await.unwrap();
    sys.ledger()
        .record_rolling_reserve("m-1", Amount::from(500), "EUR", "Risk hold", Some(in_week()), false)
        .await
        .unwrap();
    // Next week's revenue stays out of this report
    let next_week = NewAccountingEntry::new(
        EntryType::MerchantGrossRevenue,
        EntrySource::order("ord-later"),
        "m-1",
        Amount::from(3_000),
        "EUR",
    )
    .with_available_on(utc("2026-01-12T00:00:00Z"));
    sys.ledger().record_entry(next_week).await.unwrap();

    let (from, to) = week();
    let report = sys.reports(Duration::hours(24)).generate("m-1", from, to, &operator()).await.unwrap();
    assert_eq!(report.status, ReportStatus::Pending);
    assert_eq!(report.currency, "EUR");
    assert!(report.accept_expire_at > Utc::now() + Duration::hours(23));

    let totals = &report.totals.0;
    assert_eq!(totals.transactions_count, 3);
    assert_eq!(totals.gross_amount, Amount::from(16_800));
    assert_eq!(totals.returns_amount, Amount::from(1_000));
    assert_eq!(totals.vat_amount, Amount::from(1_900));
    assert_eq!(totals.fee_amount, Amount::from(250));
    assert_eq!(totals.correction_amount, Amount::from(-200));
    assert_eq!(totals.rolling_reserve_amount, Amount::from(500));
    assert_eq!(totals.payout_amount, Amount::from(12_950));

    let summary = &report.summary.0;
    let products = summary.products.iter().map(|p| (p.product.as_str(), p.payout_amount.value())).collect::<Vec<_>>();
    assert_eq!(products, vec![("basic", 4_000), ("pro", 7_850), (UNASSIGNED_PRODUCT, 1_800)]);
    assert_eq!(summary.total.payout_amount, Amount::from(13_650));
    assert_eq!(summary.corrections.len(), 1);
    assert_eq!(summary.corrections[0].amount, Amount::from(-200));
    assert_eq!(summary.corrections[0].reason, "Fee adjustment");
    assert_eq!(summary.rolling_reserves.len(), 1);
    assert_eq!(summary.rolling_reserves[0].amount, Amount::from(-500));
    sys.teardown().await;
}

#[tokio::test]
async fn one_report_per_merchant_and_period() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    sys.earn("m-1", "ord-1", 1_000, "EUR").await;
    let reports = sys.reports(Duration::hours(1));
    let (from, to) = week();

    let first = reports.generate("m-1", from, to, &operator()).await.unwrap();
    let err = reports.generate("m-1", from, to, &operator()).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::ReportAlreadyExists { .. }));
    assert_eq!(err.code(), "report_already_exists");
    assert_eq!(reports.reports_for_merchant("m-1").await.unwrap(), vec![first]);

    let err = reports.generate("m-1", to, from, &operator()).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::InvalidPeriod(_)));
    let err = reports.generate("nobody", from, to, &operator()).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::MerchantNotFound(_)));
    sys.teardown().await;
}

#[tokio::test]
async fn generating_a_period_covers_every_active_merchant() {
    let sys = TestSystem::new().await;
    for id in ["m-1", "m-2", "m-idle"] {
        sys.add_merchant(id, "EUR").await;
    }
    sys.earn("m-1", "ord-1", 1_000, "EUR").await;
    sys.earn("m-2", "ord-2", 2_000, "EUR").await;
    let period = RoyaltyPeriod::previous_week(utc("2026-01-14T09:00:00Z"));
    let reports =
        sys.reports(Duration::hours(1)).generate_for_period(period, &Actor::system("weekly_reports")).await.unwrap();
    let merchants = reports.iter().map(|r| r.merchant_id.as_str()).collect::<Vec<_>>();
    assert_eq!(merchants, vec!["m-1", "m-2"]);
    assert_eq!(reports[1].totals.payout_amount, Amount::from(2_000));
    sys.teardown().await;
}

#[tokio::test]
async fn dispute_workflow() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    sys.earn("m-1", "ord-1", 1_000, "EUR").await;
    let reports = sys.reports(Duration::hours(1));
    let (from, to) = week();
    let report = reports.generate("m-1", from, to, &operator()).await.unwrap();
    let merchant = Actor::new("merchant:m-1", "192.0.2.10");

    let disputed = reports.dispute(report.id, "Missing refund", &merchant).await.unwrap();
    assert_eq!(disputed.status, ReportStatus::Dispute);
    assert_eq!(disputed.dispute_reason.as_deref(), Some("Missing refund"));
    assert!(disputed.dispute_started_at.is_some());

    let err = reports.accept(report.id, &merchant).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::InvalidTransition { status: ReportStatus::Dispute, .. }));
    let err = reports.dispute(report.id, "Again", &merchant).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::InvalidTransition { .. }));

    // A disputed report is invisible to the sweep, however late it is
    let swept = sys.db.auto_accept_expired(Utc::now() + Duration::days(30), &Actor::system(AUTO_ACCEPT_ACTOR)).await;
    assert!(swept.unwrap().is_empty());

    let closed = reports.close_dispute(report.id, &operator()).await.unwrap();
    assert_eq!(closed.status, ReportStatus::DisputeClosed);
    assert!(closed.dispute_closed_at.is_some());
    assert!(closed.accept_expire_at > Utc::now() + Duration::minutes(59));
    let err = reports.close_dispute(report.id, &operator()).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::InvalidTransition { status: ReportStatus::DisputeClosed, .. }));

    let accepted = reports.accept(report.id, &merchant).await.unwrap();
    assert_eq!(accepted.status, ReportStatus::Accepted);
    assert!(!accepted.is_auto_accepted);
    assert!(accepted.accepted_at.is_some());
    // Accepting again is a no-op
    let again = reports.accept(report.id, &merchant).await.unwrap();
    assert_eq!(again, accepted);

    let changes = reports.changes_for_report(report.id).await.unwrap();
    let sources = changes.iter().map(|c| c.source.as_str()).collect::<Vec<_>>();
    assert_eq!(sources, vec!["finance@example.com", "merchant:m-1", "finance@example.com", "merchant:m-1"]);
    assert_eq!(changes[1].ip, "192.0.2.10");
    assert!(changes.iter().all(|c| c.hash.len() == 64));
    assert_ne!(changes[0].hash, changes[3].hash);

    let err = reports.accept(9_999, &merchant).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::ReportNotFound(9_999)));
    sys.teardown().await;
}

#[tokio::test]
async fn expired_reports_are_auto_accepted() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-late", "EUR").await;
    sys.add_merchant("m-fresh", "EUR").await;
    sys.earn("m-late", "ord-1", 1_000, "EUR").await;
    sys.earn("m-fresh", "ord-2", 1_000, "EUR").await;
    let (from, to) = week();

    let expiring = sys.reports(Duration::zero());
    let late = expiring.generate("m-late", from, to, &operator()).await.unwrap();
    let fresh = sys.reports(Duration::hours(1)).generate("m-fresh", from, to, &operator()).await.unwrap();

    let err = expiring.accept(late.id, &operator()).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::AcceptWindowExpired(id) if id == late.id));
    let err = expiring.dispute(late.id, "Too late", &operator()).await.unwrap_err();
    assert!(matches!(err, RoyaltyReportError::AcceptWindowExpired(_)));

    let swept = expiring.auto_accept_sweep().await.unwrap();
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].id, late.id);
    assert_eq!(swept[0].status, ReportStatus::Accepted);
    assert!(swept[0].is_auto_accepted);

    let fresh = expiring.fetch_report(fresh.id).await.unwrap().unwrap();
    assert_eq!(fresh.status, ReportStatus::Pending);
    assert!(expiring.auto_accept_sweep().await.unwrap().is_empty());

    let changes = expiring.changes_for_report(late.id).await.unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].source, format!("system:{AUTO_ACCEPT_ACTOR}"));
    sys.teardown().await;
}
