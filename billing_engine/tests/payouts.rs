mod support;

use billing_common::Amount;
use billing_engine::{
    billing_api::PAYOUT_SEQUENCE,
    db_types::{BankingDetails, EntryType, Merchant, PayoutStatus},
    traits::{ErrorKind, MerchantRepository, PayoutError},
    SequenceApi,
};
use chrono::Duration;
use futures_util::future::join_all;

use crate::support::{in_week, operator, utc, TestSystem};

#[tokio::test]
async fn accepted_reports_become_one_payout_document() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    sys.earn("m-1", "ord-1", 4_000, "EUR").await;
    sys.earn("m-1", "ord-2", 6_000, "EUR").await;
    let week_two = (utc("2026-01-12T00:00:00Z"), utc("2026-01-19T00:00:00Z"));
    sys.record_on(EntryType::MerchantGrossRevenue, "m-1", "ord-3", 2_500, "EUR", utc("2026-01-13T08:00:00Z")).await;
    sys.record_on(EntryType::MerchantMethodFee, "m-1", "ord-3", 100, "EUR", utc("2026-01-13T08:00:00Z")).await;
    let first = sys.accepted_report("m-1").await;
    let second = sys.accepted_report_for("m-1", week_two.0, week_two.1).await;
    // Pending reports are not paid out
    sys.record_on(EntryType::MerchantGrossRevenue, "m-1", "ord-4", 1_000, "EUR", utc("2026-01-20T08:00:00Z")).await;
    let week_three_end = utc("2026-01-26T00:00:00Z");
    let generator = sys.reports(Duration::hours(1));
    let pending = generator.generate("m-1", week_two.1, week_three_end, &operator()).await.unwrap();

    let payouts = sys.payouts();
    let payout = payouts.create_payout_document("m-1", &operator()).await.unwrap();
    assert_eq!(payout.status, PayoutStatus::Pending);
    assert_eq!(payout.autoincrement_id, 1);
    assert_eq!(payout.source_ids.0, vec![first.id, second.id]);
    assert_eq!(payout.balance, Amount::from(12_400));
    assert_eq!(payout.total_fees, Amount::from(100));
    assert_eq!(payout.total_transactions, 3);
    assert_eq!(payout.currency, "EUR");
    assert_eq!(payout.destination.0.account_holder, "Merchant m-1");
    assert_eq!(payout.company.0.legal_name, "m-1 GmbH");

    // The document keeps the banking details it was created with
    let moved = Merchant::new("m-1", "Merchant m-1", "EUR")
        .with_banking(BankingDetails { account_holder: "New Holder".into(), ..Default::default() });
    sys.db.upsert_merchant(&moved).await.unwrap();
    assert_eq!(sys.db.fetch_merchant("m-1").await.unwrap().unwrap().banking.0.account_holder, "New Holder");
    let stored = payouts.fetch_payout(payout.id).await.unwrap().unwrap();
    assert_eq!(stored.destination.0.account_holder, "Merchant m-1");

    let reports = sys.reports(Duration::hours(1));
    for id in [first.id, second.id] {
        let report = reports.fetch_report(id).await.unwrap().unwrap();
        assert_eq!(report.payout_document_id, Some(payout.id));
        assert_eq!(reports.changes_for_report(id).await.unwrap().len(), 3);
    }
    assert_eq!(reports.fetch_report(pending.id).await.unwrap().unwrap().payout_document_id, None);
    assert_eq!(payouts.changes_for_payout(payout.id).await.unwrap().len(), 1);

    let err = payouts.create_payout_document("m-1", &operator()).await.unwrap_err();
    assert!(matches!(err, PayoutError::NoReportsToPayout(_)));
    assert_eq!(err.code(), "no_reports_to_payout");
    // The failed attempt did not use up a number
    assert_eq!(SequenceApi::new(sys.db.clone()).current(PAYOUT_SEQUENCE).await.unwrap(), Some(1));
    sys.teardown().await;
}

#[tokio::test]
async fn mixed_currencies_are_refused_without_side_effects() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    let weeks = [
        (utc("2026-01-05T00:00:00Z"), utc("2026-01-12T00:00:00Z")),
        (utc("2026-01-12T00:00:00Z"), utc("2026-01-19T00:00:00Z")),
        (utc("2026-01-19T00:00:00Z"), utc("2026-01-26T00:00:00Z")),
    ];
    for (i, (from, to)) in weeks.iter().enumerate() {
        if i == 2 {
            sys.add_merchant("m-1", "USD").await;
        }
        let currency = if i == 2 { "USD" } else { "EUR" };
        let at = *from + Duration::hours(1);
        sys.record_on(EntryType::MerchantGrossRevenue, "m-1", &format!("ord-{i}"), 1_000, currency, at).await;
        let report = sys.accepted_report_for("m-1", *from, *to).await;
        assert_eq!(report.currency, currency);
    }

    let payouts = sys.payouts();
    let err = payouts.create_payout_document("m-1", &operator()).await.unwrap_err();
    match &err {
        PayoutError::BalanceHasMoreOneCurrency { merchant_id, currencies } => {
            assert_eq!(merchant_id, "m-1");
            assert_eq!(currencies, "EUR, USD");
        },
        other => panic!("Unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::Consistency);

    assert!(payouts.payouts_for_merchant("m-1").await.unwrap().is_empty());
    let reports = sys.reports(Duration::hours(1)).reports_for_merchant("m-1").await.unwrap();
    assert!(reports.iter().all(|r| r.payout_document_id.is_none()));
    assert_eq!(SequenceApi::new(sys.db.clone()).current(PAYOUT_SEQUENCE).await.unwrap(), None);
    sys.teardown().await;
}

#[tokio::test]
async fn balance_must_be_positive() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    sys.record_on(EntryType::MerchantRefund, "m-1", "ord-1", 500, "EUR", in_week()).await;
    let report = sys.accepted_report("m-1").await;
    assert_eq!(report.totals.payout_amount, Amount::from(-500));

    let err = sys.payouts().create_payout_document("m-1", &operator()).await.unwrap_err();
    assert!(matches!(err, PayoutError::PayoutAmountNotPositive { balance, .. } if balance == Amount::from(-500)));
    let err = sys.payouts().create_payout_document("nobody", &operator()).await.unwrap_err();
    assert!(matches!(err, PayoutError::MerchantNotFound(_)));
    sys.teardown().await;
}

#[tokio::test]
async fn concurrent_payouts_get_distinct_consecutive_numbers() {
    const MERCHANTS: usize = 6;
    let sys = TestSystem::new().await;
    let ids = (0..MERCHANTS).map(|i| format!("m-{i}")).collect::<Vec<_>>();
    for id in &ids {
        sys.add_merchant(id, "EUR").await;
        sys.earn(id, &format!("ord-{id}"), 1_000, "EUR").await;
        sys.accepted_report(id).await;
    }
    let payouts = sys.payouts();
    let actor = operator();
    let results = join_all(ids.iter().map(|id| payouts.create_payout_document(id, &actor))).await;
    let mut numbers = results.into_iter().map(|r| r.unwrap().autoincrement_id).collect::<Vec<_>>();
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=MERCHANTS as i64).collect::<Vec<_>>());
    sys.teardown().await;
}

#[tokio::test]
async fn a_report_lands_on_one_payout_only() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    sys.earn("m-1", "ord-1", 1_000, "EUR").await;
    let report = sys.accepted_report("m-1").await;

    let payouts = sys.payouts();
    let actor = operator();
    let (a, b) =
        tokio::join!(payouts.create_payout_document("m-1", &actor), payouts.create_payout_document("m-1", &actor));
    let (winner, loser) = match (a, b) {
        (Ok(p), Err(e)) | (Err(e), Ok(p)) => (p, e),
        (a, b) => panic!("Expected exactly one payout, got {a:?} and {b:?}"),
    };
    assert!(matches!(loser, PayoutError::NoReportsToPayout(_) | PayoutError::ReportAlreadyClaimed(_)));
    assert_eq!(winner.source_ids.0, vec![report.id]);
    assert_eq!(payouts.payouts_for_merchant("m-1").await.unwrap().len(), 1);
    assert_eq!(SequenceApi::new(sys.db.clone()).current(PAYOUT_SEQUENCE).await.unwrap(), Some(1));
    sys.teardown().await;
}

#[tokio::test]
async fn payout_status_lifecycle() {
    let sys = TestSystem::new().await;
    for id in ["m-1", "m-2"] {
        sys.add_merchant(id, "EUR").await;
        sys.earn(id, &format!("ord-{id}"), 1_000, "EUR").await;
        sys.accepted_report(id).await;
    }
    let payouts = sys.payouts();
    let bank = operator();
    let paid = payouts.create_payout_document("m-1", &bank).await.unwrap();
    let failed = payouts.create_payout_document("m-2", &bank).await.unwrap();

    let err = payouts.mark_in_progress(9_999, "txn", &bank).await.unwrap_err();
    assert!(matches!(err, PayoutError::PayoutNotFound(9_999)));

    let doc = payouts.mark_in_progress(paid.id, "txn-1", &bank).await.unwrap();
    assert_eq!(doc.status, PayoutStatus::InProgress);
    assert_eq!(doc.transaction_id.as_deref(), Some("txn-1"));
    let err = payouts.mark_in_progress(paid.id, "txn-1", &bank).await.unwrap_err();
    assert!(matches!(
        err,
        PayoutError::InvalidTransition { status: PayoutStatus::InProgress, target: PayoutStatus::InProgress, .. }
    ));

    let arrival = utc("2026-01-20T00:00:00Z");
    let doc = payouts.mark_paid(paid.id, "txn-1", arrival, &bank).await.unwrap();
    assert_eq!(doc.status, PayoutStatus::Paid);
    assert_eq!(doc.arrival_date, Some(arrival));
    assert!(doc.paid_at.is_some());
    let report = &sys.reports(Duration::hours(1)).reports_for_merchant("m-1").await.unwrap()[0];
    assert!(report.payout_date.is_some());
    let err = payouts.mark_failed(paid.id, "late", "Too late", None, &bank).await.unwrap_err();
    assert!(matches!(err, PayoutError::InvalidTransition { status: PayoutStatus::Paid, .. }));
    assert_eq!(payouts.changes_for_payout(paid.id).await.unwrap().len(), 3);

    let err = payouts.mark_paid(failed.id, "txn-9", arrival, &bank).await.unwrap_err();
    assert!(matches!(
        err,
        PayoutError::InvalidTransition { status: PayoutStatus::Pending, target: PayoutStatus::Paid, .. }
    ));
    let err = payouts.mark_failed(failed.id, "account_closed", "The account is closed", None, &bank).await.unwrap_err();
    assert!(matches!(
        err,
        PayoutError::InvalidTransition { status: PayoutStatus::Pending, target: PayoutStatus::Failed, .. }
    ));
    assert_eq!(payouts.fetch_payout(failed.id).await.unwrap().unwrap().status, PayoutStatus::Pending);
    assert_eq!(payouts.changes_for_payout(failed.id).await.unwrap().len(), 1);

    payouts.mark_in_progress(failed.id, "txn-9", &bank).await.unwrap();
    let doc =
        payouts.mark_failed(failed.id, "account_closed", "The account is closed", Some("txn-9"), &bank).await.unwrap();
    assert_eq!(doc.status, PayoutStatus::Failed);
    assert_eq!(doc.failure_code.as_deref(), Some("account_closed"));
    assert_eq!(doc.failure_transaction.as_deref(), Some("txn-9"));
    let report = &sys.reports(Duration::hours(1)).reports_for_merchant("m-2").await.unwrap()[0];
    assert_eq!(report.payout_document_id, Some(failed.id));
    assert!(report.payout_date.is_none());
    sys.teardown().await;
}
