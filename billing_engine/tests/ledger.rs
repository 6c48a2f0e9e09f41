mod support;

use billing_common::Amount;
use billing_engine::{
    db_types::{EntrySource, EntryType, NewAccountingEntry},
    traits::{ExchangeRateError, LedgerError},
};
use rust_decimal_macros::dec;

use crate::support::{in_week, utc, week, TestSystem};

fn order_entry(entry_type: EntryType, order_id: &str, merchant: &str, amount: i64, cur: &str) -> NewAccountingEntry {
    NewAccountingEntry::new(entry_type, EntrySource::order(order_id), merchant, Amount::from(amount), cur)
}

#[tokio::test]
async fn entries_are_converted_into_the_payout_currency() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-usd", "USD").await;
    sys.db.set_exchange_rate("eur", "usd", dec!(1.10)).await.unwrap();
    let ledger = sys.ledger();

    let entry = NewAccountingEntry::new(
        EntryType::MerchantGrossRevenue,
        EntrySource::order("ord-1"),
        "m-usd",
        Amount::from(10_000),
        "EUR",
    )
    .with_country("DE")
    .with_available_on(in_week());
    let entry = ledger.record_entry(entry).await.unwrap();
    assert_eq!(entry.amount, Amount::from(10_000));
    assert_eq!(entry.currency, "EUR");
    assert_eq!(entry.original_amount, Amount::from(10_000));
    assert_eq!(entry.original_currency, "EUR");
    assert_eq!(entry.local_amount, Amount::from(11_000));
    assert_eq!(entry.local_currency, "USD");
    assert_eq!(entry.available_on, in_week());

    // The reciprocal of a stored rate is used when the direct pair is missing
    sys.add_merchant("m-eur", "EUR").await;
    sys.db.set_exchange_rate("EUR", "USD", dec!(1.25)).await.unwrap();
    let entry = NewAccountingEntry::new(
        EntryType::MerchantGrossRevenue,
        EntrySource::order("ord-2"),
        "m-eur",
        Amount::from(5_000),
        "USD",
    );
    let entry = ledger.record_entry(entry).await.unwrap();
    assert_eq!(entry.local_amount, Amount::from(4_000));
    assert_eq!(entry.local_currency, "EUR");
    sys.teardown().await;
}

#[tokio::test]
async fn missing_rates_and_merchants_are_refused() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    let ledger = sys.ledger();

    let entry = order_entry(EntryType::MerchantGrossRevenue, "ord-1", "m-1", 100, "RUB");
    let err = ledger.record_entry(entry).await.unwrap_err();
    assert!(matches!(err, LedgerError::ExchangeRate(ExchangeRateError::RateDoesNotExist { .. })));
    assert_eq!(err.code(), "rate_does_not_exist");

    let entry = order_entry(EntryType::MerchantGrossRevenue, "ord-2", "nobody", 100, "EUR");
    let err = ledger.record_entry(entry).await.unwrap_err();
    assert!(matches!(err, LedgerError::MerchantNotFound(m) if m == "nobody"));
    sys.teardown().await;
}

#[tokio::test]
async fn amounts_are_magnitudes_except_for_corrections() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    let ledger = sys.ledger();

    let zero = order_entry(EntryType::MerchantTaxFee, "ord-1", "m-1", 0, "EUR");
    assert!(matches!(ledger.record_entry(zero).await, Err(LedgerError::InvalidAmount(_))));
    let negative = order_entry(EntryType::MerchantMethodFee, "ord-1", "m-1", -50, "EUR");
    assert!(matches!(ledger.record_entry(negative).await, Err(LedgerError::InvalidAmount(_))));

    let gross = NewAccountingEntry::new(
        EntryType::MerchantGrossRevenue,
        EntrySource::order("ord-1"),
        "m-1",
        Amount::from(2_000),
        "EUR",
    )
    .with_country("FR");
    let gross = ledger.record_entry(gross).await.unwrap();
    let correction = ledger.record_correction(gross.id, Amount::from(-150), "Overcharged fee", None).await.unwrap();
    assert_eq!(correction.entry_type, EntryType::MerchantRoyaltyCorrection);
    assert_eq!(correction.source, EntrySource::entry(gross.id));
    assert_eq!(correction.amount, Amount::from(-150));
    assert_eq!(correction.local_amount, Amount::from(-150));
    assert_eq!(correction.country, "FR");
    assert_eq!(correction.reason, "Overcharged fee");

    let err = ledger.record_correction(9_999, Amount::from(10), "No such entry", None).await.unwrap_err();
    assert!(matches!(err, LedgerError::EntryNotFound(9_999)));

    let reserve =
        ledger.record_rolling_reserve("m-1", Amount::from(300), "EUR", "Chargeback risk", None, false).await.unwrap();
    assert_eq!(reserve.entry_type, EntryType::MerchantRollingReserveCreate);
    let release =
        ledger.record_rolling_reserve("m-1", Amount::from(300), "EUR", "Risk cleared", None, true).await.unwrap();
    assert_eq!(release.entry_type, EntryType::MerchantRollingReserveRelease);
    assert_eq!(ledger.entries_for_source(&EntrySource::order("ord-1")).await.unwrap().len(), 1);
    sys.teardown().await;
}

#[tokio::test]
async fn ledger_rows_cannot_be_changed_or_removed() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    let ledger = sys.ledger();
    let entry = order_entry(EntryType::MerchantGrossRevenue, "ord-1", "m-1", 700, "EUR");
    let entry = ledger.record_entry(entry).await.unwrap();

    let update = sqlx::query("UPDATE accounting_entries SET amount = 1 WHERE id = $1").bind(entry.id);
    assert!(update.execute(sys.db.pool()).await.is_err());
    let delete = sqlx::query("DELETE FROM accounting_entries WHERE id = $1").bind(entry.id);
    assert!(delete.execute(sys.db.pool()).await.is_err());

    let stored = ledger.fetch_entry(entry.id).await.unwrap().unwrap();
    assert_eq!(stored, entry);
    sys.teardown().await;
}

#[tokio::test]
async fn merchant_window_is_half_open() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    let ledger = sys.ledger();
    let (from, to) = week();
    let before = utc("2026-01-04T23:59:59Z");
    for (source, at) in [("ord-start", from), ("ord-mid", in_week()), ("ord-end", to), ("ord-before", before)] {
        let entry = NewAccountingEntry::new(
            EntryType::MerchantGrossRevenue,
            EntrySource::order(source),
            "m-1",
            Amount::from(100),
            "EUR",
        )
        .with_available_on(at);
        ledger.record_entry(entry).await.unwrap();
    }
    let entries = ledger.entries_for_merchant("m-1", from, to).await.unwrap();
    let sources = entries.iter().map(|e| e.source.id.as_str()).collect::<Vec<_>>();
    assert_eq!(sources, vec!["ord-start", "ord-mid"]);
    sys.teardown().await;
}
