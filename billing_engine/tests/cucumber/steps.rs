use std::str::FromStr;

use billing_common::Amount;
use billing_engine::{
    db_types::{EntrySource, EntryType, Merchant, NewAccountingEntry},
    helpers::RoyaltyPeriod,
};
use chrono::{Duration, Utc};
use cucumber::{given, then, when};
use log::*;

use crate::cucumber::{
    billing_world::{merchant_actor, operator, week_of},
    BillingWorld,
};

fn amount(value: &str) -> Amount {
    Amount::from_str(value).expect("Not a valid amount")
}

async fn record(
    world: &mut BillingWorld,
    entry_type: EntryType,
    merchant: &str,
    value: &str,
    currency: &str,
    order: &str,
    week: &str,
) {
    let (from, _) = week_of(week);
    let entry = NewAccountingEntry::new(entry_type, EntrySource::order(order), merchant, amount(value), currency)
        .with_available_on(from + Duration::hours(12));
    world.system().ledger.record_entry(entry).await.expect("Error recording ledger entry");
}

#[given(expr = "merchant '{word}' is paid out in {word}")]
async fn add_merchant(world: &mut BillingWorld, merchant_id: String, currency: String) {
    let merchant = Merchant::new(&merchant_id, &format!("Merchant {merchant_id}"), &currency);
    world.system().db.upsert_merchant(&merchant).await.expect("Error adding merchant");
}

#[when(expr = "merchant '{word}' earns {word} {word} from order '{word}' during the week of {word}")]
async fn earn(
    world: &mut BillingWorld,
    merchant: String,
    value: String,
    currency: String,
    order: String,
    week: String,
) {
    record(world, EntryType::MerchantGrossRevenue, &merchant, &value, &currency, &order, &week).await;
}

#[when(expr = "merchant '{word}' pays a {word} {word} method fee on order '{word}' during the week of {word}")]
async fn method_fee(
    world: &mut BillingWorld,
    merchant: String,
    value: String,
    currency: String,
    order: String,
    week: String,
) {
    record(world, EntryType::MerchantMethodFee, &merchant, &value, &currency, &order, &week).await;
}

#[when(expr = "merchant '{word}' refunds {word} {word} on order '{word}' during the week of {word}")]
async fn refund(
    world: &mut BillingWorld,
    merchant: String,
    value: String,
    currency: String,
    order: String,
    week: String,
) {
    record(world, EntryType::MerchantRefund, &merchant, &value, &currency, &order, &week).await;
}

#[when(expr = "the royalty reports for the week of {word} are generated")]
async fn generate_reports(world: &mut BillingWorld, week: String) {
    let (from, to) = week_of(&week);
    let period = RoyaltyPeriod::new(from, to).expect("Invalid period");
    let reports =
        world.system().reports.generate_for_period(period, &operator()).await.expect("Error generating reports");
    debug!("🚀️ Generated {} reports for the week of {week}", reports.len());
}

#[when(expr = "merchant '{word}' disputes the report for the week of {word} because {string}")]
async fn dispute(world: &mut BillingWorld, merchant: String, week: String, reason: String) {
    let report = world.report_for_week(&merchant, &week).await;
    let result = world.system().reports.dispute(report.id, &reason, &merchant_actor(&merchant)).await;
    world.last_error = result.err().map(|e| e.code().to_string());
}

#[when(expr = "the dispute on the report of '{word}' for the week of {word} is closed")]
async fn close_dispute(world: &mut BillingWorld, merchant: String, week: String) {
    let report = world.report_for_week(&merchant, &week).await;
    let result = world.system().reports.close_dispute(report.id, &operator()).await;
    world.last_error = result.err().map(|e| e.code().to_string());
}

#[when(expr = "merchant '{word}' accepts the report for the week of {word}")]
async fn accept(world: &mut BillingWorld, merchant: String, week: String) {
    let report = world.report_for_week(&merchant, &week).await;
    let result = world.system().reports.accept(report.id, &merchant_actor(&merchant)).await;
    world.last_error = result.err().map(|e| e.code().to_string());
}

#[when("the auto-accept sweep runs")]
async fn sweep(world: &mut BillingWorld) {
    let accepted = world.system().reports.auto_accept_sweep().await.expect("Error running the auto-accept sweep");
    debug!("🚀️ {} reports auto-accepted", accepted.len());
}

#[when(expr = "I create a payout document for '{word}'")]
async fn create_payout(world: &mut BillingWorld, merchant: String) {
    let result = world.system().payouts.create_payout_document(&merchant, &operator()).await;
    world.last_error = result.err().map(|e| e.code().to_string());
}

#[when(expr = "the bank pays out the payout document for '{word}' with transfer '{word}'")]
async fn pay(world: &mut BillingWorld, merchant: String, transfer: String) {
    let payouts = &world.system().payouts;
    let mut documents = payouts.payouts_for_merchant(&merchant).await.expect("Error fetching payouts");
    let payout = documents.pop().expect("No payout");
    payouts.mark_in_progress(payout.id, &transfer, &operator()).await.expect("Error starting transfer");
    payouts.mark_paid(payout.id, &transfer, Utc::now(), &operator()).await.expect("Error completing transfer");
}

#[then(expr = "the royalty report of '{word}' for the week of {word} is {word}")]
async fn report_status(world: &mut BillingWorld, merchant: String, week: String, status: String) {
    let report = world.report_for_week(&merchant, &week).await;
    assert_eq!(report.status.to_string(), status);
}

#[then(expr = "the royalty report of '{word}' for the week of {word} pays out {word} {word}")]
async fn report_payout(world: &mut BillingWorld, merchant: String, week: String, value: String, currency: String) {
    let report = world.report_for_week(&merchant, &week).await;
    assert_eq!(report.totals.payout_amount, amount(&value));
    assert_eq!(report.currency, currency);
}

#[then(expr = "the royalty report of '{word}' for the week of {word} was accepted automatically")]
async fn report_auto_accepted(world: &mut BillingWorld, merchant: String, week: String) {
    let report = world.report_for_week(&merchant, &week).await;
    assert!(report.is_auto_accepted);
}

#[then(expr = "the last operation failed with '{word}'")]
async fn last_error(world: &mut BillingWorld, code: String) {
    assert_eq!(world.last_error.as_deref(), Some(code.as_str()));
}

#[then("the last operation succeeded")]
async fn no_error(world: &mut BillingWorld) {
    assert_eq!(world.last_error, None);
}

#[then(expr = "merchant '{word}' has {int} payout document(s)")]
async fn payout_count(world: &mut BillingWorld, merchant: String, count: usize) {
    let payouts = world.system().payouts.payouts_for_merchant(&merchant).await.expect("Error fetching payouts");
    assert_eq!(payouts.len(), count);
}

#[then(expr = "the payout document for '{word}' is number {int} with a balance of {word} {word}")]
async fn payout_balance(world: &mut BillingWorld, merchant: String, number: i64, value: String, currency: String) {
    let payouts = world.system().payouts.payouts_for_merchant(&merchant).await.expect("Error fetching payouts");
    let payout = payouts.last().expect("No payout");
    assert_eq!(payout.autoincrement_id, number);
    assert_eq!(payout.balance, amount(&value));
    assert_eq!(payout.currency, currency);
}

#[then(expr = "the payout document for '{word}' is {word}")]
async fn payout_status(world: &mut BillingWorld, merchant: String, status: String) {
    let payouts = world.system().payouts.payouts_for_merchant(&merchant).await.expect("Error fetching payouts");
    assert_eq!(payouts.last().expect("No payout").status.to_string(), status);
}

#[then(expr = "every royalty report of '{word}' carries a payout date")]
async fn reports_paid(world: &mut BillingWorld, merchant: String) {
    let reports = world.system().reports.reports_for_merchant(&merchant).await.expect("Error fetching reports");
    assert!(!reports.is_empty());
    assert!(reports.iter().all(|r| r.payout_document_id.is_some() && r.payout_date.is_some()));
}
