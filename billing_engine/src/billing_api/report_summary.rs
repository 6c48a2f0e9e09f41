//! Pure aggregation of ledger lines into royalty report totals.
use std::collections::BTreeMap;

use billing_common::Amount;

use crate::db_types::{AccountingEntry, CorrectionItem, EntryType, ReportSummary, ReportTotals, SummaryItem};

/// The product name for entries that were not caused by an order.
pub const UNASSIGNED_PRODUCT: &str = "unassigned";
pub const TOTAL_ITEM: &str = "total";

/// One ledger entry as it enters a report: its amount already converted into the report currency.
#[derive(Debug, Clone)]
pub struct ReportLine {
    pub entry: AccountingEntry,
    pub product: Option<String>,
    /// The entry's amount in the report currency. A magnitude, except for corrections, which carry their sign.
    pub amount: Amount,
}

/// Folds the lines of one reporting window into totals and a per-product summary.
///
/// `payout_amount` is `gross - returns - vat - fees + corrections - rolling reserve`, which is the signed sum of every
/// line.
pub fn summarize(lines: &[ReportLine], currency: &str) -> (ReportTotals, ReportSummary) {
    let mut totals = ReportTotals::default();
    let mut products = BTreeMap::<String, SummaryItem>::new();
    let mut corrections = Vec::new();
    let mut rolling_reserves = Vec::new();
    for line in lines {
        let entry_type = line.entry.entry_type;
        let amount = line.amount;
        if entry_type.is_correction() || entry_type.is_rolling_reserve() {
            let signed =
                if entry_type.is_correction() { amount } else { Amount::from(entry_type.sign() * amount.value()) };
            let item = CorrectionItem {
                accounting_entry_id: line.entry.id,
                amount: signed,
                currency: currency.to_string(),
                reason: line.entry.reason.clone(),
                entry_date: line.entry.available_on,
            };
            if entry_type.is_correction() {
                totals.correction_amount += signed;
                corrections.push(item);
            } else {
                totals.rolling_reserve_amount -= signed;
                rolling_reserves.push(item);
            }
            continue;
        }
        let product = match line.product.as_deref() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => UNASSIGNED_PRODUCT.to_string(),
        };
        let item = products.entry(product.clone()).or_insert_with(|| SummaryItem { product, ..Default::default() });
        match entry_type {
            EntryType::MerchantGrossRevenue => {
                item.transactions_count += 1;
                item.gross_amount += amount;
            },
            EntryType::MerchantRefund => item.returns_amount += amount,
            EntryType::MerchantTaxFee => item.vat_amount += amount,
            EntryType::MerchantMethodFee | EntryType::MerchantMethodFixedFee | EntryType::MerchantRefundFee => {
                item.fee_amount += amount
            },
            EntryType::MerchantRoyaltyCorrection |
            EntryType::MerchantRollingReserveCreate |
            EntryType::MerchantRollingReserveRelease => {},
        }
    }
    let mut total = SummaryItem { product: TOTAL_ITEM.to_string(), ..Default::default() };
    let products = products
        .into_values()
        .map(|mut item| {
            item.payout_amount = item.gross_amount - item.returns_amount - item.vat_amount - item.fee_amount;
            total.transactions_count += item.transactions_count;
            total.gross_amount += item.gross_amount;
            total.returns_amount += item.returns_amount;
            total.vat_amount += item.vat_amount;
            total.fee_amount += item.fee_amount;
            total.payout_amount += item.payout_amount;
            item
        })
        .collect::<Vec<_>>();
    totals.transactions_count = total.transactions_count;
    totals.gross_amount = total.gross_amount;
    totals.returns_amount = total.returns_amount;
    totals.vat_amount = total.vat_amount;
    totals.fee_amount = total.fee_amount;
    totals.payout_amount = total.payout_amount + totals.correction_amount - totals.rolling_reserve_amount;
    (totals, ReportSummary { products, total, corrections, rolling_reserves })
}
