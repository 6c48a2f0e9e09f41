//! Data types stored in, and read from, the billing database.
use std::{fmt::Display, str::FromStr};

use billing_common::Amount;
use chrono::{DateTime, Utc};
use payment_gateways::{
    GatewayOrder,
    GatewayRefund,
    PaymentMethod,
    PaymentMethodParams,
    PaymentStatus,
    RecurringPeriod,
    RecurringSubscription,
    RefundStatus,
    SubscriptionStatus,
};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      EntryType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    MerchantGrossRevenue,
    MerchantTaxFee,
    MerchantMethodFee,
    MerchantMethodFixedFee,
    MerchantRefund,
    MerchantRefundFee,
    /// The only entry type whose stored amount is signed.
    MerchantRoyaltyCorrection,
    MerchantRollingReserveCreate,
    MerchantRollingReserveRelease,
}

impl EntryType {
    /// The direction in which a stored (unsigned) amount of this type moves the merchant's balance.
    pub fn sign(&self) -> i64 {
        match self {
            Self::MerchantGrossRevenue | Self::MerchantRoyaltyCorrection | Self::MerchantRollingReserveRelease => 1,
            Self::MerchantTaxFee |
            Self::MerchantMethodFee |
            Self::MerchantMethodFixedFee |
            Self::MerchantRefund |
            Self::MerchantRefundFee |
            Self::MerchantRollingReserveCreate => -1,
        }
    }

    pub fn is_correction(&self) -> bool {
        matches!(self, Self::MerchantRoyaltyCorrection)
    }

    pub fn is_rolling_reserve(&self) -> bool {
        matches!(self, Self::MerchantRollingReserveCreate | Self::MerchantRollingReserveRelease)
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MerchantGrossRevenue => "merchant_gross_revenue",
            Self::MerchantTaxFee => "merchant_tax_fee",
            Self::MerchantMethodFee => "merchant_method_fee",
            Self::MerchantMethodFixedFee => "merchant_method_fixed_fee",
            Self::MerchantRefund => "merchant_refund",
            Self::MerchantRefundFee => "merchant_refund_fee",
            Self::MerchantRoyaltyCorrection => "merchant_royalty_correction",
            Self::MerchantRollingReserveCreate => "merchant_rolling_reserve_create",
            Self::MerchantRollingReserveRelease => "merchant_rolling_reserve_release",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Completed,
}

//--------------------------------------     EntrySource     ---------------------------------------------------------
pub const SOURCE_ORDER: &str = "order";
pub const SOURCE_REFUND: &str = "refund";
pub const SOURCE_ACCOUNTING_ENTRY: &str = "accounting_entry";
pub const SOURCE_MERCHANT: &str = "merchant";

/// The record that caused a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct EntrySource {
    #[sqlx(rename = "source_id")]
    pub id: String,
    #[sqlx(rename = "source_type")]
    pub source_type: String,
}

impl EntrySource {
    pub fn new<S: Into<String>>(id: S, source_type: &str) -> Self {
        Self { id: id.into(), source_type: source_type.to_string() }
    }

    pub fn order(order_id: &str) -> Self {
        Self::new(order_id, SOURCE_ORDER)
    }

    pub fn refund(refund_id: &str) -> Self {
        Self::new(refund_id, SOURCE_REFUND)
    }

    pub fn entry(entry_id: i64) -> Self {
        Self::new(entry_id.to_string(), SOURCE_ACCOUNTING_ENTRY)
    }
}

//--------------------------------------   AccountingEntry   ---------------------------------------------------------
/// One money movement. Rows are never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AccountingEntry {
    pub id: i64,
    pub entry_type: EntryType,
    #[sqlx(flatten)]
    pub source: EntrySource,
    pub merchant_id: String,
    pub amount: Amount,
    pub currency: String,
    /// The amount as charged to the payer.
    pub original_amount: Amount,
    pub original_currency: String,
    /// The amount in the merchant's settlement currency.
    pub local_amount: Amount,
    pub local_currency: String,
    pub country: String,
    pub reason: String,
    pub status: EntryStatus,
    pub created_at: DateTime<Utc>,
    /// The instant from which the entry counts towards a royalty period.
    pub available_on: DateTime<Utc>,
}

impl AccountingEntry {
    pub const OBJECT: &'static str = "accounting_entry";

    /// The local amount with the entry type's sign applied.
    pub fn signed_local_amount(&self) -> Amount {
        Amount::from(self.entry_type.sign() * self.local_amount.value())
    }
}

#[derive(Debug, Clone)]
pub struct NewAccountingEntry {
    pub entry_type: EntryType,
    pub source: EntrySource,
    pub merchant_id: String,
    pub amount: Amount,
    pub currency: String,
    pub original_amount: Option<Amount>,
    pub original_currency: Option<String>,
    pub local_amount: Option<Amount>,
    pub local_currency: Option<String>,
    pub country: String,
    pub reason: String,
    pub status: EntryStatus,
    pub available_on: Option<DateTime<Utc>>,
}

impl NewAccountingEntry {
    pub fn new(entry_type: EntryType, source: EntrySource, merchant_id: &str, amount: Amount, currency: &str) -> Self {
        Self {
            entry_type,
            source,
            merchant_id: merchant_id.to_string(),
            amount,
            currency: currency.to_string(),
            original_amount: None,
            original_currency: None,
            local_amount: None,
            local_currency: None,
            country: String::new(),
            reason: String::new(),
            status: EntryStatus::Completed,
            available_on: None,
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = reason.to_string();
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = country.to_string();
        self
    }

    pub fn with_available_on(mut self, available_on: DateTime<Utc>) -> Self {
        self.available_on = Some(available_on);
        self
    }

    pub fn with_original(mut self, amount: Amount, currency: &str) -> Self {
        self.original_amount = Some(amount);
        self.original_currency = Some(currency.to_string());
        self
    }

    pub fn with_local(mut self, amount: Amount, currency: &str) -> Self {
        self.local_amount = Some(amount);
        self.local_currency = Some(currency.to_string());
        self
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }
}

//--------------------------------------    RoyaltyReport    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Accepted,
    Dispute,
    DisputeClosed,
}

impl Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Dispute => write!(f, "dispute"),
            Self::DisputeClosed => write!(f, "dispute_closed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub transactions_count: i64,
    pub gross_amount: Amount,
    pub returns_amount: Amount,
    pub vat_amount: Amount,
    pub fee_amount: Amount,
    pub correction_amount: Amount,
    pub rolling_reserve_amount: Amount,
    pub payout_amount: Amount,
}

/// Per-product aggregation of the revenue lines of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub product: String,
    pub transactions_count: i64,
    pub gross_amount: Amount,
    pub returns_amount: Amount,
    pub vat_amount: Amount,
    pub fee_amount: Amount,
    pub payout_amount: Amount,
}

/// A correction or rolling-reserve line, tied to the ledger entry that produced it. The amount is signed toward the
/// merchant's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionItem {
    pub accounting_entry_id: i64,
    pub amount: Amount,
    pub currency: String,
    pub reason: String,
    pub entry_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub products: Vec<SummaryItem>,
    pub total: SummaryItem,
    pub corrections: Vec<CorrectionItem>,
    pub rolling_reserves: Vec<CorrectionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoyaltyReport {
    pub id: i64,
    pub merchant_id: String,
    pub currency: String,
    pub period_from: DateTime<Utc>,
    pub period_to: DateTime<Utc>,
    pub status: ReportStatus,
    pub totals: Json<ReportTotals>,
    pub summary: Json<ReportSummary>,
    pub dispute_reason: Option<String>,
    pub dispute_started_at: Option<DateTime<Utc>>,
    pub dispute_closed_at: Option<DateTime<Utc>>,
    pub accept_expire_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub is_auto_accepted: bool,
    pub payout_document_id: Option<i64>,
    pub payout_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRoyaltyReport {
    pub merchant_id: String,
    pub currency: String,
    pub period_from: DateTime<Utc>,
    pub period_to: DateTime<Utc>,
    pub totals: ReportTotals,
    pub summary: ReportSummary,
    pub accept_expire_at: DateTime<Utc>,
}

/// A ledger entry joined with the product of the order that caused it, as used by report generation.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerLine {
    #[sqlx(flatten)]
    pub entry: AccountingEntry,
    pub product: Option<String>,
}

//--------------------------------------    Audit trail      ---------------------------------------------------------
/// Who caused a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub source: String,
    pub ip: String,
}

impl Actor {
    pub fn new(source: &str, ip: &str) -> Self {
        Self { source: source.to_string(), ip: ip.to_string() }
    }

    pub fn system(job: &str) -> Self {
        Self { source: format!("system:{job}"), ip: String::new() }
    }
}

/// One row of an append-only audit trail. `document_id` is the report or payout document that was changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ChangeRecord {
    pub id: i64,
    pub document_id: i64,
    pub source: String,
    pub ip: String,
    /// Blake2b-256 hex digest of the document's state after the change.
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   PayoutDocument    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    InProgress,
    Paid,
    Failed,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankingDetails {
    pub account_holder: String,
    pub account_number: String,
    pub bank_name: String,
    pub swift: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub legal_name: String,
    pub address: String,
    pub country: String,
    pub tax_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PayoutDocument {
    pub id: i64,
    pub merchant_id: String,
    /// The royalty reports this document pays out.
    pub source_ids: Json<Vec<i64>>,
    pub total_fees: Amount,
    pub balance: Amount,
    pub currency: String,
    pub total_transactions: i64,
    /// Banking details as they were when the document was created.
    pub destination: Json<BankingDetails>,
    pub company: Json<CompanyInfo>,
    pub status: PayoutStatus,
    pub transaction_id: Option<String>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
    pub failure_transaction: Option<String>,
    pub arrival_date: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub autoincrement_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payout document before it is numbered and stored.
#[derive(Debug, Clone)]
pub struct NewPayoutDocument {
    pub merchant_id: String,
    pub source_ids: Vec<i64>,
    pub total_fees: Amount,
    pub balance: Amount,
    pub currency: String,
    pub total_transactions: i64,
    pub destination: BankingDetails,
    pub company: CompanyInfo,
}

/// Why a set of reports cannot be paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutDraftError {
    NoReports,
    MixedCurrencies(Vec<String>),
    NotPositive(Amount),
}

impl NewPayoutDocument {
    /// Aggregates accepted reports into a draft document for `merchant`. The reports must share one currency and add
    /// up to a positive balance.
    pub fn from_reports(merchant: &Merchant, reports: &[RoyaltyReport]) -> Result<Self, PayoutDraftError> {
        let first = reports.first().ok_or(PayoutDraftError::NoReports)?;
        let mut currencies = reports.iter().map(|r| r.currency.to_ascii_uppercase()).collect::<Vec<_>>();
        currencies.sort();
        currencies.dedup();
        if currencies.len() > 1 {
            return Err(PayoutDraftError::MixedCurrencies(currencies));
        }
        let balance = reports.iter().map(|r| r.totals.payout_amount).sum::<Amount>();
        if !balance.is_positive() {
            return Err(PayoutDraftError::NotPositive(balance));
        }
        Ok(Self {
            merchant_id: merchant.id.clone(),
            source_ids: reports.iter().map(|r| r.id).collect(),
            total_fees: reports.iter().map(|r| r.totals.fee_amount).sum(),
            balance,
            currency: first.currency.clone(),
            total_transactions: reports.iter().map(|r| r.totals.transactions_count).sum(),
            destination: merchant.banking.0.clone(),
            company: merchant.company.0.clone(),
        })
    }
}

/// The state change applied by the payout status operations.
#[derive(Debug, Clone)]
pub enum PayoutTransition {
    InProgress { transaction_id: String },
    Paid { transaction_id: String, arrival_date: DateTime<Utc> },
    Failed { code: String, message: String, failure_transaction: Option<String> },
}

impl PayoutTransition {
    pub fn target(&self) -> PayoutStatus {
        match self {
            Self::InProgress { .. } => PayoutStatus::InProgress,
            Self::Paid { .. } => PayoutStatus::Paid,
            Self::Failed { .. } => PayoutStatus::Failed,
        }
    }

    /// The statuses from which this transition is allowed.
    pub fn allowed_from(&self) -> &'static [PayoutStatus] {
        match self {
            Self::InProgress { .. } => &[PayoutStatus::Pending],
            Self::Paid { .. } | Self::Failed { .. } => &[PayoutStatus::InProgress],
        }
    }
}

//--------------------------------------    Autoincrement    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Autoincrement {
    pub id: i64,
    pub collection: String,
    pub counter: i64,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Merchant       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub payout_currency: String,
    pub banking: Json<BankingDetails>,
    pub company: Json<CompanyInfo>,
}

impl Merchant {
    pub fn new(id: &str, name: &str, payout_currency: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            payout_currency: payout_currency.to_string(),
            banking: Json(BankingDetails::default()),
            company: Json(CompanyInfo::default()),
        }
    }

    pub fn with_banking(mut self, banking: BankingDetails) -> Self {
        self.banking = Json(banking);
        self
    }

    pub fn with_company(mut self, company: CompanyInfo) -> Self {
        self.company = Json(company);
        self
    }
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    Created,
    Processing,
    Paid,
    Rejected,
    Refunded,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        PaymentStatus::from(*self).is_terminal()
    }
}

impl From<PaymentStatus> for OrderStatusType {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Created => Self::Created,
            PaymentStatus::Processing => Self::Processing,
            PaymentStatus::Paid => Self::Paid,
            PaymentStatus::Rejected => Self::Rejected,
            PaymentStatus::Refunded => Self::Refunded,
        }
    }
}

impl From<OrderStatusType> for PaymentStatus {
    fn from(value: OrderStatusType) -> Self {
        match value {
            OrderStatusType::Created => Self::Created,
            OrderStatusType::Processing => Self::Processing,
            OrderStatusType::Paid => Self::Paid,
            OrderStatusType::Rejected => Self::Rejected,
            OrderStatusType::Refunded => Self::Refunded,
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        PaymentStatus::from(*self).fmt(f)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "processing" => Ok(Self::Processing),
            "paid" => Ok(Self::Paid),
            "rejected" => Ok(Self::Rejected),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Order {
    pub id: i64,
    pub order_id: String,
    pub merchant_id: String,
    pub product: String,
    pub description: String,
    pub amount: Amount,
    pub currency: String,
    pub country: String,
    pub payment_method_id: i64,
    pub mcc_code: String,
    pub operating_company_id: String,
    pub card_brand: String,
    pub status: OrderStatusType,
    pub payment_method_txn_id: Option<String>,
    pub masked_pan: Option<String>,
    pub recurring_id: Option<String>,
    pub decline_reason: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The gateway's view of this order.
    pub fn to_gateway_order(&self, payment_method: PaymentMethod) -> GatewayOrder {
        GatewayOrder {
            order_id: self.order_id.clone(),
            description: self.description.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            payment_method,
            mcc_code: self.mcc_code.clone(),
            operating_company_id: self.operating_company_id.clone(),
            card_brand: self.card_brand.clone(),
            status: self.status.into(),
            payment_method_txn_id: self.payment_method_txn_id.clone(),
            masked_pan: self.masked_pan.clone(),
            recurring_id: self.recurring_id.clone(),
            paid_at: self.paid_at,
            decline_reason: self.decline_reason.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: String,
    pub merchant_id: String,
    pub product: String,
    pub description: String,
    pub amount: Amount,
    pub currency: String,
    pub country: String,
    pub payment_method_id: i64,
    pub mcc_code: String,
    pub operating_company_id: String,
    pub card_brand: String,
}

impl NewOrder {
    pub fn new(order_id: &str, merchant_id: &str, amount: Amount, currency: &str, payment_method_id: i64) -> Self {
        Self {
            order_id: order_id.to_string(),
            merchant_id: merchant_id.to_string(),
            product: String::new(),
            description: String::new(),
            amount,
            currency: currency.to_string(),
            country: String::new(),
            payment_method_id,
            mcc_code: String::new(),
            operating_company_id: String::new(),
            card_brand: String::new(),
        }
    }

    pub fn with_product(mut self, product: &str) -> Self {
        self.product = product.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = country.to_string();
        self
    }

    pub fn with_terminal_keys(mut self, mcc_code: &str, operating_company_id: &str, card_brand: &str) -> Self {
        self.mcc_code = mcc_code.to_string();
        self.operating_company_id = operating_company_id.to_string();
        self.card_brand = card_brand.to_string();
        self
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct PaymentMethodRecord {
    pub id: i64,
    pub name: String,
    pub handler: String,
    pub external_id: String,
    pub params: Json<Vec<PaymentMethodParams>>,
}

impl From<PaymentMethodRecord> for PaymentMethod {
    fn from(record: PaymentMethodRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            handler: record.handler,
            external_id: record.external_id,
            params: record.params.0,
        }
    }
}

//--------------------------------------       Refund        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundStatusType {
    Created,
    InProgress,
    Completed,
    Rejected,
}

impl From<RefundStatus> for RefundStatusType {
    fn from(value: RefundStatus) -> Self {
        match value {
            RefundStatus::Created => Self::Created,
            RefundStatus::InProgress => Self::InProgress,
            RefundStatus::Completed => Self::Completed,
            RefundStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<RefundStatusType> for RefundStatus {
    fn from(value: RefundStatusType) -> Self {
        match value {
            RefundStatusType::Created => Self::Created,
            RefundStatusType::InProgress => Self::InProgress,
            RefundStatusType::Completed => Self::Completed,
            RefundStatusType::Rejected => Self::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Refund {
    pub id: i64,
    pub refund_id: String,
    pub order_id: String,
    pub amount: Amount,
    pub currency: String,
    pub reason: String,
    pub status: RefundStatusType,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    pub fn to_gateway_refund(&self) -> GatewayRefund {
        GatewayRefund {
            refund_id: self.refund_id.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            reason: self.reason.clone(),
            status: self.status.into(),
            external_id: self.external_id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRefund {
    pub refund_id: String,
    pub order_id: String,
    pub amount: Amount,
    pub currency: String,
    pub reason: String,
}

//--------------------------------------    Subscription     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatusType {
    Pending,
    Active,
    Cancelled,
}

impl From<SubscriptionStatus> for SubscriptionStatusType {
    fn from(value: SubscriptionStatus) -> Self {
        match value {
            SubscriptionStatus::Pending => Self::Pending,
            SubscriptionStatus::Active => Self::Active,
            SubscriptionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<SubscriptionStatusType> for SubscriptionStatus {
    fn from(value: SubscriptionStatusType) -> Self {
        match value {
            SubscriptionStatusType::Pending => Self::Pending,
            SubscriptionStatusType::Active => Self::Active,
            SubscriptionStatusType::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Subscription {
    pub id: i64,
    pub order_id: String,
    pub plan_id: Option<String>,
    pub subscription_id: Option<String>,
    pub amount: Amount,
    pub currency: String,
    pub period: String,
    pub interval_count: i64,
    pub charge_amount: Option<Amount>,
    pub charge_currency: Option<String>,
    pub status: SubscriptionStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn to_gateway_subscription(&self) -> Result<RecurringSubscription, ConversionError> {
        let period = self.period.parse::<RecurringPeriod>().map_err(|e| ConversionError(e.to_string()))?;
        let interval = u32::try_from(self.interval_count).map_err(|e| ConversionError(e.to_string()))?;
        Ok(RecurringSubscription {
            amount: self.amount,
            currency: self.currency.clone(),
            period,
            interval,
            plan_id: self.plan_id.clone(),
            subscription_id: self.subscription_id.clone(),
            charge_amount: self.charge_amount,
            charge_currency: self.charge_currency.clone(),
            status: self.status.into(),
        })
    }
}
