use std::{collections::HashMap, fmt::Display, str::FromStr};

use billing_common::{Amount, Secret};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GatewayError;

/// Free-form payer details supplied at checkout (e-mail, IP address, locale, customer id).
pub type Requisites = HashMap<String, String>;

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The order exists but no payment has been attempted.
    Created,
    /// A payment was started at the gateway and no final answer has arrived yet.
    Processing,
    Paid,
    Rejected,
    Refunded,
}

impl PaymentStatus {
    /// Callbacks against an order in a terminal state are ignored.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected | Self::Refunded)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Processing => write!(f, "processing"),
            Self::Paid => write!(f, "paid"),
            Self::Rejected => write!(f, "rejected"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

//--------------------------------------    RefundStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Created,
    InProgress,
    Completed,
    Rejected,
}

impl RefundStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

//--------------------------------------  PaymentMethodParams ---------------------------------------------------------
/// One row of a payment method's terminal table.
///
/// Rows are keyed by (currency, MCC code, operating company, card brand). An empty `brand` marks the fallback row for
/// the other three keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMethodParams {
    pub currency: String,
    pub mcc_code: String,
    pub operating_company_id: String,
    #[serde(default)]
    pub brand: String,
    pub terminal_id: String,
    pub secret: Secret<String>,
    pub secret_callback: Secret<String>,
    pub api_url: String,
}

/// The credential set a gateway call runs with, once resolved from the payment method's parameter table.
#[derive(Debug, Clone)]
pub struct TerminalCredentials {
    pub terminal_id: String,
    pub secret: Secret<String>,
    pub secret_callback: Secret<String>,
    pub api_url: String,
}

impl From<&PaymentMethodParams> for TerminalCredentials {
    fn from(params: &PaymentMethodParams) -> Self {
        Self {
            terminal_id: params.terminal_id.clone(),
            secret: params.secret.clone(),
            secret_callback: params.secret_callback.clone(),
            api_url: params.api_url.clone(),
        }
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    /// The name of the gateway handler in the [`crate::GatewayRegistry`], e.g. `cardpay`.
    pub handler: String,
    /// The provider's own name for the method, e.g. `BANKCARD`.
    pub external_id: String,
    pub params: Vec<PaymentMethodParams>,
}

impl PaymentMethod {
    /// Finds the terminal row for the given keys. A row with an exactly matching brand wins; otherwise the row with
    /// an empty brand is used.
    pub fn find_params(
        &self,
        currency: &str,
        mcc_code: &str,
        operating_company_id: &str,
        brand: &str,
    ) -> Option<&PaymentMethodParams> {
        let candidates = self.params.iter().filter(|p| {
            p.currency.eq_ignore_ascii_case(currency) &&
                p.mcc_code == mcc_code &&
                p.operating_company_id == operating_company_id
        });
        let mut fallback = None;
        for p in candidates {
            if !brand.is_empty() && p.brand.eq_ignore_ascii_case(brand) {
                return Some(p);
            }
            if p.brand.is_empty() && fallback.is_none() {
                fallback = Some(p);
            }
        }
        fallback
    }

    pub fn credentials_for(&self, order: &GatewayOrder) -> Result<TerminalCredentials, GatewayError> {
        self.find_params(&order.currency, &order.mcc_code, &order.operating_company_id, &order.card_brand)
            .map(TerminalCredentials::from)
            .ok_or(GatewayError::UnknownPaymentMethod)
    }
}

//--------------------------------------     GatewayOrder    ---------------------------------------------------------
/// The view of an order that a gateway adapter works on.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    /// The public order identifier; sent to the provider as the merchant order id.
    pub order_id: String,
    pub description: String,
    pub amount: Amount,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub mcc_code: String,
    pub operating_company_id: String,
    /// Empty until the payer's card brand is known.
    pub card_brand: String,
    pub status: PaymentStatus,
    pub payment_method_txn_id: Option<String>,
    pub masked_pan: Option<String>,
    pub recurring_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
}

//--------------------------------------     GatewayRefund   ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct GatewayRefund {
    pub refund_id: String,
    pub amount: Amount,
    pub currency: String,
    pub reason: String,
    pub status: RefundStatus,
    /// The provider's refund id, known once the refund request has been accepted.
    pub external_id: Option<String>,
}

//--------------------------------------  RecurringSubscription ------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl Display for RecurringPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
        }
    }
}

impl FromStr for RecurringPeriod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(GatewayError::InvalidPayload(format!("Unknown recurring period: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    /// A cancelled subscription is never revived by a callback.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone)]
pub struct RecurringSubscription {
    pub amount: Amount,
    pub currency: String,
    pub period: RecurringPeriod,
    pub interval: u32,
    /// Provider-assigned plan id. If set before creation, the adapter checks that plan instead of creating a new one.
    pub plan_id: Option<String>,
    pub subscription_id: Option<String>,
    pub charge_amount: Option<Amount>,
    pub charge_currency: Option<String>,
    pub status: SubscriptionStatus,
}

impl RecurringSubscription {
    pub fn new(amount: Amount, currency: &str, period: RecurringPeriod) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
            period,
            interval: 1,
            plan_id: None,
            subscription_id: None,
            charge_amount: None,
            charge_currency: None,
            status: SubscriptionStatus::Pending,
        }
    }
}

//--------------------------------------    GatewayRequest   ---------------------------------------------------------
/// An inbound webhook: the body exactly as received, plus the signature delivered alongside it.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub raw: Vec<u8>,
    pub signature: String,
}

impl GatewayRequest {
    pub fn new<B: Into<Vec<u8>>, S: Into<String>>(raw: B, signature: S) -> Self {
        Self { raw: raw.into(), signature: signature.into() }
    }

    /// Parses the body into an untyped JSON tree. Used only for structural classification; the typed parse happens
    /// inside each adapter after the signature has been checked.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.raw).ok()
    }

    /// True if the body is a JSON object with a non-null member called `key`.
    pub fn has_member(&self, key: &str) -> bool {
        self.json().map(|v| !v[key].is_null()).unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(currency: &str, brand: &str, terminal: &str) -> PaymentMethodParams {
        PaymentMethodParams {
            currency: currency.into(),
            mcc_code: "5816".into(),
            operating_company_id: "oc-1".into(),
            brand: brand.into(),
            terminal_id: terminal.into(),
            secret: Secret::new("s".into()),
            secret_callback: Secret::new("cb".into()),
            api_url: "https://sandbox.cardpay.com".into(),
        }
    }

    fn method() -> PaymentMethod {
        PaymentMethod {
            id: 1,
            name: "Bank card".into(),
            handler: "cardpay".into(),
            external_id: "BANKCARD".into(),
            params: vec![params("RUB", "", "t-rub"), params("RUB", "VISA", "t-rub-visa"), params("USD", "", "t-usd")],
        }
    }

    #[test]
    fn exact_brand_wins() {
        let m = method();
        assert_eq!(m.find_params("RUB", "5816", "oc-1", "visa").unwrap().terminal_id, "t-rub-visa");
    }

    #[test]
    fn empty_brand_is_the_fallback() {
        let m = method();
        assert_eq!(m.find_params("RUB", "5816", "oc-1", "").unwrap().terminal_id, "t-rub");
        assert_eq!(m.find_params("RUB", "5816", "oc-1", "MASTERCARD").unwrap().terminal_id, "t-rub");
    }

    #[test]
    fn unknown_keys_resolve_nothing() {
        let m = method();
        assert!(m.find_params("EUR", "5816", "oc-1", "").is_none());
        assert!(m.find_params("RUB", "5999", "oc-1", "").is_none());
        assert!(m.find_params("USD", "5816", "oc-2", "").is_none());
    }

    #[test]
    fn member_detection() {
        let req = GatewayRequest::new(r#"{"recurring_data":{"id":"r1"},"payment_data":null}"#, "");
        assert!(req.has_member("recurring_data"));
        assert!(!req.has_member("payment_data"));
        assert!(!GatewayRequest::new("not json", "").has_member("recurring_data"));
    }
}
