//! CardPay JSON bodies. Field names follow the provider's API and must not be renamed.
use billing_common::Amount;
use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    GatewayError,
    GatewayOrder,
    GatewayRefund,
    PaymentStatus,
    RecurringSubscription,
    RefundStatus,
    Requisites,
    SubscriptionStatus,
};

//------------------------------------------   Requests   ------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    pub id: String,
    pub time: String,
}

impl RequestInfo {
    pub fn new() -> Self {
        let id = format!("{:016x}", rand::random::<u64>());
        let time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self { id, time }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchantOrder {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentData {
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl From<&Requisites> for Customer {
    fn from(requisites: &Requisites) -> Self {
        Self {
            id: requisites.get("customer_id").cloned(),
            email: requisites.get("email").cloned(),
            ip: requisites.get("ip").cloned(),
            locale: requisites.get("locale").cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnUrls {
    pub success_url: String,
    pub decline_url: String,
    pub cancel_url: String,
}

impl ReturnUrls {
    pub fn new(success_url: &str, fail_url: &str) -> Self {
        Self { success_url: success_url.into(), decline_url: fail_url.into(), cancel_url: fail_url.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub request: RequestInfo,
    pub merchant_order: MerchantOrder,
    pub payment_method: String,
    pub payment_data: PaymentData,
    pub customer: Customer,
    pub return_urls: ReturnUrls,
}

impl PaymentRequest {
    pub fn new(order: &GatewayOrder, success_url: &str, fail_url: &str, requisites: &Requisites) -> Self {
        Self {
            request: RequestInfo::new(),
            merchant_order: merchant_order(order),
            payment_method: order.payment_method.external_id.clone(),
            payment_data: PaymentData { currency: order.currency.clone(), amount: order.amount.to_decimal() },
            customer: Customer::from(requisites),
            return_urls: ReturnUrls::new(success_url, fail_url),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanData {
    pub name: String,
    pub period: String,
    pub interval: u32,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringPlanRequest {
    pub request: RequestInfo,
    pub plan_data: PlanData,
}

impl RecurringPlanRequest {
    pub fn new(subscription: &RecurringSubscription) -> Self {
        let name = format!("{} {} every {} {}", subscription.amount, subscription.currency, subscription.interval, subscription.period);
        Self {
            request: RequestInfo::new(),
            plan_data: PlanData {
                name,
                period: subscription.period.to_string(),
                interval: subscription.interval,
                currency: subscription.currency.clone(),
                amount: subscription.amount.to_decimal(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRecurringData {
    pub plan: PlanRef,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    pub request: RequestInfo,
    pub merchant_order: MerchantOrder,
    pub payment_method: String,
    pub recurring_data: SubscriptionRecurringData,
    pub customer: Customer,
    pub return_urls: ReturnUrls,
}

impl SubscriptionRequest {
    pub fn new(
        order: &GatewayOrder,
        subscription: &RecurringSubscription,
        plan_id: &str,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Self {
        Self {
            request: RequestInfo::new(),
            merchant_order: merchant_order(order),
            payment_method: order.payment_method.external_id.clone(),
            recurring_data: SubscriptionRecurringData {
                plan: PlanRef { id: plan_id.to_string() },
                currency: subscription.currency.clone(),
                amount: subscription.amount.to_decimal(),
            },
            customer: Customer::from(requisites),
            return_urls: ReturnUrls::new(success_url, fail_url),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub status_to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelSubscriptionRequest {
    pub request: RequestInfo,
    pub operation: String,
    pub subscription_data: StatusChange,
}

impl CancelSubscriptionRequest {
    pub fn new() -> Self {
        Self {
            request: RequestInfo::new(),
            operation: "CHANGE_STATUS".into(),
            subscription_data: StatusChange { status_to: "CANCELLED".into() },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundData {
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundRequest {
    pub request: RequestInfo,
    pub merchant_order: MerchantOrder,
    pub payment_data: PaymentRef,
    pub refund_data: RefundData,
}

impl RefundRequest {
    pub fn new(order: &GatewayOrder, payment_id: &str, refund: &GatewayRefund) -> Self {
        Self {
            request: RequestInfo::new(),
            merchant_order: MerchantOrder { id: order.order_id.clone(), description: refund.reason.clone() },
            payment_data: PaymentRef { id: payment_id.to_string() },
            refund_data: RefundData { currency: refund.currency.clone(), amount: refund.amount.to_decimal() },
        }
    }
}

fn merchant_order(order: &GatewayOrder) -> MerchantOrder {
    MerchantOrder { id: order.order_id.clone(), description: order.description.clone() }
}

//------------------------------------------   Responses  ------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectResponse {
    pub redirect_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanInfo {
    pub id: String,
    pub status: String,
}

impl PlanInfo {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurringPlanResponse {
    pub plan_data: PlanInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionInfo {
    pub id: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionResponse {
    pub redirect_url: String,
    #[serde(default)]
    pub subscription_data: Option<SubscriptionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundInfo {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundResponse {
    pub refund_data: RefundInfo,
}

//------------------------------------------   Callbacks  ------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackOrder {
    pub id: String,
}

/// The money movement reported by a callback. Used for `payment_data`, `refund_data` and `recurring_data` alike.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackTransaction {
    pub id: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub decline_reason: Option<String>,
}

impl CallbackTransaction {
    pub fn amount(&self) -> Result<Amount, GatewayError> {
        Amount::try_from(self.amount).map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self.status.to_ascii_uppercase().as_str() {
            "COMPLETED" => PaymentStatus::Paid,
            "DECLINED" | "CANCELLED" | "VOIDED" => PaymentStatus::Rejected,
            "REFUNDED" => PaymentStatus::Refunded,
            _ => PaymentStatus::Processing,
        }
    }

    pub fn refund_status(&self) -> RefundStatus {
        match self.status.to_ascii_uppercase().as_str() {
            "COMPLETED" => RefundStatus::Completed,
            "DECLINED" | "CANCELLED" | "VOIDED" => RefundStatus::Rejected,
            _ => RefundStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackSubscription {
    pub id: String,
    pub status: String,
}

impl CallbackSubscription {
    pub fn subscription_status(&self) -> SubscriptionStatus {
        match self.status.to_ascii_uppercase().as_str() {
            "ACTIVE" => SubscriptionStatus::Active,
            "CANCELLED" | "TERMINATED" | "EXPIRED" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardAccount {
    #[serde(default)]
    pub masked_pan: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Callback {
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub merchant_order: Option<CallbackOrder>,
    #[serde(default)]
    pub payment_data: Option<CallbackTransaction>,
    #[serde(default)]
    pub recurring_data: Option<CallbackTransaction>,
    #[serde(default)]
    pub refund_data: Option<CallbackTransaction>,
    #[serde(default)]
    pub subscription_data: Option<CallbackSubscription>,
    #[serde(default)]
    pub card_account: Option<CardAccount>,
}

impl Callback {
    pub fn parse(raw: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(raw).map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }

    /// The payment part of the callback. Recurring charges report it under `recurring_data`.
    pub fn payment(&self) -> Result<&CallbackTransaction, GatewayError> {
        self.payment_data
            .as_ref()
            .or(self.recurring_data.as_ref())
            .ok_or_else(|| GatewayError::InvalidPayload("The callback carries no payment data".into()))
    }

    pub fn refund(&self) -> Result<&CallbackTransaction, GatewayError> {
        self.refund_data
            .as_ref()
            .ok_or_else(|| GatewayError::InvalidPayload("The callback carries no refund data".into()))
    }

    pub fn masked_pan(&self) -> Option<String> {
        self.card_account.as_ref().and_then(|c| c.masked_pan.clone())
    }
}
