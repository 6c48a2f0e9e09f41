//! An in-process gateway for development and test environments.
//!
//! It never touches the network. Its behaviour is fixed by [`MockOutcome`], and its callbacks use a flat JSON body
//! signed with the same scheme as CardPay, keyed by the gateway's own callback secret.
use billing_common::{Amount, Secret};
use chrono::Utc;
use log::*;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    signer::{CallbackSigner, Sha512Signer},
    GatewayError,
    GatewayOrder,
    GatewayRefund,
    GatewayRequest,
    PaymentGateway,
    PaymentStatus,
    RecurringSubscription,
    RefundStatus,
    Requisites,
    SubscriptionStatus,
    MOCK_GATEWAY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockOutcome {
    /// Every outbound call is accepted.
    #[default]
    Succeed,
    /// Outbound calls are accepted, but recurring plans come back inactive.
    Decline,
    /// Every outbound call fails as if the provider returned an error status.
    Fail,
}

#[derive(Debug, Clone)]
pub struct MockGateway {
    outcome: MockOutcome,
    callback_secret: Secret<String>,
}

#[derive(Debug, Deserialize)]
struct MockCallback {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    refund_id: Option<String>,
    #[serde(default)]
    subscription_id: Option<String>,
    #[serde(default)]
    recurring_id: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    status: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    amount: Option<Decimal>,
    #[serde(default)]
    currency: Option<String>,
}

impl MockCallback {
    fn parse(raw: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(raw).map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }

    fn amount(&self) -> Result<Option<Amount>, GatewayError> {
        self.amount
            .map(Amount::try_from)
            .transpose()
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }
}

impl MockGateway {
    pub fn new(outcome: MockOutcome, callback_secret: Secret<String>) -> Self {
        Self { outcome, callback_secret }
    }

    pub fn outcome(&self) -> MockOutcome {
        self.outcome
    }

    /// Signs a callback body the way this gateway expects it to be signed.
    pub fn sign(&self, raw: &[u8]) -> String {
        Sha512Signer.sign(raw, self.callback_secret.reveal())
    }

    fn verify(&self, request: &GatewayRequest) -> Result<(), GatewayError> {
        if Sha512Signer.verify(&request.raw, self.callback_secret.reveal(), &request.signature) {
            Ok(())
        } else {
            warn!("💳️ Mock gateway callback rejected. The signature does not match the body.");
            Err(GatewayError::RequestSignatureIsInvalid)
        }
    }

    fn outbound(&self, action: &str) -> Result<(), GatewayError> {
        match self.outcome {
            MockOutcome::Fail => Err(GatewayError::CreateRequestFailed(format!("mock {action} failed"))),
            _ => Ok(()),
        }
    }
}

impl PaymentGateway for MockGateway {
    fn name(&self) -> &str {
        MOCK_GATEWAY
    }

    async fn create_payment(
        &self,
        order: &mut GatewayOrder,
        success_url: &str,
        _fail_url: &str,
        _requisites: &Requisites,
    ) -> Result<String, GatewayError> {
        self.outbound("create_payment")?;
        order.status = PaymentStatus::Processing;
        debug!("💳️ Mock payment created for order {}", order.order_id);
        Ok(format!("mock://checkout/{}?return={success_url}", order.order_id))
    }

    async fn process_payment(&self, order: &mut GatewayOrder, request: &GatewayRequest) -> Result<(), GatewayError> {
        self.verify(request)?;
        if order.status.is_terminal() {
            return Ok(());
        }
        let callback = MockCallback::parse(&request.raw)?;
        if callback.order_id.as_deref().is_some_and(|id| id != order.order_id) {
            return Err(GatewayError::InvalidPayload(format!("The callback is not for order {}", order.order_id)));
        }
        if let Some(currency) = &callback.currency {
            if !currency.eq_ignore_ascii_case(&order.currency) {
                return Err(GatewayError::PaymentCurrencyMismatch);
            }
        }
        if let Some(amount) = callback.amount()? {
            if amount != order.amount {
                return Err(GatewayError::PaymentAmountMismatch);
            }
        }
        order.status = match callback.status.as_str() {
            "paid" => {
                order.paid_at = Some(Utc::now());
                PaymentStatus::Paid
            },
            "rejected" => PaymentStatus::Rejected,
            _ => PaymentStatus::Processing,
        };
        order.payment_method_txn_id = callback.transaction_id.or_else(|| Some(format!("mock-{}", order.order_id)));
        if callback.recurring_id.is_some() {
            order.recurring_id = callback.recurring_id;
        }
        debug!("💳️ Mock callback moved order {} to {}", order.order_id, order.status);
        Ok(())
    }

    async fn create_refund(&self, order: &GatewayOrder, refund: &mut GatewayRefund) -> Result<(), GatewayError> {
        self.outbound("refund")?;
        refund.external_id = Some(format!("mock-refund-{}", refund.refund_id));
        refund.status = RefundStatus::InProgress;
        debug!("💳️ Mock refund {} requested for order {}", refund.refund_id, order.order_id);
        Ok(())
    }

    async fn process_refund(
        &self,
        _order: &GatewayOrder,
        refund: &mut GatewayRefund,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError> {
        self.verify(request)?;
        if refund.status.is_terminal() {
            return Ok(());
        }
        let callback = MockCallback::parse(&request.raw)?;
        if callback.refund_id.as_deref().is_some_and(|id| id != refund.refund_id) {
            return Err(GatewayError::RefundMismatch);
        }
        if callback.currency.as_deref().is_some_and(|c| !c.eq_ignore_ascii_case(&refund.currency)) {
            return Err(GatewayError::RefundCurrencyMismatch);
        }
        if callback.amount()?.is_some_and(|a| a != refund.amount) {
            return Err(GatewayError::RefundAmountMismatch);
        }
        refund.status = match callback.status.as_str() {
            "completed" => RefundStatus::Completed,
            "rejected" => RefundStatus::Rejected,
            _ => RefundStatus::InProgress,
        };
        Ok(())
    }

    async fn create_recurring_subscription(
        &self,
        order: &mut GatewayOrder,
        subscription: &mut RecurringSubscription,
        success_url: &str,
        _fail_url: &str,
        _requisites: &Requisites,
    ) -> Result<String, GatewayError> {
        self.outbound("create_recurring_plan")?;
        if self.outcome == MockOutcome::Decline {
            return Err(GatewayError::CreateRecurringPlanFailed);
        }
        let plan_id =
            subscription.plan_id.clone().unwrap_or_else(|| format!("mock-plan-{}-{}", subscription.currency, subscription.period));
        subscription.plan_id = Some(plan_id);
        subscription.subscription_id = Some(format!("mock-sub-{}", order.order_id));
        subscription.charge_amount = Some(subscription.amount);
        subscription.charge_currency = Some(subscription.currency.clone());
        order.status = PaymentStatus::Processing;
        Ok(format!("mock://subscribe/{}?return={success_url}", order.order_id))
    }

    async fn process_subscription(
        &self,
        _order: &GatewayOrder,
        subscription: &mut RecurringSubscription,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError> {
        self.verify(request)?;
        if subscription.status.is_terminal() {
            return Ok(());
        }
        let callback = MockCallback::parse(&request.raw)?;
        if callback.subscription_id.is_some() {
            subscription.subscription_id = callback.subscription_id;
        }
        subscription.status = match callback.status.as_str() {
            "active" => SubscriptionStatus::Active,
            "cancelled" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Pending,
        };
        Ok(())
    }

    async fn delete_recurring_subscription(
        &self,
        order: &GatewayOrder,
        _subscription: &RecurringSubscription,
    ) -> Result<(), GatewayError> {
        debug!("💳️ Mock subscription for order {} cancelled", order.order_id);
        Ok(())
    }

    fn is_recurring_callback(&self, request: &GatewayRequest) -> bool {
        request.has_member("recurring_id")
    }

    fn is_subscription_callback(&self, request: &GatewayRequest) -> bool {
        request.has_member("subscription_id")
    }

    fn get_recurring_id(&self, request: &GatewayRequest) -> Option<String> {
        request.json().and_then(|v| v["recurring_id"].as_str().map(String::from))
    }

    fn callback_order_id(&self, request: &GatewayRequest) -> Option<String> {
        request.json().and_then(|v| v["order_id"].as_str().map(String::from))
    }
}
