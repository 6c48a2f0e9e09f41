//! The CardPay adapter.
//!
//! Every outbound call resolves terminal credentials from the order's payment method, authenticates with the
//! [`CallbackSigner`] and goes through the [`HttpTransport`] seam. Every inbound callback is verified against the raw
//! bytes before it is parsed.
mod actions;
mod wire;

pub use actions::{ActionRoute, CardPayAction};
use billing_common::Amount;
use chrono::Utc;
use log::*;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    signer::{CallbackSigner, Sha512Signer},
    transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport},
    GatewayError,
    GatewayOrder,
    GatewayRefund,
    GatewayRequest,
    PaymentGateway,
    PaymentStatus,
    RecurringSubscription,
    RefundStatus,
    Requisites,
    TerminalCredentials,
    CARDPAY_GATEWAY,
};
use wire::*;

#[derive(Clone)]
pub struct CardPayGateway<T = ReqwestTransport, S = Sha512Signer> {
    transport: T,
    signer: S,
}

impl<T: HttpTransport> CardPayGateway<T, Sha512Signer> {
    pub fn new(transport: T) -> Self {
        Self::with_signer(transport, Sha512Signer)
    }
}

impl<T, S> CardPayGateway<T, S>
where
    T: HttpTransport,
    S: CallbackSigner,
{
    pub fn with_signer(transport: T, signer: S) -> Self {
        Self { transport, signer }
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Sends one authenticated request and returns the raw response, whatever its status.
    async fn send<B: Serialize>(
        &self,
        credentials: &TerminalCredentials,
        action: CardPayAction,
        params: &[&str],
        body: Option<&B>,
    ) -> Result<HttpResponse, GatewayError> {
        let (method, url) = action.build_url(&credentials.api_url, params)?;
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))?;
        let request = HttpRequest { method, url, authorization: self.signer.authorization(credentials), body };
        debug!("💳️ CardPay {action} via terminal {}", credentials.terminal_id);
        Ok(self.transport.send(request).await?)
    }

    /// Sends one authenticated request and decodes a successful JSON response.
    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        credentials: &TerminalCredentials,
        action: CardPayAction,
        params: &[&str],
        body: Option<&B>,
    ) -> Result<R, GatewayError> {
        let response = self.send(credentials, action, params, body).await?;
        if !response.is_success() {
            warn!("💳️ CardPay {action} failed with status {}: {}", response.status, response.body_text());
            return Err(GatewayError::CreateRequestFailed(format!(
                "CardPay {action} returned status {}",
                response.status
            )));
        }
        serde_json::from_slice(&response.body).map_err(|e| {
            warn!("💳️ CardPay {action} returned an unreadable body: {e}");
            GatewayError::CreateRequestFailed(format!("CardPay {action} returned an unreadable body. {e}"))
        })
    }

    fn verify(&self, credentials: &TerminalCredentials, request: &GatewayRequest) -> Result<(), GatewayError> {
        if self.signer.verify(&request.raw, credentials.secret_callback.reveal(), &request.signature) {
            Ok(())
        } else {
            warn!("💳️ CardPay callback rejected. The signature does not match the body.");
            Err(GatewayError::RequestSignatureIsInvalid)
        }
    }

    /// Returns the active plan for the subscription, fetching the configured one or creating a new one.
    async fn ensure_plan(
        &self,
        credentials: &TerminalCredentials,
        subscription: &RecurringSubscription,
    ) -> Result<String, GatewayError> {
        let response: RecurringPlanResponse = match &subscription.plan_id {
            Some(plan_id) => {
                self.call::<(), _>(credentials, CardPayAction::GetRecurringPlan, &[plan_id.as_str()], None).await?
            },
            None => {
                let body = RecurringPlanRequest::new(subscription);
                self.call(credentials, CardPayAction::CreateRecurringPlan, &[], Some(&body)).await?
            },
        };
        if !response.plan_data.is_active() {
            warn!(
                "💳️ CardPay recurring plan {} is not active (status {})",
                response.plan_data.id, response.plan_data.status
            );
            return Err(GatewayError::CreateRecurringPlanFailed);
        }
        Ok(response.plan_data.id)
    }
}

fn check_order_id(order: &GatewayOrder, callback: &Callback) -> Result<(), GatewayError> {
    match &callback.merchant_order {
        Some(o) if o.id != order.order_id => Err(GatewayError::InvalidPayload(format!(
            "The callback refers to order {}, not {}",
            o.id, order.order_id
        ))),
        _ => Ok(()),
    }
}

fn json_str(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl<T, S> PaymentGateway for CardPayGateway<T, S>
where
    T: HttpTransport,
    S: CallbackSigner,
{
    fn name(&self) -> &str {
        CARDPAY_GATEWAY
    }

    async fn create_payment(
        &self,
        order: &mut GatewayOrder,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, GatewayError> {
        let credentials = order.payment_method.credentials_for(order)?;
        let body = PaymentRequest::new(order, success_url, fail_url, requisites);
        let response: RedirectResponse =
            self.call(&credentials, CardPayAction::CreatePayment, &[], Some(&body)).await?;
        order.status = PaymentStatus::Processing;
        info!("💳️ CardPay payment created for order {}", order.order_id);
        Ok(response.redirect_url)
    }

    async fn process_payment(&self, order: &mut GatewayOrder, request: &GatewayRequest) -> Result<(), GatewayError> {
        let credentials = order.payment_method.credentials_for(order)?;
        self.verify(&credentials, request)?;
        if order.status.is_terminal() {
            debug!("💳️ Order {} is already {}. Ignoring the callback.", order.order_id, order.status);
            return Ok(());
        }
        let callback = Callback::parse(&request.raw)?;
        check_order_id(order, &callback)?;
        let payment = callback.payment()?;
        if let Some(method) = &callback.payment_method {
            if !method.eq_ignore_ascii_case(&order.payment_method.external_id) {
                warn!("💳️ Order {}: callback payment method {method} does not match", order.order_id);
                return Err(GatewayError::PaymentMethodMismatch);
            }
        }
        if !payment.currency.eq_ignore_ascii_case(&order.currency) {
            warn!("💳️ Order {}: callback currency {} does not match {}", order.order_id, payment.currency, order.currency);
            return Err(GatewayError::PaymentCurrencyMismatch);
        }
        let amount = payment.amount()?;
        if amount != order.amount {
            warn!("💳️ Order {}: callback amount {amount} does not match {}", order.order_id, order.amount);
            return Err(GatewayError::PaymentAmountMismatch);
        }
        let status = payment.payment_status();
        order.payment_method_txn_id = Some(payment.id.clone());
        if let Some(pan) = callback.masked_pan() {
            order.masked_pan = Some(pan);
        }
        if let Some(recurring) = &callback.recurring_data {
            order.recurring_id = Some(recurring.id.clone());
        }
        match status {
            PaymentStatus::Paid => order.paid_at = Some(Utc::now()),
            PaymentStatus::Rejected => order.decline_reason = payment.decline_reason.clone(),
            _ => {},
        }
        order.status = status;
        info!("💳️ Order {} is now {status} (CardPay transaction {})", order.order_id, payment.id);
        Ok(())
    }

    async fn create_refund(&self, order: &GatewayOrder, refund: &mut GatewayRefund) -> Result<(), GatewayError> {
        let credentials = order.payment_method.credentials_for(order)?;
        let payment_id = order.payment_method_txn_id.as_deref().ok_or_else(|| {
            GatewayError::InvalidPayload(format!("Order {} has no CardPay payment to refund", order.order_id))
        })?;
        let body = RefundRequest::new(order, payment_id, refund);
        let response: RefundResponse = self.call(&credentials, CardPayAction::Refund, &[], Some(&body)).await?;
        refund.external_id = Some(response.refund_data.id);
        refund.status = RefundStatus::InProgress;
        info!("💳️ CardPay refund {} requested for order {}", refund.refund_id, order.order_id);
        Ok(())
    }

    async fn process_refund(
        &self,
        order: &GatewayOrder,
        refund: &mut GatewayRefund,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError> {
        let credentials = order.payment_method.credentials_for(order)?;
        self.verify(&credentials, request)?;
        if refund.status.is_terminal() {
            debug!("💳️ Refund {} is already settled. Ignoring the callback.", refund.refund_id);
            return Ok(());
        }
        let callback = Callback::parse(&request.raw)?;
        check_order_id(order, &callback)?;
        let data = callback.refund()?;
        if let Some(id) = &refund.external_id {
            if id != &data.id {
                warn!("💳️ Refund {}: callback is for CardPay refund {}, expected {id}", refund.refund_id, data.id);
                return Err(GatewayError::RefundMismatch);
            }
        }
        if !data.currency.eq_ignore_ascii_case(&refund.currency) {
            return Err(GatewayError::RefundCurrencyMismatch);
        }
        if data.amount()? != refund.amount {
            return Err(GatewayError::RefundAmountMismatch);
        }
        refund.external_id = Some(data.id.clone());
        refund.status = data.refund_status();
        info!("💳️ Refund {} is now {:?}", refund.refund_id, refund.status);
        Ok(())
    }

    async fn create_recurring_subscription(
        &self,
        order: &mut GatewayOrder,
        subscription: &mut RecurringSubscription,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, GatewayError> {
        let credentials = order.payment_method.credentials_for(order)?;
        let plan_id = self.ensure_plan(&credentials, subscription).await?;
        let body = SubscriptionRequest::new(order, subscription, &plan_id, success_url, fail_url, requisites);
        let response: SubscriptionResponse =
            self.call(&credentials, CardPayAction::CreateRecurringSubscription, &[], Some(&body)).await?;
        let info = response.subscription_data;
        subscription.plan_id = Some(plan_id);
        subscription.subscription_id = info.as_ref().map(|s| s.id.clone());
        subscription.charge_amount = match info.as_ref().and_then(|s| s.amount) {
            Some(amount) => Some(Amount::try_from(amount).map_err(|e| GatewayError::InvalidPayload(e.to_string()))?),
            None => Some(subscription.amount),
        };
        subscription.charge_currency =
            Some(info.and_then(|s| s.currency).unwrap_or_else(|| subscription.currency.clone()));
        order.status = PaymentStatus::Processing;
        info!("💳️ CardPay subscription created for order {}", order.order_id);
        Ok(response.redirect_url)
    }

    async fn process_subscription(
        &self,
        order: &GatewayOrder,
        subscription: &mut RecurringSubscription,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError> {
        let credentials = order.payment_method.credentials_for(order)?;
        self.verify(&credentials, request)?;
        if subscription.status.is_terminal() {
            debug!("💳️ The subscription for order {} is already cancelled. Ignoring the callback.", order.order_id);
            return Ok(());
        }
        let callback = Callback::parse(&request.raw)?;
        check_order_id(order, &callback)?;
        let data = callback
            .subscription_data
            .as_ref()
            .ok_or_else(|| GatewayError::InvalidPayload("The callback carries no subscription data".into()))?;
        subscription.subscription_id = Some(data.id.clone());
        subscription.status = data.subscription_status();
        debug!("💳️ Subscription {} is now {:?}", data.id, subscription.status);
        Ok(())
    }

    async fn delete_recurring_subscription(
        &self,
        order: &GatewayOrder,
        subscription: &RecurringSubscription,
    ) -> Result<(), GatewayError> {
        let Some(subscription_id) = subscription.subscription_id.as_deref() else {
            debug!("💳️ Order {} has no remote subscription to cancel", order.order_id);
            return Ok(());
        };
        let credentials = order.payment_method.credentials_for(order)?;
        let body = CancelSubscriptionRequest::new();
        let response =
            self.send(&credentials, CardPayAction::DeleteRecurringSubscription, &[subscription_id], Some(&body)).await?;
        match response.status {
            404 => {
                debug!("💳️ CardPay subscription {subscription_id} is already gone");
                Ok(())
            },
            _ if response.is_success() => {
                info!("💳️ CardPay subscription {subscription_id} cancelled");
                Ok(())
            },
            status => {
                warn!("💳️ Cancelling CardPay subscription {subscription_id} failed with status {status}");
                Err(GatewayError::CreateRequestFailed(format!(
                    "CardPay {} returned status {status}",
                    CardPayAction::DeleteRecurringSubscription
                )))
            },
        }
    }

    fn is_recurring_callback(&self, request: &GatewayRequest) -> bool {
        request.has_member("recurring_data")
    }

    fn is_subscription_callback(&self, request: &GatewayRequest) -> bool {
        request.has_member("subscription_data")
    }

    fn get_recurring_id(&self, request: &GatewayRequest) -> Option<String> {
        request.json().and_then(|v| json_str(&v["recurring_data"]["id"]))
    }

    fn callback_order_id(&self, request: &GatewayRequest) -> Option<String> {
        request.json().and_then(|v| json_str(&v["merchant_order"]["id"]))
    }
}
