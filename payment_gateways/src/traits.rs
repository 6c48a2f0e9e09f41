use crate::{GatewayError, GatewayOrder, GatewayRefund, GatewayRequest, RecurringSubscription, Requisites};

/// The capability set every payment provider adapter implements.
///
/// Adapters mutate the order, refund or subscription they are handed and leave persistence to the caller. Any call that
/// reaches the network may fail with [`GatewayError::OutcomeUnknown`], in which case the remote side may already have
/// acted and the caller must wait for the webhook rather than assume failure.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// The registry name of this adapter.
    fn name(&self) -> &str;

    /// Creates a payment at the provider and returns the URL of the hosted payment page.
    ///
    /// The order moves to [`crate::PaymentStatus::Processing`] when the provider accepts the request.
    async fn create_payment(
        &self,
        order: &mut GatewayOrder,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, GatewayError>;

    /// Applies a payment webhook to the order.
    ///
    /// The signature is checked against `request.raw` before anything else is read. A callback for an order that is
    /// already in a terminal state is accepted and changes nothing.
    async fn process_payment(&self, order: &mut GatewayOrder, request: &GatewayRequest) -> Result<(), GatewayError>;

    /// Requests a refund for a paid order. On success the refund moves to `in_progress` and carries the provider's
    /// refund id.
    async fn create_refund(&self, order: &GatewayOrder, refund: &mut GatewayRefund) -> Result<(), GatewayError>;

    /// Applies a refund webhook to the refund record, with the same verification discipline as
    /// [`PaymentGateway::process_payment`].
    async fn process_refund(
        &self,
        order: &GatewayOrder,
        refund: &mut GatewayRefund,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError>;

    /// Ensures a recurring plan exists for the subscription's (amount, currency, period), then creates a subscription
    /// bound to it and returns the redirect URL for the payer.
    async fn create_recurring_subscription(
        &self,
        order: &mut GatewayOrder,
        subscription: &mut RecurringSubscription,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, GatewayError>;

    /// Applies a subscription status webhook to the subscription record, after verifying its signature.
    async fn process_subscription(
        &self,
        order: &GatewayOrder,
        subscription: &mut RecurringSubscription,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError>;

    /// Cancels a subscription at the provider. A subscription the provider no longer knows about counts as cancelled.
    async fn delete_recurring_subscription(
        &self,
        order: &GatewayOrder,
        subscription: &RecurringSubscription,
    ) -> Result<(), GatewayError>;

    /// Structural check: does the webhook body carry recurring payment data?
    fn is_recurring_callback(&self, request: &GatewayRequest) -> bool;

    /// Structural check: does the webhook body carry subscription data?
    fn is_subscription_callback(&self, request: &GatewayRequest) -> bool;

    /// The provider-assigned recurring id in the webhook body, if any.
    fn get_recurring_id(&self, request: &GatewayRequest) -> Option<String>;

    /// The merchant order id the webhook refers to, if any. Used to load the order before verification.
    fn callback_order_id(&self, request: &GatewayRequest) -> Option<String>;
}
