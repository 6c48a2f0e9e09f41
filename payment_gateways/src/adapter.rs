use crate::{
    transport::{HttpTransport, ReqwestTransport},
    CardPayGateway,
    GatewayError,
    GatewayOrder,
    GatewayRefund,
    GatewayRequest,
    MockGateway,
    PaymentGateway,
    RecurringSubscription,
    Requisites,
};

/// The closed set of gateway adapters the registry can hand out.
pub enum GatewayAdapter<T = ReqwestTransport> {
    CardPay(CardPayGateway<T>),
    Mock(MockGateway),
}

macro_rules! dispatch {
    ($self:ident, $gw:ident => $call:expr) => {
        match $self {
            GatewayAdapter::CardPay($gw) => $call,
            GatewayAdapter::Mock($gw) => $call,
        }
    };
}

impl<T: HttpTransport> PaymentGateway for GatewayAdapter<T> {
    fn name(&self) -> &str {
        dispatch!(self, gw => gw.name())
    }

    async fn create_payment(
        &self,
        order: &mut GatewayOrder,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, GatewayError> {
        dispatch!(self, gw => gw.create_payment(order, success_url, fail_url, requisites).await)
    }

    async fn process_payment(&self, order: &mut GatewayOrder, request: &GatewayRequest) -> Result<(), GatewayError> {
        dispatch!(self, gw => gw.process_payment(order, request).await)
    }

    async fn create_refund(&self, order: &GatewayOrder, refund: &mut GatewayRefund) -> Result<(), GatewayError> {
        dispatch!(self, gw => gw.create_refund(order, refund).await)
    }

    async fn process_refund(
        &self,
        order: &GatewayOrder,
        refund: &mut GatewayRefund,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError> {
        dispatch!(self, gw => gw.process_refund(order, refund, request).await)
    }

    async fn create_recurring_subscription(
        &self,
        order: &mut GatewayOrder,
        subscription: &mut RecurringSubscription,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, GatewayError> {
        dispatch!(self, gw => gw.create_recurring_subscription(order, subscription, success_url, fail_url, requisites).await)
    }

    async fn process_subscription(
        &self,
        order: &GatewayOrder,
        subscription: &mut RecurringSubscription,
        request: &GatewayRequest,
    ) -> Result<(), GatewayError> {
        dispatch!(self, gw => gw.process_subscription(order, subscription, request).await)
    }

    async fn delete_recurring_subscription(
        &self,
        order: &GatewayOrder,
        subscription: &RecurringSubscription,
    ) -> Result<(), GatewayError> {
        dispatch!(self, gw => gw.delete_recurring_subscription(order, subscription).await)
    }

    fn is_recurring_callback(&self, request: &GatewayRequest) -> bool {
        dispatch!(self, gw => gw.is_recurring_callback(request))
    }

    fn is_subscription_callback(&self, request: &GatewayRequest) -> bool {
        dispatch!(self, gw => gw.is_subscription_callback(request))
    }

    fn get_recurring_id(&self, request: &GatewayRequest) -> Option<String> {
        dispatch!(self, gw => gw.get_recurring_id(request))
    }

    fn callback_order_id(&self, request: &GatewayRequest) -> Option<String> {
        dispatch!(self, gw => gw.callback_order_id(request))
    }
}
