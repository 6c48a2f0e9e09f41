use std::fmt::Debug;

use billing_common::Amount;
use chrono::Utc;
use log::*;
use payment_gateways::{
    transport::{HttpTransport, ReqwestTransport},
    GatewayAdapter,
    GatewayOrder,
    GatewayRegistry,
    GatewayRequest,
    PaymentGateway,
    PaymentStatus,
    RecurringSubscription,
    RefundStatus,
    Requisites,
    SubscriptionStatus,
};

use crate::{
    billing_api::{ledger_api::prepare_entry, PaymentFlowError},
    db_types::{
        EntrySource,
        EntryType,
        NewAccountingEntry,
        Order,
        OrderStatusType,
        Refund,
        RefundStatusType,
        Subscription,
    },
    traits::{ExchangeRates, MerchantRepository, PaymentFlowDatabase},
};

/// What a webhook did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The order changed state. `ledger_entry` is true when the callback settled the order as paid.
    Payment { order: Order, ledger_entry: bool },
    /// The order was already settled, so the callback changed nothing.
    AlreadySettled(Order),
    /// A subscription status callback was applied to the order's subscription.
    Subscription(Subscription),
}

/// `PaymentFlowApi` binds the gateway registry to storage.
///
/// Gateways only ever mutate in-memory copies of orders, refunds and subscriptions. This API loads those records,
/// routes them to the adapter named by the order's payment method, and persists the outcome. A paid order and its
/// gross revenue ledger entry are written together, and only if the order was not already settled, so a duplicated or
/// replayed webhook can never produce a second entry.
pub struct PaymentFlowApi<B, T = ReqwestTransport> {
    db: B,
    gateways: GatewayRegistry<T>,
}

impl<B, T> Debug for PaymentFlowApi<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B, T> PaymentFlowApi<B, T> {
    pub fn new(db: B, gateways: GatewayRegistry<T>) -> Self {
        Self { db, gateways }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, T> PaymentFlowApi<B, T>
where
    B: PaymentFlowDatabase + MerchantRepository + ExchangeRates,
    T: HttpTransport,
{
    /// Starts a payment for an order in `created` status and returns the hosted payment page URL.
    ///
    /// If the gateway does not answer in time the order is still moved to `processing`: the payment may have been
    /// created remotely, and the webhook will settle it.
    pub async fn create_payment(
        &self,
        order_id: &str,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, PaymentFlowError> {
        let (order, mut gateway_order) = self.load_order(order_id).await?;
        if order.status != OrderStatusType::Created {
            return Err(PaymentFlowError::InvalidOrderStatus { order_id: order.order_id, status: order.status });
        }
        let gateway = self.gateway_for(&gateway_order)?;
        match gateway.create_payment(&mut gateway_order, success_url, fail_url, requisites).await {
            Ok(url) => {
                self.db.update_order_progress(&gateway_order).await?;
                info!("💳️ Payment for order {order_id} created with {}", gateway.name());
                Ok(url)
            },
            Err(e) if e.is_outcome_unknown() => {
                warn!("💳️ Payment request for order {order_id} timed out. Waiting for the gateway's callback. {e}");
                gateway_order.status = PaymentStatus::Processing;
                self.db.update_order_progress(&gateway_order).await?;
                Err(e.into())
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Applies a webhook received by the gateway registered as `gateway_name`.
    ///
    /// Subscription callbacks update the order's subscription record. Everything else is a payment callback: its
    /// signature is verified over the raw body before anything is read or written.
    pub async fn process_callback(
        &self,
        gateway_name: &str,
        request: &GatewayRequest,
    ) -> Result<CallbackOutcome, PaymentFlowError> {
        let gateway = self.gateways.get_gateway(gateway_name)?;
        let order_id = gateway.callback_order_id(request).ok_or(PaymentFlowError::OrderIdMissing)?;
        let (order, mut gateway_order) = self.load_order(&order_id).await?;
        if gateway.is_subscription_callback(request) {
            return self.process_subscription_callback(gateway, &gateway_order, request).await;
        }
        if gateway.is_recurring_callback(request) {
            debug!(
                "💳️ Recurring payment callback for order {order_id} (recurring id {})",
                gateway.get_recurring_id(request).unwrap_or_default()
            );
        }
        let was_settled = gateway_order.status.is_terminal();
        gateway.process_payment(&mut gateway_order, request).await?;
        if was_settled {
            return Ok(CallbackOutcome::AlreadySettled(order));
        }
        if !gateway_order.status.is_terminal() {
            self.db.update_order_progress(&gateway_order).await?;
            let order = self.reload_order(&order_id).await?;
            return Ok(CallbackOutcome::Payment { order, ledger_entry: false });
        }
        let entry = match gateway_order.status {
            PaymentStatus::Paid => Some(self.gross_revenue_entry(&order, &gateway_order).await?),
            _ => None,
        };
        let ledger_entry = entry.is_some();
        if !self.db.settle_order(&gateway_order, entry).await? {
            debug!("💳️ Order {order_id} was settled by a concurrent callback");
            let order = self.reload_order(&order_id).await?;
            return Ok(CallbackOutcome::AlreadySettled(order));
        }
        info!("💳️ Order {order_id} is now {}", gateway_order.status);
        let order = self.reload_order(&order_id).await?;
        Ok(CallbackOutcome::Payment { order, ledger_entry })
    }

    /// Requests a refund at the gateway that took the payment. The order must be paid, and the refund may not take the
    /// order's refunds past its amount. A partially refunded order stays paid, so it can be refunded again.
    pub async fn create_refund(&self, refund_id: &str) -> Result<Refund, PaymentFlowError> {
        let refund = self.load_refund(refund_id).await?;
        let (order, gateway_order) = self.load_order(&refund.order_id).await?;
        if order.status != OrderStatusType::Paid {
            return Err(PaymentFlowError::InvalidOrderStatus { order_id: order.order_id, status: order.status });
        }
        let committed: Amount = self
            .db
            .fetch_refunds_for_order(&order.order_id)
            .await?
            .into_iter()
            .filter(|r| r.refund_id != refund.refund_id)
            .filter(|r| matches!(r.status, RefundStatusType::InProgress | RefundStatusType::Completed))
            .map(|r| r.amount)
            .sum();
        let refundable = order.amount - committed;
        if refund.amount > refundable {
            warn!(
                "💳️ Refund {refund_id} of {} is more than the {refundable} left on order {}",
                refund.amount, order.order_id
            );
            return Err(PaymentFlowError::RefundExceedsOrder {
                refund_id: refund.refund_id,
                order_id: order.order_id,
                refundable,
            });
        }
        let gateway = self.gateway_for(&gateway_order)?;
        let mut gateway_refund = refund.to_gateway_refund();
        gateway.create_refund(&gateway_order, &mut gateway_refund).await?;
        self.db.update_refund_progress(&gateway_refund).await?;
        info!("💳️ Refund {refund_id} for order {} requested", order.order_id);
        self.load_refund(refund_id).await
    }

    /// Applies a refund webhook. A completed refund appends one refund ledger entry and, once the order's completed
    /// refunds cover its amount, marks the order refunded, in the same transaction.
    pub async fn process_refund_callback(
        &self,
        refund_id: &str,
        request: &GatewayRequest,
    ) -> Result<Refund, PaymentFlowError> {
        let refund = self.load_refund(refund_id).await?;
        let (order, mut gateway_order) = self.load_order(&refund.order_id).await?;
        let gateway = self.gateway_for(&gateway_order)?;
        let mut gateway_refund = refund.to_gateway_refund();
        let was_settled = gateway_refund.status.is_terminal();
        gateway.process_refund(&gateway_order, &mut gateway_refund, request).await?;
        if was_settled {
            return Ok(refund);
        }
        match gateway_refund.status {
            RefundStatus::Completed => {
                let entry = NewAccountingEntry::new(
                    EntryType::MerchantRefund,
                    EntrySource::refund(&refund.refund_id),
                    &order.merchant_id,
                    refund.amount,
                    &refund.currency,
                )
                .with_country(&order.country)
                .with_reason(&refund.reason);
                let entry = prepare_entry(&self.db, entry).await?;
                gateway_order.status = PaymentStatus::Refunded;
                self.db.settle_refund(&gateway_refund, Some(&gateway_order), Some(entry)).await?;
            },
            RefundStatus::Rejected => {
                self.db.settle_refund(&gateway_refund, None, None).await?;
            },
            RefundStatus::Created | RefundStatus::InProgress => {
                self.db.update_refund_progress(&gateway_refund).await?;
            },
        }
        self.load_refund(refund_id).await
    }

    /// Creates a recurring subscription for the order and returns the payer's redirect URL. Nothing is stored if the
    /// gateway refuses the plan or the subscription.
    pub async fn create_subscription(
        &self,
        order_id: &str,
        mut subscription: RecurringSubscription,
        success_url: &str,
        fail_url: &str,
        requisites: &Requisites,
    ) -> Result<String, PaymentFlowError> {
        let (_, mut gateway_order) = self.load_order(order_id).await?;
        if self.db.fetch_subscription(order_id).await?.is_some() {
            return Err(PaymentFlowError::SubscriptionAlreadyExists(order_id.to_string()));
        }
        let gateway = self.gateway_for(&gateway_order)?;
        let url = gateway
            .create_recurring_subscription(&mut gateway_order, &mut subscription, success_url, fail_url, requisites)
            .await?;
        self.db.insert_subscription(order_id, &subscription).await?;
        self.db.update_order_progress(&gateway_order).await?;
        info!("💳️ Recurring subscription for order {order_id} created with {}", gateway.name());
        Ok(url)
    }

    /// Cancels the order's subscription at the gateway and marks it cancelled. Cancelling twice is harmless.
    pub async fn delete_subscription(&self, order_id: &str) -> Result<Subscription, PaymentFlowError> {
        let (_, gateway_order) = self.load_order(order_id).await?;
        let stored = self
            .db
            .fetch_subscription(order_id)
            .await?
            .ok_or_else(|| PaymentFlowError::SubscriptionNotFound(order_id.to_string()))?;
        let mut subscription = stored.to_gateway_subscription()?;
        let gateway = self.gateway_for(&gateway_order)?;
        gateway.delete_recurring_subscription(&gateway_order, &subscription).await?;
        subscription.status = SubscriptionStatus::Cancelled;
        let stored = self.db.update_subscription(order_id, &subscription).await?;
        info!("💳️ Recurring subscription for order {order_id} cancelled");
        Ok(stored)
    }

    async fn process_subscription_callback(
        &self,
        gateway: &GatewayAdapter<T>,
        gateway_order: &GatewayOrder,
        request: &GatewayRequest,
    ) -> Result<CallbackOutcome, PaymentFlowError> {
        let order_id = gateway_order.order_id.as_str();
        let stored = self
            .db
            .fetch_subscription(order_id)
            .await?
            .ok_or_else(|| PaymentFlowError::SubscriptionNotFound(order_id.to_string()))?;
        let mut subscription = stored.to_gateway_subscription()?;
        let was_cancelled = subscription.status.is_terminal();
        gateway.process_subscription(gateway_order, &mut subscription, request).await?;
        if was_cancelled {
            debug!("💳️ Subscription for order {order_id} is cancelled. The callback changed nothing.");
            return Ok(CallbackOutcome::Subscription(stored));
        }
        let stored = self.db.update_subscription(order_id, &subscription).await?;
        debug!("💳️ Subscription for order {order_id} is now {:?}", stored.status);
        Ok(CallbackOutcome::Subscription(stored))
    }

    async fn gross_revenue_entry(
        &self,
        order: &Order,
        gateway_order: &GatewayOrder,
    ) -> Result<NewAccountingEntry, PaymentFlowError> {
        let entry = NewAccountingEntry::new(
            EntryType::MerchantGrossRevenue,
            EntrySource::order(&order.order_id),
            &order.merchant_id,
            order.amount,
            &order.currency,
        )
        .with_country(&order.country)
        .with_available_on(gateway_order.paid_at.unwrap_or_else(Utc::now));
        Ok(prepare_entry(&self.db, entry).await?)
    }

    fn gateway_for(&self, order: &GatewayOrder) -> Result<&GatewayAdapter<T>, PaymentFlowError> {
        Ok(self.gateways.get_gateway(&order.payment_method.handler)?)
    }

    async fn load_order(&self, order_id: &str) -> Result<(Order, GatewayOrder), PaymentFlowError> {
        let order = self.reload_order(order_id).await?;
        let method = self
            .db
            .fetch_payment_method(order.payment_method_id)
            .await?
            .ok_or(PaymentFlowError::PaymentMethodNotFound(order.payment_method_id))?;
        let gateway_order = order.to_gateway_order(method.into());
        Ok((order, gateway_order))
    }

    async fn reload_order(&self, order_id: &str) -> Result<Order, PaymentFlowError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| PaymentFlowError::OrderNotFound(order_id.to_string()))
    }

    async fn load_refund(&self, refund_id: &str) -> Result<Refund, PaymentFlowError> {
        self.db.fetch_refund(refund_id).await?.ok_or_else(|| PaymentFlowError::RefundNotFound(refund_id.to_string()))
    }
}
