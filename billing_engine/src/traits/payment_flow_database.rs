use payment_gateways::{GatewayOrder, GatewayRefund, RecurringSubscription};
use thiserror::Error;

use crate::{
    db_types::{NewAccountingEntry, NewOrder, NewRefund, Order, PaymentMethodRecord, Refund, Subscription},
    traits::ErrorKind,
};

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowDatabaseError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(String),
    #[error("Refund {0} already exists")]
    RefundAlreadyExists(String),
    #[error("Order {0} already has a subscription")]
    SubscriptionAlreadyExists(String),
    #[error("Order {0} has no subscription")]
    SubscriptionNotFound(String),
}

impl PaymentFlowDatabaseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::OrderAlreadyExists(_) => "order_already_exists",
            Self::RefundAlreadyExists(_) => "refund_already_exists",
            Self::SubscriptionAlreadyExists(_) => "subscription_already_exists",
            Self::SubscriptionNotFound(_) => "subscription_not_found",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Transport,
            Self::SubscriptionNotFound(_) => ErrorKind::Validation,
            _ => ErrorKind::Consistency,
        }
    }
}

impl From<sqlx::Error> for PaymentFlowDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// Storage for the records the gateway flow reads and writes.
///
/// The `settle_*` methods are the only way a ledger entry is written by the flow: the status change and the entry are
/// committed together, and only if the record was not yet in a terminal state.
#[allow(async_fn_in_trait)]
pub trait PaymentFlowDatabase {
    async fn insert_payment_method(
        &self,
        name: &str,
        handler: &str,
        external_id: &str,
        params: &serde_json::Value,
    ) -> Result<PaymentMethodRecord, PaymentFlowDatabaseError>;

    async fn fetch_payment_method(&self, id: i64) -> Result<Option<PaymentMethodRecord>, PaymentFlowDatabaseError>;

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentFlowDatabaseError>;

    async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>, PaymentFlowDatabaseError>;

    /// Saves the gateway fields of a non-terminal order. Returns `false` if the order has reached a terminal state in
    /// the meantime, in which case nothing is written.
    async fn update_order_progress(&self, order: &GatewayOrder) -> Result<bool, PaymentFlowDatabaseError>;

    /// Moves a non-terminal order to the gateway order's state and appends `entry`, atomically. Returns `false` and
    /// writes nothing if the order was already terminal.
    async fn settle_order(
        &self,
        order: &GatewayOrder,
        entry: Option<NewAccountingEntry>,
    ) -> Result<bool, PaymentFlowDatabaseError>;

    async fn insert_refund(&self, refund: NewRefund) -> Result<Refund, PaymentFlowDatabaseError>;

    async fn fetch_refund(&self, refund_id: &str) -> Result<Option<Refund>, PaymentFlowDatabaseError>;

    async fn fetch_refunds_for_order(&self, order_id: &str) -> Result<Vec<Refund>, PaymentFlowDatabaseError>;

    async fn update_refund_progress(&self, refund: &GatewayRefund) -> Result<bool, PaymentFlowDatabaseError>;

    /// As [`PaymentFlowDatabase::settle_order`], for refunds. When `order` is given, it is marked refunded in the same
    /// transaction, but only once its completed refunds cover the full order amount.
    async fn settle_refund(
        &self,
        refund: &GatewayRefund,
        order: Option<&GatewayOrder>,
        entry: Option<NewAccountingEntry>,
    ) -> Result<bool, PaymentFlowDatabaseError>;

    async fn insert_subscription(
        &self,
        order_id: &str,
        subscription: &RecurringSubscription,
    ) -> Result<Subscription, PaymentFlowDatabaseError>;

    async fn fetch_subscription(&self, order_id: &str) -> Result<Option<Subscription>, PaymentFlowDatabaseError>;

    async fn update_subscription(
        &self,
        order_id: &str,
        subscription: &RecurringSubscription,
    ) -> Result<Subscription, PaymentFlowDatabaseError>;
}
