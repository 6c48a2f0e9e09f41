use billing_common::Amount;
use payment_gateways::GatewayError;
use thiserror::Error;

use crate::{
    db_types::{ConversionError, OrderStatusType},
    traits::{ErrorKind, LedgerError, PaymentFlowDatabaseError},
};

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    Database(#[from] PaymentFlowDatabaseError),
    #[error("Could not write the ledger entry. {0}")]
    Ledger(#[from] LedgerError),
    #[error("Order {0} does not exist")]
    OrderNotFound(String),
    #[error("Refund {0} does not exist")]
    RefundNotFound(String),
    #[error("Order {0} has no recurring subscription")]
    SubscriptionNotFound(String),
    #[error("Order {0} already has a recurring subscription")]
    SubscriptionAlreadyExists(String),
    #[error("Payment method {0} does not exist")]
    PaymentMethodNotFound(i64),
    #[error("The callback does not name an order")]
    OrderIdMissing,
    #[error("Order {order_id} is {status}, which does not allow this operation")]
    InvalidOrderStatus { order_id: String, status: OrderStatusType },
    #[error("Refund {refund_id} exceeds the {refundable} still refundable on order {order_id}")]
    RefundExceedsOrder { refund_id: String, order_id: String, refundable: Amount },
    #[error("The stored subscription is invalid. {0}")]
    InvalidSubscription(#[from] ConversionError),
}

impl PaymentFlowError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Gateway(e) => e.code(),
            Self::Database(e) => e.code(),
            Self::Ledger(e) => e.code(),
            Self::OrderNotFound(_) => "order_not_found",
            Self::RefundNotFound(_) => "refund_not_found",
            Self::SubscriptionNotFound(_) => "subscription_not_found",
            Self::SubscriptionAlreadyExists(_) => "subscription_already_exists",
            Self::PaymentMethodNotFound(_) => "payment_method_not_found",
            Self::OrderIdMissing => "order_id_missing",
            Self::InvalidOrderStatus { .. } => "invalid_order_status",
            Self::RefundExceedsOrder { .. } => "refund_exceeds_order",
            Self::InvalidSubscription(_) => "invalid_subscription",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Gateway(e) => e.kind(),
            Self::Database(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::SubscriptionAlreadyExists(_) | Self::InvalidSubscription(_) => ErrorKind::Consistency,
            _ => ErrorKind::Validation,
        }
    }
}
