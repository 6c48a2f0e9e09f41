use thiserror::Error;

/// Broad classification of a failure, used by callers to decide between "fix the input", "retry later" and "call an
/// operator".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Consistency,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("No terminal credentials are configured for this payment method, currency and company")]
    UnknownPaymentMethod,
    #[error("The gateway request could not be completed. {0}")]
    CreateRequestFailed(String),
    #[error("The gateway did not answer in time. The outcome of the request is unknown. {0}")]
    OutcomeUnknown(String),
    #[error("The request signature is invalid")]
    RequestSignatureIsInvalid,
    #[error("The callback amount does not match the order amount")]
    PaymentAmountMismatch,
    #[error("The callback currency does not match the order currency")]
    PaymentCurrencyMismatch,
    #[error("The callback payment method does not match the order payment method")]
    PaymentMethodMismatch,
    #[error("The callback amount does not match the refund amount")]
    RefundAmountMismatch,
    #[error("The callback currency does not match the refund currency")]
    RefundCurrencyMismatch,
    #[error("The callback refers to a different refund")]
    RefundMismatch,
    #[error("The recurring plan could not be created or is not active")]
    CreateRecurringPlanFailed,
    #[error("Unknown gateway action: {0}")]
    UnknownAction(String),
    #[error("The payment method has no API URL configured")]
    EmptyApiUrl,
    #[error("Gateway action {action} requires {expected} path parameter(s), but {given} were given")]
    MissingPathParameter { action: String, expected: usize, given: usize },
    #[error("No gateway handler is configured with the name '{0}'")]
    HandlerNotFound(String),
    #[error("The gateway payload could not be read. {0}")]
    InvalidPayload(String),
    #[error("The gateway client could not be initialised. {0}")]
    Initialization(String),
}

impl GatewayError {
    /// A stable, machine-readable code for administrative surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPaymentMethod => "unknown_payment_method",
            Self::CreateRequestFailed(_) => "create_request_failed",
            Self::OutcomeUnknown(_) => "outcome_unknown",
            Self::RequestSignatureIsInvalid => "request_signature_is_invalid",
            Self::PaymentAmountMismatch => "payment_amount_mismatch",
            Self::PaymentCurrencyMismatch => "payment_currency_mismatch",
            Self::PaymentMethodMismatch => "payment_method_mismatch",
            Self::RefundAmountMismatch => "refund_amount_mismatch",
            Self::RefundCurrencyMismatch => "refund_currency_mismatch",
            Self::RefundMismatch => "refund_mismatch",
            Self::CreateRecurringPlanFailed => "create_recurring_plan_failed",
            Self::UnknownAction(_) => "unknown_action",
            Self::EmptyApiUrl => "empty_api_url",
            Self::MissingPathParameter { .. } => "missing_path_parameter",
            Self::HandlerNotFound(_) => "handler_not_found",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Initialization(_) => "initialization",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CreateRequestFailed(_) | Self::OutcomeUnknown(_) | Self::Initialization(_) => ErrorKind::Transport,
            _ => ErrorKind::Validation,
        }
    }

    /// True when the remote side may already have acted on the request.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::OutcomeUnknown(_))
    }
}
