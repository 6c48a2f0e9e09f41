use std::{fmt::Display, str::FromStr};

use crate::{transport::HttpMethod, GatewayError};

/// Every CardPay API call the adapter makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPayAction {
    CreatePayment,
    CreateRecurringPlan,
    GetRecurringPlan,
    DeleteRecurringPlan,
    CreateRecurringSubscription,
    UpdateRecurringSubscription,
    DeleteRecurringSubscription,
    Refund,
}

/// Method, path template and the number of `{}` placeholders in the template.
pub struct ActionRoute {
    pub method: HttpMethod,
    pub template: &'static str,
    pub params: usize,
}

impl CardPayAction {
    pub fn route(&self) -> ActionRoute {
        use HttpMethod::*;
        let (method, template, params) = match self {
            Self::CreatePayment => (Post, "/api/payments", 0),
            Self::CreateRecurringPlan => (Post, "/api/recurring_plans", 0),
            Self::GetRecurringPlan => (Get, "/api/recurring_plans/{}", 1),
            Self::DeleteRecurringPlan => (Delete, "/api/recurring_plans/{}", 1),
            Self::CreateRecurringSubscription => (Post, "/api/recurring", 0),
            Self::UpdateRecurringSubscription => (Patch, "/api/recurring_subscriptions/{}", 1),
            // CardPay cancels a subscription by patching its status.
            Self::DeleteRecurringSubscription => (Patch, "/api/recurring_subscriptions/{}", 1),
            Self::Refund => (Post, "/api/refunds", 0),
        };
        ActionRoute { method, template, params }
    }

    /// Resolves the full URL for this action against the terminal's API base URL.
    pub fn build_url(&self, api_url: &str, params: &[&str]) -> Result<(HttpMethod, String), GatewayError> {
        let base = api_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(GatewayError::EmptyApiUrl);
        }
        let route = self.route();
        if params.len() != route.params {
            return Err(GatewayError::MissingPathParameter {
                action: self.to_string(),
                expected: route.params,
                given: params.len(),
            });
        }
        // Ids are inserted as single, percent-encoded path segments.
        let mut path = route.template.to_string();
        for p in params {
            path = path.replacen("{}", &urlencoding::encode(p), 1);
        }
        Ok((route.method, format!("{base}{path}")))
    }
}

impl Display for CardPayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CreatePayment => "create_payment",
            Self::CreateRecurringPlan => "create_recurring_plan",
            Self::GetRecurringPlan => "get_recurring_plan",
            Self::DeleteRecurringPlan => "delete_recurring_plan",
            Self::CreateRecurringSubscription => "create_recurring_subscription",
            Self::UpdateRecurringSubscription => "update_recurring_subscription",
            Self::DeleteRecurringSubscription => "delete_recurring_subscription",
            Self::Refund => "refund",
        };
        f.write_str(s)
    }
}

impl FromStr for CardPayAction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_payment" => Ok(Self::CreatePayment),
            "create_recurring_plan" => Ok(Self::CreateRecurringPlan),
            "get_recurring_plan" => Ok(Self::GetRecurringPlan),
            "delete_recurring_plan" => Ok(Self::DeleteRecurringPlan),
            "create_recurring_subscription" => Ok(Self::CreateRecurringSubscription),
            "update_recurring_subscription" => Ok(Self::UpdateRecurringSubscription),
            "delete_recurring_subscription" => Ok(Self::DeleteRecurringSubscription),
            "refund" => Ok(Self::Refund),
            other => Err(GatewayError::UnknownAction(other.to_string())),
        }
    }
}
