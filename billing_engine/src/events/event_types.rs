use serde::{Deserialize, Serialize};

use crate::db_types::{PayoutDocument, PayoutStatus, RoyaltyReport};

/// A merchant disputed a royalty report. Operators are expected to investigate and close the dispute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDisputedEvent {
    pub report: RoyaltyReport,
}

impl ReportDisputedEvent {
    pub fn new(report: RoyaltyReport) -> Self {
        Self { report }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportAcceptedEvent {
    pub report: RoyaltyReport,
}

impl ReportAcceptedEvent {
    pub fn new(report: RoyaltyReport) -> Self {
        Self { report }
    }

    pub fn is_auto_accepted(&self) -> bool {
        self.report.is_auto_accepted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutCreatedEvent {
    pub payout: PayoutDocument,
}

impl PayoutCreatedEvent {
    pub fn new(payout: PayoutDocument) -> Self {
        Self { payout }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutStatusChangedEvent {
    pub old_status: PayoutStatus,
    pub payout: PayoutDocument,
}

impl PayoutStatusChangedEvent {
    pub fn new(old_status: PayoutStatus, payout: PayoutDocument) -> Self {
        Self { old_status, payout }
    }
}
