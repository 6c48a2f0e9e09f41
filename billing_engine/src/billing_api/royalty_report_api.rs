use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    billing_api::report_summary::{summarize, ReportLine},
    db_types::{Actor, ChangeRecord, NewRoyaltyReport, ReportStatus, RoyaltyReport},
    events::{EventProducers, ReportAcceptedEvent, ReportDisputedEvent},
    helpers::RoyaltyPeriod,
    traits::{ExchangeRates, LedgerManagement, MerchantRepository, RoyaltyReportError, RoyaltyReportManagement},
};

pub const AUTO_ACCEPT_ACTOR: &str = "royalty_auto_accept";

/// `RoyaltyReportApi` closes reporting periods into royalty reports and drives the accept / dispute workflow.
///
/// Reports are generated from the ledger in one pass and never recomputed. Each state change is a conditional update
/// in storage, so two operators (or an operator and the auto-accept sweep) racing on one report cannot both win.
pub struct RoyaltyReportApi<B> {
    db: B,
    producers: EventProducers,
    accept_grace: Duration,
}

impl<B> Debug for RoyaltyReportApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RoyaltyReportApi")
    }
}

impl<B> RoyaltyReportApi<B> {
    pub fn new(db: B, producers: EventProducers, accept_grace: Duration) -> Self {
        Self { db, producers, accept_grace }
    }

    pub fn accept_grace(&self) -> Duration {
        self.accept_grace
    }
}

impl<B> RoyaltyReportApi<B>
where B: RoyaltyReportManagement + LedgerManagement + MerchantRepository + ExchangeRates
{
    /// Builds the report for one merchant over `[period_from, period_to)`.
    ///
    /// Every ledger entry available in the window is converted into the merchant's payout currency and folded into
    /// the totals. A second report for the same merchant and period is refused with
    /// [`RoyaltyReportError::ReportAlreadyExists`].
    pub async fn generate(
        &self,
        merchant_id: &str,
        period_from: DateTime<Utc>,
        period_to: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<RoyaltyReport, RoyaltyReportError> {
        if period_from >= period_to {
            return Err(RoyaltyReportError::InvalidPeriod(format!("{period_from} is not before {period_to}")));
        }
        let merchant = self
            .db
            .fetch_merchant(merchant_id)
            .await?
            .ok_or_else(|| RoyaltyReportError::MerchantNotFound(merchant_id.to_string()))?;
        let currency = merchant.payout_currency;
        let ledger_lines = self.db.fetch_ledger_lines(merchant_id, period_from, period_to).await?;
        trace!("📑️ {} ledger lines for merchant {merchant_id} in [{period_from}, {period_to})", ledger_lines.len());
        let mut lines = Vec::with_capacity(ledger_lines.len());
        for line in ledger_lines {
            let amount = self.db.convert(line.entry.local_amount, &line.entry.local_currency, &currency).await?;
            lines.push(ReportLine { entry: line.entry, product: line.product, amount });
        }
        let (totals, summary) = summarize(&lines, &currency);
        let report = NewRoyaltyReport {
            merchant_id: merchant_id.to_string(),
            currency,
            period_from,
            period_to,
            totals,
            summary,
            accept_expire_at: Utc::now() + self.accept_grace,
        };
        let report = self.db.insert_report(report, actor).await?;
        info!(
            "📑️ Royalty report #{} generated for merchant {}: {} transactions, payout {} {}",
            report.id,
            report.merchant_id,
            report.totals.transactions_count,
            report.totals.payout_amount,
            report.currency
        );
        Ok(report)
    }

    /// Generates a report for every merchant with ledger entries in the window. A failure for one merchant is logged
    /// and does not stop the others.
    pub async fn generate_for_period(
        &self,
        period: RoyaltyPeriod,
        actor: &Actor,
    ) -> Result<Vec<RoyaltyReport>, RoyaltyReportError> {
        let merchants = self.db.fetch_merchants_with_entries(period.from, period.to).await?;
        info!("📑️ Generating royalty reports for {} merchants, {} to {}", merchants.len(), period.from, period.to);
        let mut reports = Vec::with_capacity(merchants.len());
        for merchant_id in merchants {
            match self.generate(&merchant_id, period.from, period.to, actor).await {
                Ok(report) => reports.push(report),
                Err(e) => error!("📑️ Could not generate the royalty report for merchant {merchant_id}. {e}"),
            }
        }
        Ok(reports)
    }

    /// Accepts a pending (or dispute-closed) report before its accept window closes. Accepting a report that is
    /// already accepted succeeds and changes nothing.
    pub async fn accept(&self, report_id: i64, actor: &Actor) -> Result<RoyaltyReport, RoyaltyReportError> {
        let now = Utc::now();
        if let Some(report) = self.db.accept_report(report_id, now, actor).await? {
            info!("📑️ Royalty report #{report_id} accepted by {}", actor.source);
            self.producers.report_accepted(ReportAcceptedEvent::new(report.clone())).await;
            return Ok(report);
        }
        let report = self.existing_report(report_id).await?;
        match report.status {
            ReportStatus::Accepted => {
                debug!("📑️ Royalty report #{report_id} is already accepted");
                Ok(report)
            },
            ReportStatus::Pending | ReportStatus::DisputeClosed => {
                warn!(
                    "📑️ Royalty report #{report_id} can no longer be accepted. It expired at {}",
                    report.accept_expire_at
                );
                Err(RoyaltyReportError::AcceptWindowExpired(report_id))
            },
            status => Err(RoyaltyReportError::InvalidTransition { id: report_id, status, action: "accept" }),
        }
    }

    /// Opens a dispute on a pending report. Auto-accept ignores the report until the dispute is closed.
    pub async fn dispute(
        &self,
        report_id: i64,
        reason: &str,
        actor: &Actor,
    ) -> Result<RoyaltyReport, RoyaltyReportError> {
        let now = Utc::now();
        if let Some(report) = self.db.dispute_report(report_id, reason, now, actor).await? {
            info!("📑️ Royalty report #{report_id} disputed by {}: {reason}", actor.source);
            self.producers.report_disputed(ReportDisputedEvent::new(report.clone())).await;
            return Ok(report);
        }
        let report = self.existing_report(report_id).await?;
        match report.status {
            ReportStatus::Pending => Err(RoyaltyReportError::AcceptWindowExpired(report_id)),
            status => Err(RoyaltyReportError::InvalidTransition { id: report_id, status, action: "dispute" }),
        }
    }

    /// Resolves a dispute and re-opens the accept window for another grace period.
    pub async fn close_dispute(&self, report_id: i64, actor: &Actor) -> Result<RoyaltyReport, RoyaltyReportError> {
        let now = Utc::now();
        let expires = now + self.accept_grace;
        if let Some(report) = self.db.close_dispute(report_id, expires, now, actor).await? {
            info!("📑️ Dispute on royalty report #{report_id} closed by {}. Accept window ends {expires}", actor.source);
            return Ok(report);
        }
        let report = self.existing_report(report_id).await?;
        Err(RoyaltyReportError::InvalidTransition { id: report_id, status: report.status, action: "close the dispute" })
    }

    /// Accepts every pending or dispute-closed report whose accept window has elapsed.
    pub async fn auto_accept_sweep(&self) -> Result<Vec<RoyaltyReport>, RoyaltyReportError> {
        let actor = Actor::system(AUTO_ACCEPT_ACTOR);
        let accepted = self.db.auto_accept_expired(Utc::now(), &actor).await?;
        for report in &accepted {
            debug!("📑️ Royalty report #{} auto-accepted", report.id);
            self.producers.report_accepted(ReportAcceptedEvent::new(report.clone())).await;
        }
        Ok(accepted)
    }

    pub async fn fetch_report(&self, report_id: i64) -> Result<Option<RoyaltyReport>, RoyaltyReportError> {
        self.db.fetch_report(report_id).await
    }

    pub async fn reports_for_merchant(&self, merchant_id: &str) -> Result<Vec<RoyaltyReport>, RoyaltyReportError> {
        self.db.fetch_reports_for_merchant(merchant_id).await
    }

    pub async fn changes_for_report(&self, report_id: i64) -> Result<Vec<ChangeRecord>, RoyaltyReportError> {
        self.db.fetch_report_changes(report_id).await
    }

    async fn existing_report(&self, report_id: i64) -> Result<RoyaltyReport, RoyaltyReportError> {
        self.db.fetch_report(report_id).await?.ok_or(RoyaltyReportError::ReportNotFound(report_id))
    }
}
