use std::time::Duration;

use log::*;
use tokio::task::JoinHandle;

use crate::{billing_api::RoyaltyReportApi, db_types::RoyaltyReport, SqliteDatabase};

/// Starts the royalty report auto-accept worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Hosts that already run the sweep from a scheduler should call [`RoyaltyReportApi::auto_accept_sweep`] directly
/// instead.
pub fn start_auto_accept_worker(api: RoyaltyReportApi<SqliteDatabase>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Royalty report auto-accept worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running royalty report auto-accept job");
            match api.auto_accept_sweep().await {
                Ok(accepted) if accepted.is_empty() => trace!("🕰️ No royalty reports were due"),
                Ok(accepted) => info!("🕰️ {} royalty reports auto-accepted: {}", accepted.len(), report_list(&accepted)),
                Err(e) => error!("🕰️ Error running royalty report auto-accept job: {e}"),
            }
        }
    })
}

fn report_list(reports: &[RoyaltyReport]) -> String {
    reports
        .iter()
        .map(|r| format!("[{}] merchant: {} period: {}", r.id, r.merchant_id, r.period_from.date_naive()))
        .collect::<Vec<String>>()
        .join(", ")
}
