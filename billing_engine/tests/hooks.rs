mod support;

use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
        Mutex,
    },
    time::Duration as StdDuration,
};

use billing_engine::{
    db_types::PayoutStatus,
    events::{EventHandlers, EventHooks},
    PayoutApi,
    RoyaltyReportApi,
};
use chrono::{Duration, Utc};
use futures_util::FutureExt;
use log::*;
use tokio::runtime::Runtime;

use crate::support::{operator, week, TestSystem};

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

/// Hooks run on their own tasks, so give them a moment to catch up.
async fn wait_for(hook: &HookCalled, expected: i32) {
    for _ in 0..50 {
        if hook.count() >= expected {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
}

#[test]
fn report_hooks() {
    let rt = Runtime::new().unwrap();
    let disputed = HookCalled::default();
    let accepted = HookCalled::default();
    let auto_accepted = HookCalled::default();
    let (d, a, aa) = (disputed.clone(), accepted.clone(), auto_accepted.clone());
    rt.block_on(async {
        let sys = TestSystem::new().await;
        let mut hooks = EventHooks::default();
        hooks
            .on_report_disputed(move |ev| {
                let d = d.clone();
                async move {
                    info!("🪝️ Report #{} disputed: {:?}", ev.report.id, ev.report.dispute_reason);
                    d.called();
                }
                .boxed()
            })
            .on_report_accepted(move |ev| {
                let (a, aa) = (a.clone(), aa.clone());
                async move {
                    info!("🪝️ Report #{} accepted", ev.report.id);
                    if ev.is_auto_accepted() {
                        aa.called();
                    } else {
                        a.called();
                    }
                }
                .boxed()
            });
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        for id in ["m-1", "m-2"] {
            sys.add_merchant(id, "EUR").await;
            sys.earn(id, &format!("ord-{id}"), 1_000, "EUR").await;
        }
        let (from, to) = week();
        let reports = RoyaltyReportApi::new(sys.db.clone(), producers.clone(), Duration::hours(1));
        let report = reports.generate("m-1", from, to, &operator()).await.unwrap();
        reports.dispute(report.id, "Wrong totals", &operator()).await.unwrap();
        reports.close_dispute(report.id, &operator()).await.unwrap();
        reports.accept(report.id, &operator()).await.unwrap();
        // A repeated accept is a no-op and does not fire again
        reports.accept(report.id, &operator()).await.unwrap();

        let expiring = RoyaltyReportApi::new(sys.db.clone(), producers, Duration::zero());
        expiring.generate("m-2", from, to, &operator()).await.unwrap();
        expiring.auto_accept_sweep().await.unwrap();

        wait_for(&disputed, 1).await;
        wait_for(&accepted, 1).await;
        wait_for(&auto_accepted, 1).await;
        sys.teardown().await;
    });
    assert_eq!(disputed.count(), 1);
    assert_eq!(accepted.count(), 1);
    assert_eq!(auto_accepted.count(), 1);
    info!("🪝️ test complete");
}

#[test]
fn payout_hooks() {
    let rt = Runtime::new().unwrap();
    let created = HookCalled::default();
    let changed = HookCalled::default();
    let transitions = Arc::new(Mutex::new(Vec::<(PayoutStatus, PayoutStatus)>::new()));
    let (c, s, t) = (created.clone(), changed.clone(), transitions.clone());
    rt.block_on(async {
        let sys = TestSystem::new().await;
        let mut hooks = EventHooks::default();
        hooks
            .on_payout_created(move |ev| {
                let c = c.clone();
                async move {
                    info!("🪝️ Payout #{} created for {}", ev.payout.id, ev.payout.balance);
                    c.called();
                }
                .boxed()
            })
            .on_payout_status_changed(move |ev| {
                let (s, t) = (s.clone(), t.clone());
                async move {
                    if let Ok(mut log) = t.lock() {
                        log.push((ev.old_status, ev.payout.status));
                    }
                    s.called();
                }
                .boxed()
            });
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        sys.add_merchant("m-1", "EUR").await;
        sys.earn("m-1", "ord-1", 1_000, "EUR").await;
        sys.accepted_report("m-1").await;
        let payouts = PayoutApi::new(sys.db.clone(), producers);
        let payout = payouts.create_payout_document("m-1", &operator()).await.unwrap();
        payouts.mark_in_progress(payout.id, "txn-1", &operator()).await.unwrap();
        payouts.mark_paid(payout.id, "txn-1", Utc::now(), &operator()).await.unwrap();
        // Refused transitions are silent
        payouts.mark_paid(payout.id, "txn-1", Utc::now(), &operator()).await.unwrap_err();

        wait_for(&created, 1).await;
        wait_for(&changed, 2).await;
        sys.teardown().await;
    });
    assert_eq!(created.count(), 1);
    assert_eq!(changed.count(), 2);
    let transitions = transitions.lock().unwrap().clone();
    // Hooks run concurrently, so only the set of transitions is fixed
    assert_eq!(transitions.len(), 2);
    assert!(transitions.contains(&(PayoutStatus::Pending, PayoutStatus::InProgress)));
    assert!(transitions.contains(&(PayoutStatus::InProgress, PayoutStatus::Paid)));
    info!("🪝️ test complete");
}
