mod support;

use std::time::Duration as StdDuration;

use billing_engine::{
    db_types::ReportStatus,
    traits::SequenceError,
    workers::start_auto_accept_worker,
    SequenceApi,
};
use chrono::Duration;
use futures_util::future::join_all;

use crate::support::{operator, week, TestSystem};

#[tokio::test]
async fn collections_count_independently() {
    let sys = TestSystem::new().await;
    let sequence = SequenceApi::new(sys.db.clone());
    assert_eq!(sequence.current("invoice").await.unwrap(), None);
    assert_eq!(sequence.next("invoice").await.unwrap(), 1);
    assert_eq!(sequence.next("invoice").await.unwrap(), 2);
    assert_eq!(sequence.next("credit_note").await.unwrap(), 1);
    assert_eq!(sequence.current("invoice").await.unwrap(), Some(2));
    assert!(matches!(sequence.next("").await, Err(SequenceError::EmptyCollectionName)));
    sys.teardown().await;
}

#[tokio::test]
async fn concurrent_callers_get_distinct_values() {
    let sys = TestSystem::new().await;
    let sequence = SequenceApi::new(sys.db.clone());
    let results = join_all((0..20).map(|_| sequence.next("invoice"))).await;
    let mut values = results.into_iter().map(|v| v.unwrap()).collect::<Vec<_>>();
    values.sort_unstable();
    assert_eq!(values, (1..=20).collect::<Vec<i64>>());
    sys.teardown().await;
}

#[tokio::test]
async fn worker_accepts_expired_reports() {
    let sys = TestSystem::new().await;
    sys.add_merchant("m-1", "EUR").await;
    sys.earn("m-1", "ord-1", 1_000, "EUR").await;
    let (from, to) = week();
    let api = sys.reports(Duration::zero());
    let report = api.generate("m-1", from, to, &operator()).await.unwrap();

    let worker = start_auto_accept_worker(sys.reports(Duration::zero()), StdDuration::from_millis(20));
    let mut status = report.status;
    for _ in 0..50 {
        status = api.fetch_report(report.id).await.unwrap().unwrap().status;
        if status == ReportStatus::Accepted {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    worker.abort();
    assert_eq!(status, ReportStatus::Accepted);
    sys.teardown().await;
}
