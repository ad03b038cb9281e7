use std::sync::Arc;
use std::time::Duration;

use super::*;
use pretty_assertions::assert_eq;

const LONG: Duration = Duration::from_secs(10);

#[tokio::test]
async fn single_participant_completes_immediately() {
    let hub = CollectiveHub::new(1);
    let values = hub.all_to_all("k", 0, 0, Value::int(5), LONG).await.unwrap();
    assert_eq!(values, vec![Value::int(5)]);
    assert_eq!(hub.pending_rounds(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn results_are_ordered_by_locality() {
    let hub = Arc::new(CollectiveHub::new(2));
    let second = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move { hub.all_to_all("k", 0, 1, Value::int(11), LONG).await })
    };
    let first = hub.all_to_all("k", 0, 0, Value::int(10), LONG).await.unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first, vec![Value::int(10), Value::int(11)]);
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn generations_do_not_mix() {
    let hub = Arc::new(CollectiveHub::new(2));
    let pending = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move { hub.all_to_all("k", 1, 0, Value::int(1), LONG).await })
    };
    // Same key, different generation: this round stays open.
    let timed_out = hub
        .all_to_all("k", 0, 1, Value::int(0), Duration::from_millis(50))
        .await;
    assert!(matches!(
        timed_out,
        Err(DistributedSyncError::Timeout { arrived: 1, expected: 2, .. })
    ));
    let done = hub.all_to_all("k", 1, 1, Value::int(2), LONG).await.unwrap();
    assert_eq!(done, vec![Value::int(1), Value::int(2)]);
    assert_eq!(pending.await.unwrap().unwrap(), done);
}

#[tokio::test]
async fn missing_participant_times_out() {
    let hub = CollectiveHub::new(2);
    let err = hub
        .all_to_all("k", 0, 0, Value::int(1), Duration::from_millis(20))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DistributedSyncError::Timeout {
            key: "k".to_string(),
            timeout: Duration::from_millis(20),
            arrived: 1,
            expected: 2,
        }
    );
    assert_eq!(hub.pending_rounds(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn abort_reports_participant_lost() {
    let hub = Arc::new(CollectiveHub::new(2));
    let waiting = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move { hub.all_to_all("k", 0, 0, Value::int(1), LONG).await })
    };
    while hub.pending_rounds() == 0 {
        tokio::task::yield_now().await;
    }
    hub.abort();
    let err = waiting.await.unwrap().unwrap_err();
    assert!(matches!(err, DistributedSyncError::ParticipantLost { .. }));
}

#[tokio::test]
async fn double_contribution_is_a_mismatch() {
    let hub = Arc::new(CollectiveHub::new(2));
    let first = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            hub.all_to_all("k", 0, 0, Value::int(1), Duration::from_millis(200))
                .await
        })
    };
    while hub.pending_rounds() == 0 {
        tokio::task::yield_now().await;
    }
    let err = hub
        .all_to_all("k", 0, 0, Value::int(1), LONG)
        .await
        .unwrap_err();
    assert!(matches!(err, DistributedSyncError::ContributionMismatch { .. }));
    let _ = first.await;
}

#[tokio::test]
async fn out_of_range_locality_is_a_mismatch() {
    let hub = CollectiveHub::new(2);
    let err = hub
        .all_to_all("k", 0, 5, Value::int(1), LONG)
        .await
        .unwrap_err();
    assert!(matches!(err, DistributedSyncError::ContributionMismatch { .. }));
}
