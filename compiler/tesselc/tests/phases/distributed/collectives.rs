use std::time::Duration;

use tessel_ir::{BinaryOp, Expr};
use tessel_patterns::DistributedSyncError;

use super::{cluster, cluster_with_timeout};
use crate::common::{bin, call, int, list, locality, span, string};

fn tiled(span_expr: Expr) -> Expr {
    call(
        "annotate",
        vec![list(vec![int(1)]), string("tile"), span_expr],
    )
}

fn sync_error(result: &Result<tessel_patterns::Value, tesselc::Error>) -> DistributedSyncError {
    result
        .as_ref()
        .unwrap_err()
        .as_eval()
        .and_then(|err| err.as_distributed_sync())
        .cloned()
        .expect("a collective failure")
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_localities_time_out() {
    let cluster = cluster_with_timeout(2, Duration::from_millis(100));
    let program = [tiled(span("columns", int(0), int(1)))];
    let results = cluster.run_on(&program, |id| id == 0).await;
    assert_eq!(results.len(), 1);
    match sync_error(&results[0]) {
        DistributedSyncError::Timeout {
            arrived, expected, ..
        } => {
            assert_eq!(arrived, 1);
            assert_eq!(expected, 2);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(cluster.hub().pending_rounds(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn aborting_fails_pending_collectives() {
    let cluster = cluster(2);
    let program = [tiled(span("columns", int(0), int(1)))];
    let (results, ()) = tokio::join!(cluster.run_on(&program, |id| id == 1), async {
        while cluster.hub().pending_rounds() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        cluster.abort();
    });
    assert!(matches!(
        sync_error(&results[0]),
        DistributedSyncError::ParticipantLost { .. }
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn tiles_over_different_dimensions_are_rejected() {
    let cluster = cluster(2);
    let dim = call(
        "if",
        vec![
            bin(BinaryOp::Eq, locality(), int(0)),
            string("columns"),
            string("rows"),
        ],
    );
    let program = [tiled(list(vec![dim, int(0), int(1)]))];
    for result in cluster.run_everywhere(&program).await {
        assert!(matches!(
            sync_error(&result),
            DistributedSyncError::ContributionMismatch { .. }
        ));
    }
}
