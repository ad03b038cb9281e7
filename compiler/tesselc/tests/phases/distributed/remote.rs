use std::sync::Arc;

use pretty_assertions::assert_eq;

use tessel_ir::BinaryOp;
use tessel_patterns::{EvalContext, EvalErrorKind, Value};

use super::cluster;
use crate::common::{bin, call, int, locality};

#[tokio::test(flavor = "multi_thread")]
async fn nodes_resolve_and_run_on_their_owner() {
    let cluster = cluster(2);
    let program = [bin(BinaryOp::Add, locality(), int(10))];
    let local = cluster.session(0).unwrap().compile(&program).unwrap();
    let owned = cluster.session(1).unwrap().compile(&program).unwrap();

    // Identical compilations differ only in the locality segment.
    let remote_name = local.name().on_locality(1);
    assert_eq!(&remote_name, owned.name());

    let here = Arc::clone(cluster.session(0).unwrap().locality());
    let proxy = here.resolve(&remote_name).unwrap();
    let value = proxy.eval(Vec::new(), EvalContext::new(here)).await.unwrap();
    assert_eq!(value, Value::int(11));
}

#[tokio::test(flavor = "multi_thread")]
async fn names_outside_the_cluster_do_not_resolve() {
    let cluster = cluster(2);
    let compiled = cluster
        .session(0)
        .unwrap()
        .compile(&[call("num_localities", Vec::new())])
        .unwrap();
    let here = cluster.session(0).unwrap().locality();
    let err = here.resolve(&compiled.name().on_locality(5)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnresolvedName { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_programs_are_no_longer_reachable() {
    let cluster = cluster(2);
    let owned = cluster
        .session(1)
        .unwrap()
        .compile(&[int(1)])
        .unwrap();
    let name = owned.name().clone();
    drop(owned);

    let here = Arc::clone(cluster.session(0).unwrap().locality());
    let proxy = here.resolve(&name).unwrap();
    let err = proxy.eval(Vec::new(), EvalContext::new(here)).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnresolvedName { .. }));
}
