use pretty_assertions::assert_eq;

use tessel_ir::{BinaryOp, Expr};
use tessel_patterns::Value;

use super::cluster;
use crate::common::{bin, call, define, id, int, list, locality, span, span_value, string};

/// `annotate([1, 2], "tile", ["columns", locality() * 2, locality() * 2 + 2])`
fn column_tile() -> Expr {
    let start = bin(BinaryOp::Mul, locality(), int(2));
    let stop = bin(BinaryOp::Add, start.clone(), int(2));
    call(
        "annotate",
        vec![
            list(vec![int(1), int(2)]),
            string("tile"),
            span("columns", start, stop),
        ],
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn disjoint_tiles_reconcile_on_every_locality() {
    let cluster = cluster(2);
    let program = [
        define("t", column_tile()),
        list(vec![
            call("annotation", vec![id("t"), string("localities")]),
            call("tiling_extent", vec![id("t")]),
        ]),
    ];
    let results = cluster.run_everywhere(&program).await;

    let localities = Value::list(vec![
        Value::list(vec![Value::int(0), Value::list(vec![span_value("columns", 0, 2)])]),
        Value::list(vec![Value::int(1), Value::list(vec![span_value("columns", 2, 4)])]),
    ]);
    let extent = Value::list(vec![span_value("columns", 0, 4)]);
    for result in results {
        assert_eq!(
            result.unwrap(),
            Value::list(vec![localities.clone(), extent.clone()])
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn local_tile_is_kept_next_to_the_reconciled_view() {
    let cluster = cluster(2);
    let program = [call("annotation", vec![column_tile(), string("tile")])];
    let results = cluster.run_everywhere(&program).await;
    let tiles: Vec<Value> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(
        tiles,
        vec![
            Value::list(vec![span_value("columns", 0, 2)]),
            Value::list(vec![span_value("columns", 2, 4)]),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn explicit_basenames_meet_across_different_programs() {
    let cluster = cluster(2);
    // The annotation sits at a different position in each program, so only
    // the explicit basename lets the two localities meet.
    let annotate = |start: i64| {
        call(
            "annotate_d",
            vec![
                list(vec![int(0)]),
                string("grid"),
                string("tile"),
                span("rows", int(start), int(start + 1)),
            ],
        )
    };
    let first = [call("tiling_extent", vec![annotate(0)])];
    let second = [
        define("unrelated", int(1)),
        call("tiling_extent", vec![annotate(1)]),
    ];

    let a = cluster.session(0).unwrap().compile(&first).unwrap();
    let b = cluster.session(1).unwrap().compile(&second).unwrap();
    let (a, b) = tokio::join!(a.run(), b.run());
    let extent = Value::list(vec![span_value("rows", 0, 2)]);
    assert_eq!(a.unwrap(), extent);
    assert_eq!(b.unwrap(), extent);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_annotations_use_successive_rounds() {
    let cluster = cluster(3);
    let body = call("tiling_extent", vec![column_tile()]);
    let program = [
        define("i", int(0)),
        define("last", Expr::nil()),
        call(
            "while",
            vec![
                bin(BinaryOp::Lt, id("i"), int(3)),
                call(
                    "block",
                    vec![
                        call("store", vec![id("last"), body]),
                        call("store", vec![id("i"), bin(BinaryOp::Add, id("i"), int(1))]),
                    ],
                ),
            ],
        ),
        id("last"),
    ];
    for result in cluster.run_everywhere(&program).await {
        assert_eq!(result.unwrap(), Value::list(vec![span_value("columns", 0, 6)]));
    }
    assert_eq!(cluster.hub().pending_rounds(), 0);
}
