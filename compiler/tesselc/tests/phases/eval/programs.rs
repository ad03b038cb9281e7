use pretty_assertions::assert_eq;

use tessel_ir::BinaryOp;
use tessel_patterns::{EvalMode, Value};
use tesselc::{Session, SessionBuilder};

use crate::common::{bin, call, define, define_fn, id, int, ints, lambda, list, store};

/// `define(fact, n, if(n <= 1, 1, n * fact(n - 1)))`
fn factorial() -> tessel_ir::Expr {
    define_fn(
        "fact",
        &["n"],
        call(
            "if",
            vec![
                bin(BinaryOp::LtEq, id("n"), int(1)),
                int(1),
                bin(
                    BinaryOp::Mul,
                    id("n"),
                    call("fact", vec![bin(BinaryOp::Sub, id("n"), int(1))]),
                ),
            ],
        ),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn entry_point_is_callable_from_the_host() {
    let session = Session::new().unwrap();
    let compiled = session.compile(&[factorial()]).unwrap();
    assert_eq!(
        compiled.call(vec![Value::int(10)]).await.unwrap(),
        Value::int(3_628_800)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn definitions_carry_over_between_compilations() {
    let session = Session::new().unwrap();
    session.eval(&[factorial()]).await.unwrap();
    let value = session
        .eval(&[call("map", vec![id("fact"), call("range", vec![int(1), int(6)])])])
        .await
        .unwrap();
    assert_eq!(value, ints(&[1, 2, 6, 24, 120]));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_pipeline() {
    let session = Session::new().unwrap();
    let even = lambda(
        &["x"],
        bin(
            BinaryOp::Eq,
            bin(BinaryOp::Mod, id("x"), int(2)),
            int(0),
        ),
    );
    let square = lambda(&["x"], bin(BinaryOp::Mul, id("x"), id("x")));
    let sum = lambda(&["acc", "x"], bin(BinaryOp::Add, id("acc"), id("x")));
    let program = [
        define("evens", call("filter", vec![even, call("range", vec![int(10)])])),
        call(
            "fold_left",
            vec![sum, int(0), call("map", vec![square, id("evens")])],
        ),
    ];
    // 0 + 4 + 16 + 36 + 64
    assert_eq!(session.eval(&program).await.unwrap(), Value::int(120));
}

#[tokio::test(flavor = "multi_thread")]
async fn loops_update_globals() {
    let session = Session::new().unwrap();
    let program = [
        define("a", int(0)),
        define("b", int(1)),
        define("t", int(0)),
        define("i", int(0)),
        call(
            "while",
            vec![
                bin(BinaryOp::Lt, id("i"), int(10)),
                call(
                    "block",
                    vec![
                        store("t", bin(BinaryOp::Add, id("a"), id("b"))),
                        store("a", id("b")),
                        store("b", id("t")),
                        store("i", bin(BinaryOp::Add, id("i"), int(1))),
                    ],
                ),
            ],
        ),
        id("a"),
    ];
    assert_eq!(session.eval(&program).await.unwrap(), Value::int(55));
}

#[tokio::test(flavor = "multi_thread")]
async fn closures_outlive_their_defining_call() {
    let session = Session::new().unwrap();
    let program = [
        define_fn(
            "make_adder",
            &["n"],
            lambda(&["x"], bin(BinaryOp::Add, id("x"), id("n"))),
        ),
        define("add5", call("make_adder", vec![int(5)])),
        call("map", vec![id("add5"), list(vec![int(1), int(2), int(3)])]),
    ];
    assert_eq!(session.eval(&program).await.unwrap(), ints(&[6, 7, 8]));
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_branches_store_independently() {
    let session = Session::new().unwrap();
    let program = [
        factorial(),
        define("a", int(0)),
        define("b", int(0)),
        call(
            "parallel_block",
            vec![
                store("a", call("fact", vec![int(5)])),
                store("b", call("fact", vec![int(6)])),
            ],
        ),
        list(vec![id("a"), id("b")]),
    ];
    assert_eq!(session.eval(&program).await.unwrap(), ints(&[120, 720]));
}

#[tokio::test(flavor = "multi_thread")]
async fn session_mode_defers_partials() {
    let session = SessionBuilder::new()
        .mode(EvalMode::DONT_EVALUATE_PARTIALS)
        .build()
        .unwrap();
    let program = [
        define_fn("sub", &["a", "b"], bin(BinaryOp::Sub, id("a"), id("b"))),
        define("from_ten", call("sub", vec![int(10)])),
        call("from_ten", vec![int(3)]),
    ];
    assert_eq!(session.eval(&program).await.unwrap(), Value::int(7));
}

#[test]
fn blocking_hosts_need_no_runtime_of_their_own() {
    let session = Session::new().unwrap();
    let value = session
        .eval_blocking(&[factorial(), call("fact", vec![int(6)])])
        .unwrap();
    assert_eq!(value, Value::int(720));
}
