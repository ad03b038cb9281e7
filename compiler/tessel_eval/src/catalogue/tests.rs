use super::*;
use pretty_assertions::assert_eq;

use tessel_ir::{BinaryOp, Expr, UnaryOp};
use tessel_patterns::annotation::LOCALITIES_KEY;
use tessel_patterns::{EvalErrorKind, Lookup};

use crate::test_helpers::{bin, call, id, int, Harness};

fn ints(values: &[i64]) -> Value {
    Value::list(values.iter().copied().map(Value::int).collect())
}

fn str_expr(value: &str) -> Expr {
    Expr::string(value)
}

/// `[dim, start, stop]` as an expression.
fn span(dim: &str, start: i64, stop: i64) -> Expr {
    Expr::list(vec![str_expr(dim), int(start), int(stop)])
}

async fn eval(expr: Expr) -> EvalResult {
    Harness::new().eval(vec![expr]).await
}

#[test]
fn operators_are_keyed_by_pattern_name() {
    let registry = core_registry().unwrap();
    for op in BinaryOp::ALL {
        assert!(
            matches!(registry.lookup(op.pattern_name(), 2), Lookup::Found(_)),
            "{} missing",
            op.pattern_name()
        );
    }
    for op in [UnaryOp::Neg, UnaryOp::Not] {
        assert!(matches!(registry.lookup(op.pattern_name(), 1), Lookup::Found(_)));
    }
}

#[test]
fn arity_is_checked_per_signature() {
    let registry = core_registry().unwrap();
    assert!(matches!(registry.lookup("range", 2), Lookup::Found(_)));
    assert!(matches!(registry.lookup("range", 4), Lookup::ArityMismatch { .. }));
    assert!(matches!(registry.lookup("list", 0), Lookup::Found(_)));
    assert!(matches!(registry.lookup("list", 5), Lookup::Found(_)));
    assert!(matches!(registry.lookup("annotate", 2), Lookup::ArityMismatch { .. }));
    assert!(matches!(registry.lookup("nope", 1), Lookup::Unknown));
}

#[test]
fn every_overload_carries_help() {
    let registry = core_registry().unwrap();
    let help = registry.help("range");
    assert_eq!(help.len(), 3);
    assert!(help.iter().all(|(_, text)| text.starts_with("range(")));
}

#[test]
fn symbols_are_distinct_for_operators() {
    let ops = [
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Mod,
        Builtin::Neg,
    ];
    let mut symbols: Vec<_> = ops.iter().map(|op| op.symbol()).collect();
    symbols.dedup();
    assert_eq!(symbols.len(), ops.len());
}

#[tokio::test(flavor = "multi_thread")]
async fn integer_arithmetic() {
    let expr = bin(
        BinaryOp::Sub,
        bin(BinaryOp::Mul, int(6), int(7)),
        bin(BinaryOp::Div, int(7), int(2)),
    );
    assert_eq!(eval(expr).await.unwrap(), Value::int(39));
    assert_eq!(eval(bin(BinaryOp::Mod, int(7), int(3))).await.unwrap(), Value::int(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn mixed_arithmetic_promotes_to_float() {
    let expr = bin(BinaryOp::Add, int(1), Expr::float(0.5));
    assert_eq!(eval(expr).await.unwrap(), Value::float(1.5));
}

#[tokio::test(flavor = "multi_thread")]
async fn integer_division_by_zero() {
    let err = eval(bin(BinaryOp::Div, int(1), int(0))).await.unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    assert!(err.node.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn integer_overflow_is_a_domain_error() {
    let err = eval(bin(BinaryOp::Add, int(i64::MAX), int(1))).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Domain { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn strings_and_lists_concatenate() {
    let expr = bin(BinaryOp::Add, str_expr("tes"), str_expr("sel"));
    assert_eq!(eval(expr).await.unwrap(), Value::string("tessel"));

    let expr = bin(
        BinaryOp::Add,
        Expr::list(vec![int(1)]),
        Expr::list(vec![int(2), int(3)]),
    );
    assert_eq!(eval(expr).await.unwrap(), ints(&[1, 2, 3]));
}

#[tokio::test(flavor = "multi_thread")]
async fn mismatched_operands_are_type_errors() {
    let err = eval(bin(BinaryOp::Sub, str_expr("a"), int(1))).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn comparisons_and_logic() {
    assert_eq!(eval(bin(BinaryOp::Lt, int(1), int(2))).await.unwrap(), Value::bool(true));
    assert_eq!(
        eval(bin(BinaryOp::GtEq, Expr::float(1.0), int(2))).await.unwrap(),
        Value::bool(false)
    );
    assert_eq!(
        eval(bin(BinaryOp::Lt, str_expr("abc"), str_expr("abd"))).await.unwrap(),
        Value::bool(true)
    );
    assert_eq!(
        eval(bin(BinaryOp::Eq, Expr::list(vec![int(1)]), Expr::list(vec![int(1)])))
            .await
            .unwrap(),
        Value::bool(true)
    );
    assert_eq!(
        eval(bin(BinaryOp::And, Expr::bool(true), int(0))).await.unwrap(),
        Value::bool(false)
    );
    assert_eq!(
        eval(bin(BinaryOp::Or, Expr::bool(false), int(3))).await.unwrap(),
        Value::bool(true)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unary_operators() {
    assert_eq!(eval(Expr::unary(UnaryOp::Neg, int(4))).await.unwrap(), Value::int(-4));
    assert_eq!(
        eval(Expr::unary(UnaryOp::Not, Expr::bool(true))).await.unwrap(),
        Value::bool(false)
    );
    let err = eval(Expr::unary(UnaryOp::Neg, str_expr("x"))).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn ranges_and_len() {
    assert_eq!(eval(call("range", vec![int(3)])).await.unwrap(), ints(&[0, 1, 2]));
    assert_eq!(
        eval(call("range", vec![int(1), int(7), int(2)])).await.unwrap(),
        ints(&[1, 3, 5])
    );
    assert_eq!(
        eval(call("len", vec![Expr::list(vec![int(1), int(2)])])).await.unwrap(),
        Value::int(2)
    );
    assert_eq!(eval(call("len", vec![str_expr("héllo")])).await.unwrap(), Value::int(5));
    let err = eval(call("len", vec![int(1)])).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn filter_keeps_truthy_elements() {
    let keep = call("lambda", vec![id("x"), bin(BinaryOp::Gt, id("x"), int(1))]);
    let expr = call("filter", vec![keep, Expr::list(vec![int(1), int(2), int(3)])]);
    assert_eq!(eval(expr).await.unwrap(), ints(&[2, 3]));
}

#[tokio::test(flavor = "multi_thread")]
async fn map_applies_to_every_element() {
    let square = call("lambda", vec![id("x"), bin(BinaryOp::Mul, id("x"), id("x"))]);
    let expr = call("map", vec![square, call("range", vec![int(4)])]);
    assert_eq!(eval(expr).await.unwrap(), ints(&[0, 1, 4, 9]));
}

#[tokio::test(flavor = "multi_thread")]
async fn folds_associate_in_opposite_directions() {
    let sum = call(
        "lambda",
        vec![id("acc"), id("v"), bin(BinaryOp::Add, id("acc"), id("v"))],
    );
    let expr = call("fold_left", vec![sum, int(0), Expr::list(vec![int(1), int(2), int(3)])]);
    assert_eq!(eval(expr).await.unwrap(), Value::int(6));

    // f(a, b) = a - b: left is ((10 - 1) - 2), right is 1 - (2 - 10)
    let minus = || call("lambda", vec![id("a"), id("b"), bin(BinaryOp::Sub, id("a"), id("b"))]);
    let items = || Expr::list(vec![int(1), int(2)]);
    let left = call("fold_left", vec![minus(), int(10), items()]);
    let right = call("fold_right", vec![minus(), int(10), items()]);
    assert_eq!(eval(left).await.unwrap(), Value::int(7));
    assert_eq!(eval(right).await.unwrap(), Value::int(9));
}

#[tokio::test(flavor = "multi_thread")]
async fn higher_order_operations_need_a_function() {
    let err = eval(call("map", vec![int(1), Expr::list(vec![int(1)])])).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NotCallable { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn plain_annotations_attach_locally() {
    let annotated = call(
        "annotate",
        vec![Expr::list(vec![int(1)]), str_expr("units"), str_expr("m")],
    );
    let expr = call("annotation", vec![annotated, str_expr("units")]);
    assert_eq!(eval(expr).await.unwrap(), Value::list(vec![Value::string("m")]));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_annotation_is_nil() {
    let expr = call("annotation", vec![Expr::list(vec![int(1)]), str_expr("units")]);
    assert!(eval(expr).await.unwrap().is_nil());

    let expr = call("annotation", vec![Expr::list(vec![int(1)])]);
    assert_eq!(eval(expr).await.unwrap(), Value::list(Vec::new()));
}

#[tokio::test(flavor = "multi_thread")]
async fn strings_cannot_carry_annotations() {
    let expr = call("annotate", vec![str_expr("s"), str_expr("units"), str_expr("m")]);
    let err = eval(expr).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn single_locality_tile_reconciles_with_itself() {
    let tiled = call(
        "annotate",
        vec![
            Expr::list(vec![int(1), int(2)]),
            str_expr("tile"),
            span("columns", 0, 2),
        ],
    );
    let localities = call(
        "annotation",
        vec![tiled.clone(), str_expr(LOCALITIES_KEY)],
    );
    let expected = Value::list(vec![Value::list(vec![
        Value::int(0),
        Value::list(vec![Value::list(vec![
            Value::string("columns"),
            Value::int(0),
            Value::int(2),
        ])]),
    ])]);
    assert_eq!(eval(localities).await.unwrap(), expected);

    let extent = call("tiling_extent", vec![tiled]);
    assert_eq!(
        eval(extent).await.unwrap(),
        Value::list(vec![Value::list(vec![
            Value::string("columns"),
            Value::int(0),
            Value::int(2),
        ])])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_tiles_are_rejected() {
    let expr = call(
        "annotate",
        vec![Expr::list(vec![int(1)]), str_expr("tile"), int(3)],
    );
    assert!(eval(expr).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn tiling_extent_needs_a_tile() {
    let err = eval(call("tiling_extent", vec![Expr::list(vec![int(1)])])).await.unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Domain { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn locality_queries() {
    assert_eq!(eval(call("locality", Vec::new())).await.unwrap(), Value::int(0));
    assert_eq!(eval(call("num_localities", Vec::new())).await.unwrap(), Value::int(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn debug_is_void() {
    let expr = call("debug", vec![str_expr("x ="), int(1)]);
    assert!(eval(expr).await.unwrap().is_void());
}
