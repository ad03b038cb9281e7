use tessel_eval::CompileError;
use tessel_ir::{BinaryOp, SourceTag};
use tessel_patterns::EvalErrorKind;
use tesselc::{Error, Session};

use crate::common::{bin, call, define_fn, id, int};

#[tokio::test(flavor = "multi_thread")]
async fn runtime_errors_name_the_failing_node() {
    let session = Session::new().unwrap();
    let err = session
        .eval(&[bin(BinaryOp::Div, int(1), int(0))])
        .await
        .unwrap_err();
    let eval = err.as_eval().unwrap();
    assert_eq!(eval.kind, EvalErrorKind::DivisionByZero);
    assert!(eval.node.is_some());
}

#[test]
fn compile_errors_carry_source_tags() {
    let session = Session::new().unwrap();
    let err = session
        .compile(&[call("no_such_pattern", vec![int(1)]).at(3, 7)])
        .unwrap_err();
    match err {
        Error::Compile(err) => {
            assert!(matches!(err, CompileError::UnknownPrimitive { .. }));
            assert_eq!(err.tag(), SourceTag::new(3, 7));
        }
        other => panic!("expected a compile error, got {other:?}"),
    }
}

#[test]
fn special_form_arity_is_checked_at_compile_time() {
    let session = Session::new().unwrap();
    let err = session.compile(&[call("if", vec![int(1)])]).unwrap_err();
    assert!(matches!(
        err,
        Error::Compile(CompileError::ArityMismatch { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn under_application_fails_without_deferred_partials() {
    let session = Session::new().unwrap();
    let program = [
        define_fn("sub", &["a", "b"], bin(BinaryOp::Sub, id("a"), id("b"))),
        call("sub", vec![int(10)]),
    ];
    let err = session.eval(&program).await.unwrap_err();
    assert!(matches!(
        err.as_eval().map(|e| &e.kind),
        Some(EvalErrorKind::ArityMismatch { .. })
    ));
}

#[test]
fn undefined_identifiers_are_compile_errors() {
    let session = Session::new().unwrap();
    let err = session.compile(&[id("nowhere")]).unwrap_err();
    assert!(matches!(
        err,
        Error::Compile(CompileError::UndefinedIdentifier { .. })
    ));
}
