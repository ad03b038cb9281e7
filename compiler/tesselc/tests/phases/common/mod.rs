//! Expression builders for phase tests.
//!
//! There is no surface syntax in the workspace, so programs are spelled out
//! as trees. The helpers keep that readable.

use tessel_ir::{BinaryOp, Expr};
use tessel_patterns::Value;

pub fn int(value: i64) -> Expr {
    Expr::int(value)
}

pub fn id(name: &str) -> Expr {
    Expr::ident(name)
}

pub fn string(value: &str) -> Expr {
    Expr::string(value)
}

pub fn list(items: Vec<Expr>) -> Expr {
    Expr::list(items)
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args)
}

pub fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::binary(op, left, right)
}

pub fn define(name: &str, value: Expr) -> Expr {
    call("define", vec![id(name), value])
}

/// `define(name, params..., body)`
pub fn define_fn(name: &str, params: &[&str], body: Expr) -> Expr {
    let mut args = vec![id(name)];
    args.extend(params.iter().map(|p| id(p)));
    args.push(body);
    call("define", args)
}

pub fn lambda(params: &[&str], body: Expr) -> Expr {
    let mut args: Vec<Expr> = params.iter().map(|p| id(p)).collect();
    args.push(body);
    call("lambda", args)
}

pub fn store(target: &str, value: Expr) -> Expr {
    call("store", vec![id(target), value])
}

pub fn locality() -> Expr {
    call("locality", Vec::new())
}

/// `[dim, start, stop]` as an expression.
pub fn span(dim: &str, start: Expr, stop: Expr) -> Expr {
    list(vec![string(dim), start, stop])
}

/// `[dim, start, stop]` as a value.
pub fn span_value(dim: &str, start: i64, stop: i64) -> Value {
    Value::list(vec![Value::string(dim), Value::int(start), Value::int(stop)])
}

pub fn ints(values: &[i64]) -> Value {
    Value::list(values.iter().copied().map(Value::int).collect())
}
