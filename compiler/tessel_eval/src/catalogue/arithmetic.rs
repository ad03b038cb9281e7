//! Arithmetic, comparison and logic over scalars and arrays.
//!
//! Numeric operands are combined element-wise with scalar broadcasting.
//! Booleans count as integers; an integer meeting a float is promoted.
//! Integer overflow is a domain error, integer division by zero is
//! `DivisionByZero`, float arithmetic follows IEEE 754.

use std::cmp::Ordering;

use tessel_patterns::errors::{division_by_zero, domain_error, type_mismatch};
use tessel_patterns::{Element, EvalError, EvalResult, NdArray, Value};

use super::Builtin;

enum Numeric {
    Int(NdArray<i64>),
    Float(NdArray<f64>),
}

fn numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Bool(a) => Some(Numeric::Int(a.map(i64::from))),
        Value::Int64(a) => Some(Numeric::Int(a.clone())),
        Value::Float64(a) => Some(Numeric::Float(a.clone())),
        _ => None,
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "int/float mixes promote to float"
)]
fn to_float(a: &NdArray<i64>) -> NdArray<f64> {
    a.map(|v| v as f64)
}

/// Both operands converted to a common element type.
enum Promoted {
    Int(NdArray<i64>, NdArray<i64>),
    Float(NdArray<f64>, NdArray<f64>),
}

fn promote(lhs: &Value, rhs: &Value) -> Option<Promoted> {
    Some(match (numeric(lhs)?, numeric(rhs)?) {
        (Numeric::Int(l), Numeric::Int(r)) => Promoted::Int(l, r),
        (Numeric::Int(l), Numeric::Float(r)) => Promoted::Float(to_float(&l), r),
        (Numeric::Float(l), Numeric::Int(r)) => Promoted::Float(l, to_float(&r)),
        (Numeric::Float(l), Numeric::Float(r)) => Promoted::Float(l, r),
    })
}

fn overflow(op: Builtin) -> EvalError {
    domain_error(&format!("{} (integer overflow)", op.symbol()))
}

fn int_arith(op: Builtin, l: i64, r: i64) -> Result<i64, EvalError> {
    let result = match op {
        Builtin::Add => l.checked_add(r),
        Builtin::Sub => l.checked_sub(r),
        Builtin::Mul => l.checked_mul(r),
        Builtin::Div | Builtin::Mod if r == 0 => return Err(division_by_zero()),
        Builtin::Div => l.checked_div(r),
        Builtin::Mod => l.checked_rem(r),
        _ => return Err(domain_error(op.symbol())),
    };
    result.ok_or_else(|| overflow(op))
}

fn float_arith(op: Builtin, l: f64, r: f64) -> Result<f64, EvalError> {
    Ok(match op {
        Builtin::Add => l + r,
        Builtin::Sub => l - r,
        Builtin::Mul => l * r,
        Builtin::Div => l / r,
        Builtin::Mod => l % r,
        _ => return Err(domain_error(op.symbol())),
    })
}

fn compare(op: Builtin, ordering: Option<Ordering>) -> bool {
    match (op, ordering) {
        (Builtin::Lt, Some(o)) => o == Ordering::Less,
        (Builtin::Le, Some(o)) => o != Ordering::Greater,
        (Builtin::Gt, Some(o)) => o == Ordering::Greater,
        (Builtin::Ge, Some(o)) => o != Ordering::Less,
        (Builtin::Eq, Some(o)) => o == Ordering::Equal,
        (Builtin::Ne, o) => o != Some(Ordering::Equal),
        _ => false,
    }
}

/// `+ - * / %`.
pub(super) fn arithmetic(op: Builtin, lhs: &Value, rhs: &Value) -> EvalResult {
    match promote(lhs, rhs) {
        Some(Promoted::Int(l, r)) => {
            Ok(Value::Int64(l.zip_with(&r, |a, b| int_arith(op, a, b))?))
        }
        Some(Promoted::Float(l, r)) => {
            Ok(Value::Float64(l.zip_with(&r, |a, b| float_arith(op, a, b))?))
        }
        None => match (op, lhs, rhs) {
            (Builtin::Add, Value::Str(l), Value::Str(r)) => {
                Ok(Value::string(format!("{}{}", l.as_str(), r.as_str())))
            }
            (Builtin::Add, Value::List(l), Value::List(r)) => {
                let mut items = l.to_vec();
                items.extend(r.iter());
                Ok(Value::list(items))
            }
            _ => Err(operand_mismatch(lhs, rhs)),
        },
    }
}

/// `< <= > >= == !=`.
///
/// Numbers compare element-wise. Strings compare lexically. Any other pair
/// supports only `==` / `!=`, by structural equality.
pub(super) fn comparison(op: Builtin, lhs: &Value, rhs: &Value) -> EvalResult {
    match promote(lhs, rhs) {
        Some(Promoted::Int(l, r)) => {
            Ok(Value::Bool(l.zip_with(&r, |a, b| Ok(compare(op, Some(a.cmp(&b)))))?))
        }
        Some(Promoted::Float(l, r)) => Ok(Value::Bool(
            l.zip_with(&r, |a, b| Ok(compare(op, a.partial_cmp(&b))))?,
        )),
        None => match (op, lhs, rhs) {
            (_, Value::Str(l), Value::Str(r)) => {
                Ok(Value::bool(compare(op, Some(l.as_str().cmp(r.as_str())))))
            }
            (Builtin::Eq, _, _) => Ok(Value::bool(lhs == rhs)),
            (Builtin::Ne, _, _) => Ok(Value::bool(lhs != rhs)),
            _ => Err(operand_mismatch(lhs, rhs)),
        },
    }
}

/// `&&` / `||` over truthiness. Both operands are always evaluated.
pub(super) fn logic(op: Builtin, lhs: &Value, rhs: &Value) -> Value {
    match op {
        Builtin::And => Value::bool(lhs.is_truthy() && rhs.is_truthy()),
        _ => Value::bool(lhs.is_truthy() || rhs.is_truthy()),
    }
}

/// Unary `-`.
pub(super) fn negate(value: &Value) -> EvalResult {
    match value {
        Value::Int64(a) => Ok(Value::Int64(
            a.try_map(|v| v.checked_neg().ok_or_else(|| overflow(Builtin::Neg)))?,
        )),
        Value::Float64(a) => Ok(Value::Float64(a.map(|v| -v))),
        other => Err(type_mismatch("int or float", other.type_name())),
    }
}

/// Unary `!`: element-wise on numeric arrays, truthiness otherwise.
pub(super) fn not(value: &Value) -> Value {
    match value {
        Value::Bool(a) => Value::Bool(a.map(|v| !v)),
        Value::Int64(a) => Value::Bool(a.map(|v| !v.truthy())),
        Value::Float64(a) => Value::Bool(a.map(|v| !v.truthy())),
        other => Value::bool(!other.is_truthy()),
    }
}

#[cold]
fn operand_mismatch(lhs: &Value, rhs: &Value) -> EvalError {
    type_mismatch(
        "numeric operands",
        &format!("{} and {}", lhs.type_name(), rhs.type_name()),
    )
}
