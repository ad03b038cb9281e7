//! List construction and the higher-order list operations.

use tessel_patterns::errors::{not_callable, type_mismatch};
use tessel_patterns::{EvalContext, EvalError, EvalResult, PrimitiveRef, Value};

fn int_arg(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Int64(a) => a.scalar_value().ok_or_else(|| type_mismatch("integer", "int array")),
        other => Err(type_mismatch("integer", other.type_name())),
    }
}

/// `range(stop)`, `range(start, stop)`, `range(start, stop, step)`.
pub(super) fn range(args: &[Value]) -> EvalResult {
    match args {
        [stop] => Value::range(0, int_arg(stop)?, 1),
        [start, stop] => Value::range(int_arg(start)?, int_arg(stop)?, 1),
        [start, stop, step] => Value::range(int_arg(start)?, int_arg(stop)?, int_arg(step)?),
        _ => Err(type_mismatch("one to three integers", "other arguments")),
    }
}

/// Number of elements: list items, dict entries, string characters, or the
/// extent of an array's first dimension.
pub(super) fn len(value: &Value) -> EvalResult {
    let n = match value {
        Value::List(l) => l.len(),
        Value::Dict(d) => d.len(),
        Value::Str(s) => s.chars().count(),
        Value::Bool(a) if !a.is_scalar() => a.shape()[0],
        Value::Int64(a) if !a.is_scalar() => a.shape()[0],
        Value::Float64(a) if !a.is_scalar() => a.shape()[0],
        other => return Err(type_mismatch("list, dict, string or array", other.type_name())),
    };
    i64::try_from(n)
        .map(Value::int)
        .map_err(|_| type_mismatch("length that fits an integer", "larger length"))
}

fn callable(value: &Value) -> Result<PrimitiveRef, EvalError> {
    value
        .as_callable()
        .cloned()
        .ok_or_else(|| not_callable(value.type_name()))
}

/// `filter(f, list)`: the elements for which `f` is truthy.
pub(super) async fn filter(function: &Value, list: &Value, ctx: &EvalContext) -> EvalResult {
    let function = callable(function)?;
    let mut kept = Vec::new();
    for item in list.to_items()? {
        if function.call(vec![item.clone()], ctx.clone()).await?.is_truthy() {
            kept.push(item);
        }
    }
    Ok(Value::list(kept))
}

/// `map(f, list)`.
pub(super) async fn map(function: &Value, list: &Value, ctx: &EvalContext) -> EvalResult {
    let function = callable(function)?;
    let items = list.to_items()?;
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(function.call(vec![item], ctx.clone()).await?);
    }
    Ok(Value::list(mapped))
}

/// `fold_left(f, init, list)`: `f(f(f(init, x0), x1), x2)`.
pub(super) async fn fold_left(
    function: &Value,
    init: Value,
    list: &Value,
    ctx: &EvalContext,
) -> EvalResult {
    let function = callable(function)?;
    let mut acc = init;
    for item in list.to_items()? {
        acc = function.call(vec![acc, item], ctx.clone()).await?;
    }
    Ok(acc)
}

/// `fold_right(f, init, list)`: `f(x0, f(x1, f(x2, init)))`.
pub(super) async fn fold_right(
    function: &Value,
    init: Value,
    list: &Value,
    ctx: &EvalContext,
) -> EvalResult {
    let function = callable(function)?;
    let mut acc = init;
    for item in list.to_items()?.into_iter().rev() {
        acc = function.call(vec![item, acc], ctx.clone()).await?;
    }
    Ok(acc)
}
