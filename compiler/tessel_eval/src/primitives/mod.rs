//! Execution-tree nodes built by the compiler's special forms.
//!
//! Catalogue primitives (arithmetic, lists, annotations) live in
//! [`crate::catalogue`]; everything here implements language structure.

mod control;
mod function;
mod variable;

use std::sync::Arc;

use futures_util::future::{self, FutureExt};

use tessel_patterns::{EvalContext, EvalFuture, EvalResult, Primitive, PrimitiveName, Value};

pub use control::{Block, If, ParallelBlock, While};
pub use function::{AccessArgument, CallFunction, Closure, Lambda, Partial};
pub use variable::{AccessVariable, DefineVariable, Store, Variable};

/// Invoke `value` with `args` when the context asks for invocation.
///
/// Callables reached as data (operand evaluation, or no arguments) are
/// returned unchanged.
pub(crate) async fn invoke_if_called(
    value: Value,
    args: Vec<Value>,
    ctx: &EvalContext,
) -> EvalResult {
    if args.is_empty() || !ctx.mode().evaluates_lambdas() {
        return Ok(value);
    }
    match value.as_callable().cloned() {
        Some(function) => function.call(args, ctx.clone()).await,
        None => Ok(value),
    }
}

/// A literal that had to become a node, e.g. a program that is just `42`.
pub struct Constant {
    name: PrimitiveName,
    operands: [Value; 1],
}

impl Constant {
    pub fn new(name: PrimitiveName, value: Value) -> Self {
        Constant {
            name,
            operands: [value],
        }
    }
}

impl Primitive for Constant {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, _ctx: EvalContext) -> EvalFuture {
        let [value] = &self.operands;
        future::ready(Ok(value.clone())).boxed()
    }
}
