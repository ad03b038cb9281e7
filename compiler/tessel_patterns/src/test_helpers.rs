//! Shared fixtures for unit tests.

use std::sync::Arc;

use futures_util::future::{self, FutureExt};

use crate::context::EvalContext;
use crate::errors::EvalError;
use crate::naming::PrimitiveName;
use crate::primitive::{evaluate_operands, EvalFuture, Primitive, PrimitiveRef};
use crate::value::Value;

/// Evaluates to a fixed value, or to its operands as a list.
pub struct Fixed {
    pub name: PrimitiveName,
    pub operands: Vec<Value>,
    pub result: Option<Result<Value, EvalError>>,
}

impl Primitive for Fixed {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        match &self.result {
            Some(result) => future::ready(result.clone()).boxed(),
            None => {
                let pending = evaluate_operands(&self.operands, &ctx);
                async move { pending.await.map(Value::list) }.boxed()
            }
        }
    }
}

pub fn name(primitive: &str, sequence: u64) -> PrimitiveName {
    PrimitiveName::new(0, primitive, sequence, 1, -1)
}

/// A node returning `value`.
pub fn fixed(value: Value) -> PrimitiveRef {
    PrimitiveRef::new(Fixed {
        name: name("fixed", 0),
        operands: Vec::new(),
        result: Some(Ok(value)),
    })
}

/// A node failing with `err`.
pub fn failing(sequence: u64, err: EvalError) -> PrimitiveRef {
    PrimitiveRef::new(Fixed {
        name: name("failing", sequence),
        operands: Vec::new(),
        result: Some(Err(err)),
    })
}

/// Factory collecting its operands into a list.
pub fn collect_factory(operands: Vec<Value>, name: PrimitiveName) -> PrimitiveRef {
    PrimitiveRef::new(Fixed {
        name,
        operands,
        result: None,
    })
}
