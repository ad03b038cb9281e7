//! Control flow: `block`, `if`, `while` and `parallel_block`.

use std::sync::Arc;

use futures_util::future::{self, FutureExt};
use tracing::trace;

use tessel_patterns::{
    evaluate_operand, EvalContext, EvalFuture, EvalResult, Primitive, PrimitiveName, Value,
};

/// Evaluates its operands in order. The value is the last non-void one.
pub struct Block {
    name: PrimitiveName,
    operands: Vec<Value>,
}

impl Block {
    pub fn new(name: PrimitiveName, operands: Vec<Value>) -> Self {
        Block { name, operands }
    }
}

impl Primitive for Block {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            trace!(node = %self.name, statements = self.operands.len(), "block");
            let mut last = Value::void();
            for operand in &self.operands {
                let value = evaluate_operand(operand, &ctx).await?;
                if !value.is_void() {
                    last = value;
                }
            }
            Ok(last)
        }
        .boxed()
    }
}

/// `if(cond, then)` / `if(cond, then, else)`.
pub struct If {
    name: PrimitiveName,
    operands: Vec<Value>,
}

impl If {
    pub fn new(name: PrimitiveName, condition: Value, then: Value, otherwise: Option<Value>) -> Self {
        let mut operands = vec![condition, then];
        operands.extend(otherwise);
        If { name, operands }
    }
}

impl Primitive for If {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let (condition, branches) = match self.operands.split_first() {
                Some(split) => split,
                None => return Ok(Value::void()),
            };
            let taken = if evaluate_operand(condition, &ctx).await?.is_truthy() {
                branches.first()
            } else {
                branches.get(1)
            };
            match taken {
                Some(branch) => evaluate_operand(branch, &ctx).await,
                None => Ok(Value::void()),
            }
        }
        .boxed()
    }
}

/// `while(cond, body)`.
pub struct While {
    name: PrimitiveName,
    operands: Vec<Value>,
}

impl While {
    pub fn new(name: PrimitiveName, condition: Value, body: Value) -> Self {
        While {
            name,
            operands: vec![condition, body],
        }
    }
}

impl Primitive for While {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let [condition, body] = self.operands.as_slice() else {
                return Ok(Value::void());
            };
            let mut last = Value::void();
            let mut iterations = 0u64;
            while evaluate_operand(condition, &ctx).await?.is_truthy() {
                let value = evaluate_operand(body, &ctx).await?;
                if !value.is_void() {
                    last = value;
                }
                iterations += 1;
            }
            trace!(node = %self.name, iterations, "while finished");
            Ok(last)
        }
        .boxed()
    }
}

/// Evaluates every operand concurrently, each on a forked context.
///
/// Once all branches finish, their local frames are merged back in operand
/// order. The first failure in operand order is reported; the other
/// branches still run to completion.
pub struct ParallelBlock {
    name: PrimitiveName,
    operands: Vec<Value>,
}

impl ParallelBlock {
    pub fn new(name: PrimitiveName, operands: Vec<Value>) -> Self {
        ParallelBlock { name, operands }
    }
}

impl Primitive for ParallelBlock {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let branches: Vec<EvalContext> = self.operands.iter().map(|_| ctx.fork()).collect();
            let pending: Vec<EvalFuture> = self
                .operands
                .iter()
                .zip(&branches)
                .map(|(operand, branch)| evaluate_operand(operand, branch))
                .collect();
            trace!(node = %self.name, branches = pending.len(), "parallel block");
            let results: Vec<EvalResult> = future::join_all(pending).await;
            ctx.join(&branches);
            let values = results.into_iter().collect::<Result<Vec<_>, _>>()?;
            Ok(values.into_iter().last().unwrap_or_else(Value::void))
        }
        .boxed()
    }
}
