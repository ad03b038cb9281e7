//! Functions: lambdas, closures, partial application and calls.

use std::sync::Arc;

use futures_util::future::{self, FutureExt};
use tracing::trace;

use tessel_patterns::errors::{not_callable, undefined_argument, wrong_arg_count};
use tessel_patterns::{
    evaluate_operand, evaluate_operands, Activation, EvalContext, EvalError, EvalFuture,
    EvalMode, Primitive, PrimitiveName, PrimitiveRef, Value,
};

use super::invoke_if_called;

/// How a call's argument count relates to the callee's arity.
enum Application {
    Full,
    Partial,
}

fn application(
    name: &PrimitiveName,
    arity: usize,
    argc: usize,
    mode: EvalMode,
) -> Result<Application, EvalError> {
    if argc == arity {
        Ok(Application::Full)
    } else if argc < arity && !mode.evaluates_partials() {
        Ok(Application::Partial)
    } else {
        let callee = name.instance.as_deref().unwrap_or(&name.primitive);
        Err(wrong_arg_count(callee, arity, argc))
    }
}

/// Run `lambda`'s body in a fresh activation whose parent is `captured`.
fn apply(
    callee: PrimitiveRef,
    lambda: &Lambda,
    captured: Option<Arc<Activation>>,
    args: Vec<Value>,
    ctx: EvalContext,
) -> EvalFuture {
    match application(callee.name(), lambda.arity, args.len(), ctx.mode()) {
        Ok(Application::Full) => {
            trace!(callee = %callee.name(), argc = args.len(), "call");
            let ctx = ctx.with_activation(Activation::new(args, captured));
            evaluate_operand(&lambda.body, &ctx)
        }
        Ok(Application::Partial) => {
            let partial = Partial::new(callee, args);
            future::ready(Ok(Value::primitive(PrimitiveRef::new(partial)))).boxed()
        }
        Err(err) => future::ready(Err(err)).boxed(),
    }
}

/// `lambda(a1..aN, body)`.
///
/// Evaluating a lambda yields a [`Closure`] over the current activation. In
/// `DONT_WRAP_FUNCTIONS` mode it yields itself, an unwrapped function with
/// no captured activation.
pub struct Lambda {
    name: PrimitiveName,
    arity: usize,
    body: Value,
    operands: Vec<Value>,
}

impl Lambda {
    pub fn new(name: PrimitiveName, arity: usize, body: Value) -> Self {
        Lambda {
            name,
            arity,
            operands: vec![body.clone()],
            body,
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl Primitive for Lambda {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        let value = if ctx.mode().wraps_functions() {
            Value::primitive(PrimitiveRef::new(Closure::new(
                self,
                ctx.capture(),
            )))
        } else {
            Value::primitive(PrimitiveRef::from_arc(self))
        };
        future::ready(Ok(value)).boxed()
    }

    fn callable_arity(&self) -> Option<usize> {
        Some(self.arity)
    }

    fn call(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        apply(PrimitiveRef::from_arc(self.clone()), &self, None, args, ctx)
    }
}

/// A lambda bound to the activation it was created in.
pub struct Closure {
    name: PrimitiveName,
    lambda: Arc<Lambda>,
    captured: Option<Arc<Activation>>,
    operands: Vec<Value>,
}

impl Closure {
    pub fn new(lambda: Arc<Lambda>, captured: Option<Arc<Activation>>) -> Self {
        let name = PrimitiveName {
            primitive: "closure".to_string(),
            ..lambda.name.clone()
        };
        Closure {
            name,
            operands: vec![Value::primitive(PrimitiveRef::from_arc(lambda.clone()))],
            lambda,
            captured,
        }
    }
}

impl Primitive for Closure {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        let value = Value::primitive(PrimitiveRef::from_arc(self));
        async move { invoke_if_called(value, args, &ctx).await }.boxed()
    }

    fn callable_arity(&self) -> Option<usize> {
        Some(self.lambda.arity)
    }

    fn call(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        let captured = self.captured.clone();
        apply(
            PrimitiveRef::from_arc(self.clone()),
            &self.lambda,
            captured,
            args,
            ctx,
        )
    }
}

/// A callable with its leading arguments already supplied.
pub struct Partial {
    name: PrimitiveName,
    target: PrimitiveRef,
    bound: Vec<Value>,
}

impl Partial {
    pub fn new(target: PrimitiveRef, bound: Vec<Value>) -> Self {
        let name = PrimitiveName {
            primitive: "partial".to_string(),
            ..target.name().clone()
        };
        Partial {
            name,
            target,
            bound,
        }
    }
}

impl Primitive for Partial {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        let value = Value::primitive(PrimitiveRef::from_arc(self));
        async move { invoke_if_called(value, args, &ctx).await }.boxed()
    }

    fn callable_arity(&self) -> Option<usize> {
        self.target
            .callable_arity()
            .map(|arity| arity.saturating_sub(self.bound.len()))
    }

    fn call(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        let mut all = self.bound.clone();
        all.extend(args);
        self.target.call(all, ctx)
    }
}

/// `f(args...)` where `f` is bound in the environment.
///
/// The first operand evaluates to the callee, the rest to its arguments.
pub struct CallFunction {
    name: PrimitiveName,
    operands: Vec<Value>,
}

impl CallFunction {
    pub fn new(name: PrimitiveName, callee: Value, args: Vec<Value>) -> Self {
        let mut operands = Vec::with_capacity(args.len() + 1);
        operands.push(callee);
        operands.extend(args);
        CallFunction { name, operands }
    }
}

impl Primitive for CallFunction {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let Some((callee, args)) = self.operands.split_first() else {
                return Err(not_callable("nothing"));
            };
            let callee = evaluate_operand(callee, &ctx).await?;
            let args = evaluate_operands(args, &ctx).await?;
            match callee.as_callable() {
                Some(function) => function.call(args, ctx.invoking_ctx()).await,
                None => Err(not_callable(callee.type_name())),
            }
        }
        .boxed()
    }
}

/// A function parameter, `depth` function levels up.
pub struct AccessArgument {
    name: PrimitiveName,
    index: usize,
    depth: usize,
}

impl AccessArgument {
    pub fn new(name: PrimitiveName, index: usize, depth: usize) -> Self {
        AccessArgument { name, index, depth }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Primitive for AccessArgument {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        let value = ctx
            .activation()
            .and_then(|activation| activation.ancestor(self.depth))
            .and_then(|activation| activation.args().get(self.index))
            .cloned()
            .ok_or_else(|| undefined_argument(self.index, self.depth));
        async move { invoke_if_called(value?, args, &ctx).await }.boxed()
    }
}
