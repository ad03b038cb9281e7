//! Variables: definition, access and assignment.
//!
//! A variable defined at function level 0 keeps its value in the node
//! itself, so every reference in every compilation sees the same cell.
//! Variables defined inside a function body keep one value per activation,
//! in the activation's frame under the variable's slot id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use futures_util::future::FutureExt;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use tracing::trace;

use tessel_patterns::errors::invalid_state;
use tessel_patterns::{
    evaluate_operand, EvalContext, EvalError, EvalFuture, EvalResult, ExpressionTopology,
    Primitive, PrimitiveName, PrimitiveRef, SlotId, Value,
};

use super::invoke_if_called;

static NEXT_SLOT: AtomicU64 = AtomicU64::new(0);

/// A named variable. Functions are variables whose body is a `lambda`.
pub struct Variable {
    name: PrimitiveName,
    slot: SlotId,
    level: usize,
    constant: bool,
    body: OnceLock<Value>,
    value: RwLock<Option<Value>>,
}

impl Variable {
    pub fn new(name: PrimitiveName, level: usize, constant: bool) -> Arc<Self> {
        Arc::new(Variable {
            name,
            slot: NEXT_SLOT.fetch_add(1, Ordering::Relaxed),
            level,
            constant,
            body: OnceLock::new(),
            value: RwLock::new(None),
        })
    }

    /// Function level the variable was defined at.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// The compiled body, once the definition finished compiling.
    pub fn body(&self) -> Option<&Value> {
        self.body.get()
    }

    /// Attach the compiled body. Only the first call has an effect.
    pub(crate) fn set_body(&self, body: Value) {
        if self.body.set(body).is_err() {
            trace!(variable = %self.name, "body already set");
        }
    }

    /// The instance name, for diagnostics.
    fn display_name(&self) -> &str {
        self.name.instance.as_deref().unwrap_or("variable")
    }

    fn current(&self, depth: usize, ctx: &EvalContext) -> Result<Option<Value>, EvalError> {
        if self.level == 0 {
            return Ok(self.value.read().clone());
        }
        let frame = ctx.frame(depth).ok_or_else(|| self.missing_frame(depth))?;
        Ok(frame.get(self.slot))
    }

    fn assign(&self, depth: usize, ctx: &EvalContext, value: Value) -> Result<(), EvalError> {
        if self.level == 0 {
            *self.value.write() = Some(value);
            return Ok(());
        }
        let frame = ctx.frame(depth).ok_or_else(|| self.missing_frame(depth))?;
        frame.set(self.slot, value);
        Ok(())
    }

    #[cold]
    fn missing_frame(&self, depth: usize) -> EvalError {
        invalid_state(format!(
            "`{}` is local to a function, but no activation exists {depth} level(s) up",
            self.display_name()
        ))
    }

    /// Evaluate the body and make its value current.
    ///
    /// The body was compiled at the variable's own level, so it runs in the
    /// activation `depth` levels up rather than in the accessing one.
    pub(crate) async fn initialize(&self, depth: usize, ctx: &EvalContext) -> EvalResult {
        let body = self.body.get().cloned().ok_or_else(|| {
            invalid_state(format!(
                "`{}` was used before its definition was compiled",
                self.display_name()
            ))
        })?;
        if self.level == 0 || depth == 0 {
            let value = evaluate_operand(&body, ctx).await?;
            self.assign(depth, ctx, value.clone())?;
            return Ok(value);
        }
        let defining = ctx.at_depth(depth).ok_or_else(|| self.missing_frame(depth))?;
        let value = evaluate_operand(&body, &defining).await?;
        self.assign(0, &defining, value.clone())?;
        Ok(value)
    }

    /// The current value, initializing lazily from the body.
    pub(crate) async fn value(&self, depth: usize, ctx: &EvalContext) -> EvalResult {
        match self.current(depth, ctx)? {
            Some(value) => Ok(value),
            None => self.initialize(depth, ctx).await,
        }
    }

    pub(crate) fn store_at(
        &self,
        depth: usize,
        ctx: &EvalContext,
        value: Value,
    ) -> Result<(), EvalError> {
        if self.constant {
            return Err(invalid_state(format!(
                "cannot store to constant `{}`",
                self.display_name()
            )));
        }
        self.assign(depth, ctx, value)
    }
}

impl Primitive for Variable {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        match self.body.get() {
            Some(body) => std::slice::from_ref(body),
            None => &[],
        }
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let value = self.value(0, &ctx).await?;
            invoke_if_called(value, args, &ctx).await
        }
        .boxed()
    }

    /// Literal bodies are assigned without evaluation.
    fn bind(&self, _args: &[Value], ctx: &EvalContext) -> Result<bool, EvalError> {
        match self.body.get() {
            Some(body) if body.as_primitive().is_none() => {
                self.assign(0, ctx, body.clone())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn store(&self, value: Value, _args: &[Value], ctx: &EvalContext) -> Result<(), EvalError> {
        self.store_at(0, ctx, value)
    }
}

/// The statement a `define` compiles to: (re)initializes its variable.
pub struct DefineVariable {
    name: PrimitiveName,
    variable: Arc<Variable>,
    operands: Vec<Value>,
}

impl DefineVariable {
    pub fn new(name: PrimitiveName, variable: Arc<Variable>) -> Self {
        let operands = vec![Value::primitive(PrimitiveRef::from_arc(variable.clone()))];
        DefineVariable {
            name,
            variable,
            operands,
        }
    }

    #[inline]
    pub fn variable(&self) -> &Arc<Variable> {
        &self.variable
    }
}

impl Primitive for DefineVariable {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            trace!(node = %self.name, "define");
            if !self.variable.bind(&args, &ctx)? {
                self.variable.initialize(0, &ctx).await?;
            }
            Ok(Value::void())
        }
        .boxed()
    }
}

/// Link from an access node to its variable.
///
/// References inside a variable's own body are weak: the body owns the
/// access node, so a strong link would be a cycle.
enum VariableLink {
    Strong(Arc<Variable>),
    Weak(Weak<Variable>),
}

/// A reference to a variable, `depth` function levels up.
pub struct AccessVariable {
    name: PrimitiveName,
    target: VariableLink,
    depth: usize,
}

impl AccessVariable {
    pub fn new(name: PrimitiveName, variable: &Arc<Variable>, depth: usize, weak: bool) -> Self {
        let target = if weak {
            VariableLink::Weak(Arc::downgrade(variable))
        } else {
            VariableLink::Strong(Arc::clone(variable))
        };
        AccessVariable {
            name,
            target,
            depth,
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_weak(&self) -> bool {
        matches!(self.target, VariableLink::Weak(_))
    }

    fn variable(&self) -> Result<Arc<Variable>, EvalError> {
        match &self.target {
            VariableLink::Strong(variable) => Ok(Arc::clone(variable)),
            VariableLink::Weak(variable) => variable.upgrade().ok_or_else(|| {
                invalid_state(format!(
                    "{} refers to a variable that no longer exists",
                    self.name
                ))
            }),
        }
    }
}

impl Primitive for AccessVariable {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let variable = self.variable()?;
            let value = variable.value(self.depth, &ctx).await?;
            invoke_if_called(value, args, &ctx).await
        }
        .boxed()
    }

    fn store(&self, value: Value, _args: &[Value], ctx: &EvalContext) -> Result<(), EvalError> {
        self.variable()?.store_at(self.depth, ctx, value)
    }

    fn expression_topology(&self, visited: &mut FxHashSet<String>) -> ExpressionTopology {
        let name = self.name.to_string();
        if !visited.insert(name.clone()) {
            return ExpressionTopology::leaf(name);
        }
        let children = match &self.target {
            VariableLink::Strong(variable) => vec![variable.expression_topology(visited)],
            VariableLink::Weak(variable) => variable
                .upgrade()
                .map(|v| ExpressionTopology::leaf(v.name().to_string()))
                .into_iter()
                .collect(),
        };
        ExpressionTopology { name, children }
    }
}

/// `store(target, value)`: overwrite the target node's state.
pub struct Store {
    name: PrimitiveName,
    operands: Vec<Value>,
}

impl Store {
    pub fn new(name: PrimitiveName, target: Value, value: Value) -> Self {
        Store {
            name,
            operands: vec![target, value],
        }
    }
}

impl Primitive for Store {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let [target, value] = self.operands.as_slice() else {
                return Err(invalid_state("store needs a target and a value"));
            };
            let value = evaluate_operand(value, &ctx).await?;
            match target {
                Value::Primitive(node) => node.store(value, &args, &ctx)?,
                other => {
                    return Err(invalid_state(format!(
                        "cannot store to a {} value",
                        other.type_name()
                    )))
                }
            }
            Ok(Value::void())
        }
        .boxed()
    }
}
