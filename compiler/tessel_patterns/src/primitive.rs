//! The primitive evaluation contract.
//!
//! Every node of a compiled tree implements [`Primitive`]. Nodes are shared
//! through [`PrimitiveRef`] (an `Arc<dyn Primitive>`), so a compiled tree is
//! a DAG: variables and closures are referenced from several places.
//!
//! Evaluation is asynchronous. `eval` returns a boxed `'static` future that
//! resolves to the node's value; parents chain on it with `.await` and never
//! block a worker thread. [`PrimitiveRef::eval_direct`] is the one blocking
//! entry point, for synchronous hosts.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use futures_util::future::{self, BoxFuture, FutureExt};
use rustc_hash::FxHashSet;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::context::EvalContext;
use crate::errors::{invalid_state, not_callable, EvalError, EvalResult};
use crate::naming::PrimitiveName;
use crate::value::Value;

/// Future returned by [`Primitive::eval`].
pub type EvalFuture = BoxFuture<'static, EvalResult>;

/// A node of the execution tree.
pub trait Primitive: Send + Sync {
    fn name(&self) -> &PrimitiveName;

    /// Compile-time operands. Used for topology; evaluation reads whatever
    /// state the node keeps.
    fn operands(&self) -> &[Value] {
        &[]
    }

    /// Evaluate with call-time `args`.
    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture;

    /// Prepare the node for later invocation without evaluating it.
    ///
    /// Returns whether binding means anything for this node.
    fn bind(&self, _args: &[Value], _ctx: &EvalContext) -> Result<bool, EvalError> {
        Ok(false)
    }

    /// Overwrite the node's state.
    fn store(&self, _value: Value, _args: &[Value], _ctx: &EvalContext) -> Result<(), EvalError> {
        Err(invalid_state(format!("{} does not support store", self.name().primitive)))
    }

    /// Number of arguments a call expects, for callable nodes.
    fn callable_arity(&self) -> Option<usize> {
        None
    }

    /// Invoke a callable node.
    fn call(self: Arc<Self>, _args: Vec<Value>, _ctx: EvalContext) -> EvalFuture {
        let err = not_callable(&self.name().primitive).with_node(self.name());
        future::ready(Err(err)).boxed()
    }

    /// The reachable graph of named nodes below this one.
    ///
    /// Nodes already in `visited` appear as leaves, which keeps recursive
    /// functions finite.
    fn expression_topology(&self, visited: &mut FxHashSet<String>) -> ExpressionTopology {
        let name = self.name().to_string();
        if !visited.insert(name.clone()) {
            return ExpressionTopology::leaf(name);
        }
        let children = self
            .operands()
            .iter()
            .filter_map(Value::as_primitive)
            .map(|p| p.expression_topology(visited))
            .collect();
        ExpressionTopology { name, children }
    }
}

/// Shared handle to a primitive.
///
/// Equality and hashing use node identity.
#[derive(Clone)]
pub struct PrimitiveRef(Arc<dyn Primitive>);

impl PrimitiveRef {
    pub fn new<P: Primitive + 'static>(node: P) -> Self {
        PrimitiveRef(Arc::new(node))
    }

    pub fn from_arc(node: Arc<dyn Primitive>) -> Self {
        PrimitiveRef(node)
    }

    #[inline]
    pub fn as_arc(&self) -> &Arc<dyn Primitive> {
        &self.0
    }

    pub fn downgrade(&self) -> Weak<dyn Primitive> {
        Arc::downgrade(&self.0)
    }

    /// Evaluate this node, tagging failures that carry no node name yet.
    pub fn eval(&self, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        let name = self.0.name().clone();
        Arc::clone(&self.0)
            .eval(args, ctx)
            .map(move |result| result.map_err(|e| e.with_node(&name)))
            .boxed()
    }

    pub fn call(&self, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        Arc::clone(&self.0).call(args, ctx)
    }

    /// Evaluate and wait for the result on the current thread.
    ///
    /// Inside a multi-threaded runtime the worker is handed off with
    /// `block_in_place` so other tasks keep running. Without a runtime a
    /// private current-thread runtime drives the future. Blocking inside a
    /// current-thread runtime would deadlock and is refused.
    pub fn eval_direct(&self, args: Vec<Value>, ctx: EvalContext) -> EvalResult {
        let fut = self.eval(args, ctx);
        match Handle::try_current() {
            Ok(handle) => match handle.runtime_flavor() {
                RuntimeFlavor::CurrentThread => Err(invalid_state(
                    "eval_direct cannot block inside a current-thread runtime",
                )),
                _ => tokio::task::block_in_place(|| handle.block_on(fut)),
            },
            Err(_) => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| invalid_state(format!("cannot start evaluation runtime: {e}")))?
                .block_on(fut),
        }
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast::<()>()
    }
}

impl std::ops::Deref for PrimitiveRef {
    type Target = dyn Primitive;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for PrimitiveRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for PrimitiveRef {}

impl Hash for PrimitiveRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.addr(), state);
    }
}

impl fmt::Debug for PrimitiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name())
    }
}

/// Evaluate one operand: primitives are evaluated, plain values pass
/// through unchanged.
pub fn evaluate_operand(operand: &Value, ctx: &EvalContext) -> EvalFuture {
    match operand {
        Value::Primitive(node) => node.eval(Vec::new(), ctx.operand_ctx()),
        value => future::ready(Ok(value.clone())).boxed(),
    }
}

/// Evaluate operands concurrently.
///
/// All operands run to completion; the first error in operand order wins.
pub fn evaluate_operands(
    operands: &[Value],
    ctx: &EvalContext,
) -> BoxFuture<'static, Result<Vec<Value>, EvalError>> {
    let pending: Vec<EvalFuture> = operands.iter().map(|op| evaluate_operand(op, ctx)).collect();
    async move { future::join_all(pending).await.into_iter().collect() }.boxed()
}

/// Evaluate operands one after another, stopping at the first error.
pub fn evaluate_operands_sequential(
    operands: &[Value],
    ctx: &EvalContext,
) -> BoxFuture<'static, Result<Vec<Value>, EvalError>> {
    let operands = operands.to_vec();
    let ctx = ctx.clone();
    async move {
        let mut values = Vec::with_capacity(operands.len());
        for operand in &operands {
            values.push(evaluate_operand(operand, &ctx).await?);
        }
        Ok(values)
    }
    .boxed()
}

/// A node of the reachable-graph view returned by
/// [`Primitive::expression_topology`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionTopology {
    pub name: String,
    pub children: Vec<ExpressionTopology>,
}

impl ExpressionTopology {
    pub fn leaf(name: impl Into<String>) -> Self {
        ExpressionTopology {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Names of all nodes in the view, parents before children.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.name.as_str());
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Render as a Graphviz digraph.
    pub fn to_dot(&self) -> String {
        use std::fmt::Write;

        fn edges(node: &ExpressionTopology, out: &mut String) {
            for child in &node.children {
                let _ = writeln!(out, "    \"{}\" -> \"{}\";", node.name, child.name);
                edges(child, out);
            }
        }
        let mut out = String::from("digraph {\n");
        let _ = writeln!(out, "    \"{}\";", self.name);
        edges(self, &mut out);
        out.push('}');
        out
    }
}
