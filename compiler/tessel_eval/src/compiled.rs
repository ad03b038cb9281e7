//! A compiled program, ready to run.

use std::fmt;
use std::sync::Arc;

use futures_util::future::FutureExt;
use rustc_hash::FxHashSet;

use tessel_patterns::errors::not_callable;
use tessel_patterns::{
    evaluate_operand, EvalContext, EvalFuture, EvalMode, EvalResult, ExpressionTopology, Locality,
    PrimitiveName, PrimitiveRef, Value,
};

/// The root of a compiled tree plus its entry point.
///
/// The entry point is the variable bound by the last top-level statement when
/// that statement is a `define`; [`call`](CompiledFunction::call) invokes it.
/// The returned futures are `'static`, so they can be spawned.
#[derive(Clone)]
pub struct CompiledFunction {
    root: PrimitiveRef,
    entry: Option<PrimitiveRef>,
    locality: Arc<Locality>,
    mode: EvalMode,
}

impl CompiledFunction {
    pub fn new(root: PrimitiveRef, entry: Option<PrimitiveRef>, locality: Arc<Locality>) -> Self {
        CompiledFunction {
            root,
            entry,
            locality,
            mode: EvalMode::empty(),
        }
    }

    /// Evaluate with `mode` instead of the default empty mode.
    #[must_use]
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn root(&self) -> &PrimitiveRef {
        &self.root
    }

    #[inline]
    pub fn entry(&self) -> Option<&PrimitiveRef> {
        self.entry.as_ref()
    }

    #[inline]
    pub fn name(&self) -> &PrimitiveName {
        self.root.name()
    }

    #[inline]
    pub fn locality(&self) -> &Arc<Locality> {
        &self.locality
    }

    /// A top-level context for this program.
    pub fn context(&self) -> EvalContext {
        EvalContext::new(Arc::clone(&self.locality)).with_mode(self.mode)
    }

    /// Evaluate the whole tree.
    pub fn run(&self) -> EvalFuture {
        self.root.eval(Vec::new(), self.context())
    }

    /// Run the program, then apply its entry point to `args`.
    ///
    /// Without a `define` as the last statement, the program's own value is
    /// the target. A callable target is called with `args`; any other target
    /// is returned as is when `args` is empty.
    pub fn call(&self, args: Vec<Value>) -> EvalFuture {
        let run = self.run();
        let entry = self.entry.clone();
        let ctx = self.context();
        async move {
            let value = run.await?;
            let target = match entry {
                Some(entry) => evaluate_operand(&Value::primitive(entry), &ctx).await?,
                None => value,
            };
            match target.as_callable() {
                Some(function) => function.call(args, ctx.invoking_ctx()).await,
                None if args.is_empty() => Ok(target),
                None => Err(not_callable(target.type_name())),
            }
        }
        .boxed()
    }

    /// [`run`](CompiledFunction::run), blocking the current thread.
    ///
    /// See [`PrimitiveRef::eval_direct`] for which runtimes allow this.
    pub fn run_blocking(&self) -> EvalResult {
        self.root.eval_direct(Vec::new(), self.context())
    }

    /// The graph of nodes reachable from the root.
    pub fn topology(&self) -> ExpressionTopology {
        self.root.expression_topology(&mut FxHashSet::default())
    }
}

impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("root", &self.root)
            .field("entry", &self.entry)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
