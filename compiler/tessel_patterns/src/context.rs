//! Per-evaluation state threaded through the primitive tree.
//!
//! An [`EvalContext`] is passed by value: cloning it is cheap (a mode
//! bitset plus two `Arc`s). Concurrent branches of `parallel_block` get a
//! [`fork`](EvalContext::fork) whose local frame is a private copy; the
//! parent [`join`](EvalContext::join)s the copies back once every branch
//! has finished.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::distributed::Locality;
use crate::value::Value;

bitflags! {
    /// Evaluation mode flags.
    ///
    /// The empty set is the mode a host uses for a top-level invocation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EvalMode: u8 {
        /// Return callables reached as data instead of invoking them.
        /// Set on every internal operand evaluation.
        const DONT_EVALUATE_LAMBDAS = 1;
        /// `lambda` yields an unwrapped function that does not capture the
        /// current activation.
        const DONT_WRAP_FUNCTIONS = 1 << 1;
        /// Under-applied calls produce a partial application instead of an
        /// arity error.
        const DONT_EVALUATE_PARTIALS = 1 << 2;
    }
}

impl EvalMode {
    /// Whether a callable evaluated with arguments should be invoked.
    #[inline]
    pub fn evaluates_lambdas(self) -> bool {
        !self.contains(Self::DONT_EVALUATE_LAMBDAS)
    }

    /// Whether `lambda` captures the current activation.
    #[inline]
    pub fn wraps_functions(self) -> bool {
        !self.contains(Self::DONT_WRAP_FUNCTIONS)
    }

    /// Whether under-application is an error.
    #[inline]
    pub fn evaluates_partials(self) -> bool {
        !self.contains(Self::DONT_EVALUATE_PARTIALS)
    }
}

/// Unique id of a function-local variable, used as its frame slot key.
pub type SlotId = u64;

#[derive(Clone, Debug)]
struct Slot {
    value: Value,
    generation: u64,
}

/// Storage for the variables defined inside one function activation.
#[derive(Clone, Default)]
pub struct Frame(Arc<Mutex<FxHashMap<SlotId, Slot>>>);

impl Frame {
    pub fn get(&self, slot: SlotId) -> Option<Value> {
        self.0.lock().get(&slot).map(|s| s.value.clone())
    }

    pub fn set(&self, slot: SlotId, value: Value) {
        let mut slots = self.0.lock();
        let generation = slots.get(&slot).map_or(1, |s| s.generation + 1);
        slots.insert(slot, Slot { value, generation });
    }

    /// A private copy of this frame.
    fn fork(&self) -> Frame {
        Frame(Arc::new(Mutex::new(self.0.lock().clone())))
    }

    /// Copy into this frame every slot the branches changed, in branch order.
    fn join(&self, branches: &[&Frame]) {
        let base: FxHashMap<SlotId, u64> = self
            .0
            .lock()
            .iter()
            .map(|(id, s)| (*id, s.generation))
            .collect();
        for branch in branches {
            let changed: Vec<(SlotId, Value)> = branch
                .0
                .lock()
                .iter()
                .filter(|(id, s)| base.get(*id) != Some(&s.generation))
                .map(|(id, s)| (*id, s.value.clone()))
                .collect();
            for (id, value) in changed {
                self.set(id, value);
            }
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frame").field(&self.0.lock().len()).finish()
    }
}

/// The runtime record of one function call.
#[derive(Debug)]
pub struct Activation {
    args: Vec<Value>,
    frame: Frame,
    parent: Option<Arc<Activation>>,
    /// For a branch fork, the activation it was forked from.
    origin: Option<Arc<Activation>>,
}

impl Activation {
    pub fn new(args: Vec<Value>, parent: Option<Arc<Activation>>) -> Arc<Self> {
        Arc::new(Activation {
            args,
            frame: Frame::default(),
            parent,
            origin: None,
        })
    }

    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    #[inline]
    pub fn parent(&self) -> Option<&Arc<Activation>> {
        self.parent.as_ref()
    }

    /// The activation `depth` levels up the closure chain.
    pub fn ancestor(&self, depth: usize) -> Option<&Activation> {
        let mut current = self;
        for _ in 0..depth {
            current = current.parent.as_deref()?;
        }
        Some(current)
    }

    /// Like [`ancestor`](Activation::ancestor), as an owned handle.
    pub fn ancestor_arc(this: &Arc<Activation>, depth: usize) -> Option<Arc<Activation>> {
        let mut current = this;
        for _ in 0..depth {
            current = current.parent.as_ref()?;
        }
        Some(Arc::clone(current))
    }

    /// The activation closures created here bind to.
    ///
    /// A branch fork is private to its branch and discarded after the join,
    /// so closures bind to the activation it was forked from.
    pub fn origin(this: &Arc<Activation>) -> Arc<Activation> {
        this.origin.clone().unwrap_or_else(|| Arc::clone(this))
    }

    #[inline]
    pub fn is_fork(&self) -> bool {
        self.origin.is_some()
    }

    fn fork(this: &Arc<Activation>) -> Arc<Activation> {
        Arc::new(Activation {
            args: this.args.clone(),
            frame: this.frame.fork(),
            parent: this.parent.clone(),
            origin: Some(Activation::origin(this)),
        })
    }
}

/// Per-evaluation context.
#[derive(Clone)]
pub struct EvalContext {
    mode: EvalMode,
    activation: Option<Arc<Activation>>,
    locality: Arc<Locality>,
}

impl EvalContext {
    /// A top-level context on `locality`: empty mode, no activation.
    pub fn new(locality: Arc<Locality>) -> Self {
        EvalContext {
            mode: EvalMode::empty(),
            activation: None,
            locality,
        }
    }

    #[inline]
    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    #[inline]
    pub fn locality(&self) -> &Arc<Locality> {
        &self.locality
    }

    #[inline]
    pub fn activation(&self) -> Option<&Arc<Activation>> {
        self.activation.as_ref()
    }

    #[must_use]
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_activation(mut self, activation: Arc<Activation>) -> Self {
        self.activation = Some(activation);
        self
    }

    #[must_use]
    pub fn without_activation(mut self) -> Self {
        self.activation = None;
        self
    }

    /// Context for evaluating an operand: callables stay data.
    pub fn operand_ctx(&self) -> Self {
        let mut ctx = self.clone();
        ctx.mode |= EvalMode::DONT_EVALUATE_LAMBDAS;
        ctx
    }

    /// Context for evaluating a value that may be invoked.
    pub fn invoking_ctx(&self) -> Self {
        let mut ctx = self.clone();
        ctx.mode.remove(EvalMode::DONT_EVALUATE_LAMBDAS);
        ctx
    }

    /// The activation a closure created in this context captures.
    pub fn capture(&self) -> Option<Arc<Activation>> {
        self.activation.as_ref().map(Activation::origin)
    }

    /// This context moved `depth` function levels up the closure chain,
    /// where a variable defined at that level evaluates its body.
    pub fn at_depth(&self, depth: usize) -> Option<Self> {
        if depth == 0 {
            return Some(self.clone());
        }
        let activation = Activation::ancestor_arc(self.activation.as_ref()?, depth)?;
        Some(self.clone().with_activation(activation))
    }

    /// The frame variables `depth` function levels up are stored in.
    pub fn frame(&self, depth: usize) -> Option<&Frame> {
        self.activation
            .as_deref()
            .and_then(|a| a.ancestor(depth))
            .map(Activation::frame)
    }

    /// A context for a concurrent branch, with a private local frame.
    pub fn fork(&self) -> Self {
        EvalContext {
            mode: self.mode,
            activation: self.activation.as_ref().map(Activation::fork),
            locality: Arc::clone(&self.locality),
        }
    }

    /// Merge the local frames of finished branches back, later branches
    /// winning when two wrote the same variable.
    pub fn join(&self, branches: &[EvalContext]) {
        let Some(activation) = &self.activation else {
            return;
        };
        let frames: Vec<&Frame> = branches
            .iter()
            .filter_map(|b| b.activation.as_deref().map(Activation::frame))
            .collect();
        activation.frame.join(&frames);
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("mode", &self.mode)
            .field("activation", &self.activation.is_some())
            .field("locality", &self.locality.id())
            .finish()
    }
}
