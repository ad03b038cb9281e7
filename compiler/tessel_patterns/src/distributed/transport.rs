//! Cross-locality invocation.

use std::sync::{Arc, Weak};

use futures_util::future::FutureExt;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::Locality;
use crate::context::{EvalContext, EvalMode};
use crate::errors::unresolved_name;
use crate::naming::PrimitiveName;
use crate::primitive::{EvalFuture, Primitive};
use crate::value::Value;

/// Carries an evaluation request to the locality owning `target`.
///
/// Implementations return the same future type as local evaluation, so a
/// remote node is indistinguishable from a local one to its caller.
pub trait Transport: Send + Sync {
    fn invoke(&self, target: PrimitiveName, args: Vec<Value>, mode: EvalMode) -> EvalFuture;
}

/// Transport between localities living in one process.
#[derive(Default)]
pub struct InProcessTransport {
    localities: RwLock<FxHashMap<u32, Weak<Locality>>>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `locality` reachable through this transport.
    pub fn attach(&self, locality: &Arc<Locality>) {
        self.localities
            .write()
            .insert(locality.id(), Arc::downgrade(locality));
    }
}

impl Transport for InProcessTransport {
    fn invoke(&self, target: PrimitiveName, args: Vec<Value>, mode: EvalMode) -> EvalFuture {
        let owner = self
            .localities
            .read()
            .get(&target.locality)
            .and_then(Weak::upgrade);
        async move {
            let owner = owner.ok_or_else(|| unresolved_name(&target.compose()))?;
            trace!(target = %target, "remote invocation");
            let node = owner.resolve(&target)?;
            node.eval(args, EvalContext::new(owner).with_mode(mode)).await
        }
        .boxed()
    }
}

/// Stand-in for a node owned by another locality.
pub struct RemotePrimitive {
    name: PrimitiveName,
    transport: Arc<dyn Transport>,
}

impl RemotePrimitive {
    pub fn new(name: PrimitiveName, transport: Arc<dyn Transport>) -> Self {
        RemotePrimitive { name, transport }
    }
}

impl Primitive for RemotePrimitive {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn eval(self: Arc<Self>, args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        self.transport.invoke(self.name.clone(), args, ctx.mode())
    }
}
