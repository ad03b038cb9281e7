//! Localities, name resolution and cross-locality invocation.
//!
//! Each participating process (or, in tests, each in-process peer) owns one
//! [`Locality`]. It knows its id and the cluster size, keeps a
//! [`NameRegistry`] of the nodes compiled on it, and reaches other
//! localities through a [`Transport`]. Collectives go through a shared
//! [`CollectiveHub`].

mod hub;
mod transport;

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;

pub use hub::CollectiveHub;
pub use transport::{InProcessTransport, RemotePrimitive, Transport};

use crate::errors::{invalid_state, unresolved_name, DistributedSyncError, EvalError};
use crate::naming::PrimitiveName;
use crate::primitive::{Primitive, PrimitiveRef};
use crate::value::Value;

/// Default time a collective waits for every locality.
pub const DEFAULT_COLLECTIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps composed names to live nodes on one locality.
///
/// Entries hold weak references: the compiled tree owns its nodes, and a
/// dropped tree simply stops resolving.
#[derive(Default)]
pub struct NameRegistry {
    nodes: DashMap<String, Weak<dyn Primitive>>,
}

impl NameRegistry {
    pub fn register(&self, node: &PrimitiveRef) {
        self.nodes.insert(node.name().compose(), node.downgrade());
    }

    /// The live node registered under `name`.
    pub fn get(&self, name: &str) -> Option<PrimitiveRef> {
        let node = self.nodes.get(name).and_then(|weak| weak.upgrade());
        if node.is_none() {
            self.nodes.remove_if(name, |_, weak| weak.strong_count() == 0);
        }
        node.map(PrimitiveRef::from_arc)
    }

    /// Drop entries whose node no longer exists.
    pub fn prune(&self) {
        self.nodes.retain(|_, weak| weak.strong_count() > 0);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One participant of a (possibly single-member) cluster.
pub struct Locality {
    id: u32,
    count: u32,
    names: NameRegistry,
    hub: Arc<CollectiveHub>,
    collective_timeout: Duration,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    generations: DashMap<String, u64>,
}

impl Locality {
    /// Locality `id` of a cluster of `count`, meeting the others at `hub`.
    pub fn new(
        id: u32,
        count: u32,
        hub: Arc<CollectiveHub>,
        collective_timeout: Duration,
    ) -> Result<Arc<Self>, EvalError> {
        if count == 0 || id >= count {
            return Err(invalid_state(format!(
                "locality {id} is outside a cluster of {count}"
            )));
        }
        if usize::try_from(count).ok() != Some(hub.participants()) {
            return Err(invalid_state(format!(
                "cluster of {count} localities cannot share a hub for {}",
                hub.participants()
            )));
        }
        Ok(Arc::new(Locality {
            id,
            count,
            names: NameRegistry::default(),
            hub,
            collective_timeout,
            transport: RwLock::new(None),
            generations: DashMap::new(),
        }))
    }

    /// A stand-alone locality: id 0 of a cluster of one.
    pub fn single() -> Arc<Self> {
        Arc::new(Locality {
            id: 0,
            count: 1,
            names: NameRegistry::default(),
            hub: Arc::new(CollectiveHub::new(1)),
            collective_timeout: DEFAULT_COLLECTIVE_TIMEOUT,
            transport: RwLock::new(None),
            generations: DashMap::new(),
        })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    #[inline]
    pub fn hub(&self) -> &Arc<CollectiveHub> {
        &self.hub
    }

    #[inline]
    pub fn collective_timeout(&self) -> Duration {
        self.collective_timeout
    }

    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        *self.transport.write() = Some(transport);
    }

    /// Resolve a name to a node, locally or through the transport.
    pub fn resolve(&self, name: &PrimitiveName) -> Result<PrimitiveRef, EvalError> {
        if name.locality == self.id {
            return self
                .names
                .get(&name.compose())
                .ok_or_else(|| unresolved_name(&name.compose()));
        }
        if name.locality >= self.count {
            return Err(unresolved_name(&name.compose()));
        }
        match self.transport.read().as_ref() {
            Some(transport) => Ok(PrimitiveRef::new(RemotePrimitive::new(
                name.clone(),
                Arc::clone(transport),
            ))),
            None => Err(unresolved_name(&name.compose())),
        }
    }

    /// Resolve a composed name.
    pub fn resolve_str(&self, name: &str) -> Result<PrimitiveRef, EvalError> {
        let parsed = PrimitiveName::parse(name).map_err(|e| unresolved_name(&e.to_string()))?;
        self.resolve(&parsed)
    }

    /// The next generation of the collective keyed `key` on this locality.
    ///
    /// Localities running identical code draw identical sequences.
    pub fn next_generation(&self, key: &str) -> u64 {
        let mut entry = self.generations.entry(key.to_string()).or_insert(0);
        let generation = *entry;
        *entry += 1;
        generation
    }

    /// Exchange `value` with every locality; results are ordered by id.
    pub async fn all_to_all(&self, key: &str, value: Value) -> Result<Vec<Value>, DistributedSyncError> {
        let generation = self.next_generation(key);
        self.hub
            .all_to_all(key, generation, self.id, value, self.collective_timeout)
            .await
    }
}

#[cfg(test)]
mod tests;
