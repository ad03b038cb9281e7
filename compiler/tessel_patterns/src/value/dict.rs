//! Dictionaries keyed by structurally compared values.

use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

use rustc_hash::{FxBuildHasher, FxHashMap};

use super::{Heap, Value};
use crate::annotation::Annotations;

/// A map from `Value` to `Value`.
///
/// Hashing is order-independent: the per-entry hashes are combined with a
/// commutative sum.
#[derive(Clone)]
pub struct DictValue {
    map: Heap<FxHashMap<Value, Value>>,
    annotations: Annotations,
}

impl DictValue {
    pub fn new(map: FxHashMap<Value, Value>) -> Self {
        DictValue {
            map: Heap::new(map),
            annotations: Annotations::default(),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::new(pairs.into_iter().collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.map.iter()
    }

    #[inline]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }
}

impl PartialEq for DictValue {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl Eq for DictValue {}

impl Hash for DictValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self.map.iter().fold(0u64, |acc, entry| {
            acc.wrapping_add(FxBuildHasher.hash_one(entry))
        });
        self.map.len().hash(state);
        combined.hash(state);
    }
}

impl fmt::Debug for DictValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

impl fmt::Display for DictValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<String> = self
            .map
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        entries.sort();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
