//! Pattern registry: call signatures mapped to primitive factories.
//!
//! The registry is an explicit object. The compiler borrows it for the
//! duration of a compilation; hosts build one at startup and add their own
//! catalogues through [`PatternRegistry::register`].

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::naming::PrimitiveName;
use crate::primitive::PrimitiveRef;
use crate::signature::{Arity, PatternSignature, SignatureError};
use crate::value::Value;

/// Builds a primitive from its compiled operands and assigned name.
pub type PrimitiveFactory = fn(Vec<Value>, PrimitiveName) -> PrimitiveRef;

/// One registered call form.
#[derive(Clone, Debug)]
pub struct PatternEntry {
    pub signature: PatternSignature,
    pub factory: PrimitiveFactory,
    pub help: &'static str,
}

/// Outcome of [`PatternRegistry::lookup`].
#[derive(Debug)]
pub enum Lookup<'a> {
    Found(&'a PatternEntry),
    /// The name is known but no signature accepts the argument count.
    ArityMismatch { accepted: Vec<Arity> },
    Unknown,
}

/// Registry mapping pattern names to their entries.
///
/// Several entries may share a name (e.g. `range` with one, two or three
/// arguments); lookup picks the first whose arity accepts the call.
#[derive(Clone, Debug, Default)]
pub struct PatternRegistry {
    patterns: FxHashMap<String, Vec<PatternEntry>>,
}

impl PatternRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `signature`.
    pub fn register(
        &mut self,
        signature: &str,
        factory: PrimitiveFactory,
        help: &'static str,
    ) -> Result<(), SignatureError> {
        let signature = PatternSignature::parse(signature)?;
        debug!(
            name = signature.name(),
            arity = %signature.arity(),
            "registered pattern"
        );
        self.patterns
            .entry(signature.name().to_string())
            .or_default()
            .push(PatternEntry {
                signature,
                factory,
                help,
            });
        Ok(())
    }

    /// Find the entry for a call of `name` with `argc` arguments.
    pub fn lookup(&self, name: &str, argc: usize) -> Lookup<'_> {
        let Some(entries) = self.patterns.get(name) else {
            return Lookup::Unknown;
        };
        match entries.iter().find(|e| e.signature.arity().accepts(argc)) {
            Some(entry) => Lookup::Found(entry),
            None => Lookup::ArityMismatch {
                accepted: entries.iter().map(|e| e.signature.arity()).collect(),
            },
        }
    }

    /// Whether any signature is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    /// Signature and help text of every entry registered under `name`.
    pub fn help(&self, name: &str) -> Vec<(&str, &'static str)> {
        self.patterns
            .get(name)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| (e.signature.text(), e.help))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.patterns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.patterns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
