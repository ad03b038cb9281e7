//! Compile-time environments.
//!
//! The compiler resolves every identifier while it builds the tree, so the
//! evaluator never looks names up. An [`Environment`] is the persistent
//! global table plus a stack of local scopes. Each scope records the
//! *function level* it belongs to: `lambda` opens a new level, `block` does
//! not. Access nodes store the difference between the reference's level and
//! the binding's level, which is how many activations to walk at run time.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use tessel_patterns::Primitive;

use crate::primitives::Variable;

/// What an identifier resolves to.
#[derive(Clone)]
pub enum Binding {
    /// Positional parameter of the function at `level`.
    Argument { index: usize, level: usize },
    /// A variable (or function) defined at `level`.
    Variable {
        variable: Arc<Variable>,
        level: usize,
    },
}

impl Binding {
    /// Function level the binding was made at.
    #[inline]
    pub fn level(&self) -> usize {
        match self {
            Binding::Argument { level, .. } | Binding::Variable { level, .. } => *level,
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Argument { index, level } => f
                .debug_struct("Argument")
                .field("index", index)
                .field("level", level)
                .finish(),
            Binding::Variable { variable, level } => f
                .debug_struct("Variable")
                .field("name", &variable.name().to_string())
                .field("level", level)
                .finish(),
        }
    }
}

/// The global table shared by every compilation of a session.
///
/// Writes are serialized by the lock; readers see a consistent snapshot.
#[derive(Clone, Default)]
pub struct SharedGlobals(Arc<RwLock<FxHashMap<String, Arc<Variable>>>>);

impl SharedGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Variable>> {
        self.0.read().get(name).cloned()
    }

    /// Bind `name`, returning the variable it replaces.
    ///
    /// Nodes compiled against the old variable keep referring to it.
    pub fn insert(&self, name: &str, variable: Arc<Variable>) -> Option<Arc<Variable>> {
        self.0.write().insert(name.to_string(), variable)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Variable>> {
        self.0.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains_key(name)
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl std::fmt::Debug for SharedGlobals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Kind of a local scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// `block`: shadows names, same function level.
    Block,
    /// `lambda`: parameters live here, one function level deeper.
    Function,
}

struct Scope {
    kind: ScopeKind,
    level: usize,
    bindings: FxHashMap<String, Binding>,
}

/// Global table plus the stack of local scopes being compiled.
pub struct Environment {
    globals: SharedGlobals,
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new(globals: SharedGlobals) -> Self {
        Environment {
            globals,
            scopes: Vec::new(),
        }
    }

    #[inline]
    pub fn globals(&self) -> &SharedGlobals {
        &self.globals
    }

    /// Function level of the innermost scope; 0 at the top level.
    #[inline]
    pub fn level(&self) -> usize {
        self.scopes.last().map_or(0, |s| s.level)
    }

    /// Whether definitions go to the global table.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Kind of the innermost local scope.
    pub fn scope_kind(&self) -> Option<ScopeKind> {
        self.scopes.last().map(|s| s.kind)
    }

    pub fn push_scope(&mut self, kind: ScopeKind) {
        let level = match kind {
            ScopeKind::Block => self.level(),
            ScopeKind::Function => self.level() + 1,
        };
        self.scopes.push(Scope {
            kind,
            level,
            bindings: FxHashMap::default(),
        });
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Bind a parameter of the innermost function scope.
    pub fn bind_argument(&mut self, name: &str, index: usize) {
        let level = self.level();
        if let Some(scope) = self.scopes.last_mut() {
            scope
                .bindings
                .insert(name.to_string(), Binding::Argument { index, level });
        }
    }

    /// Bind a variable in the innermost scope, or globally at the top level.
    ///
    /// Returns the binding it shadows in that same scope, for [`restore`].
    ///
    /// [`restore`]: Environment::restore
    pub fn bind_variable(&mut self, name: &str, variable: Arc<Variable>) -> Option<Binding> {
        let level = self.level();
        match self.scopes.last_mut() {
            Some(scope) => scope
                .bindings
                .insert(name.to_string(), Binding::Variable { variable, level }),
            None => self
                .globals
                .insert(name, variable)
                .map(|variable| Binding::Variable { variable, level: 0 }),
        }
    }

    /// Undo a [`bind_variable`] whose definition failed to compile.
    ///
    /// [`bind_variable`]: Environment::bind_variable
    pub fn restore(&mut self, name: &str, previous: Option<Binding>) {
        match self.scopes.last_mut() {
            Some(scope) => match previous {
                Some(binding) => {
                    scope.bindings.insert(name.to_string(), binding);
                }
                None => {
                    scope.bindings.remove(name);
                }
            },
            None => match previous {
                Some(Binding::Variable { variable, .. }) => {
                    self.globals.insert(name, variable);
                }
                _ => {
                    self.globals.remove(name);
                }
            },
        }
    }

    /// Resolve `name`, innermost scope first, then the global table.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name).cloned())
            .or_else(|| {
                self.globals
                    .get(name)
                    .map(|variable| Binding::Variable { variable, level: 0 })
            })
    }

    /// Number of activations between the current scope and `binding`.
    #[inline]
    pub fn depth_of(&self, binding: &Binding) -> usize {
        self.level().saturating_sub(binding.level())
    }
}

#[cfg(test)]
mod tests;
