//! Tessel Eval - compiler, environments and execution-tree primitives.
//!
//! This crate turns an expression tree into an executable tree of
//! primitives:
//!
//! - `Environment` / `SharedGlobals`: compile-time name resolution
//! - `Compiler`: special forms plus registry-driven generic calls
//! - `primitives`: blocks, conditionals, loops, variables, lambdas, calls
//! - `catalogue`: the core operators and list, annotation and locality
//!   primitives, registered through the public pattern interface
//! - `CompiledFunction`: a compiled tree with its entry point

pub mod catalogue;
mod compiled;
pub mod compiler;
pub mod environment;
pub mod primitives;
mod stack;

pub use catalogue::{core_registry, register_core_catalogue, Builtin, BuiltinPrimitive};
pub use compiled::CompiledFunction;
pub use compiler::{CompileError, Compiler};
pub use environment::{Binding, Environment, ScopeKind, SharedGlobals};
pub use stack::ensure_sufficient_stack;

#[cfg(test)]
mod test_helpers;
