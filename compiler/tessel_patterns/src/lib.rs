//! Tessel Patterns - value model, primitive contract and pattern registry.
//!
//! This crate defines everything the compiler and the primitives share:
//!
//! - `Value`: the closed runtime value set, with `NdArray` containers and
//!   out-of-band `Annotations`
//! - `Primitive` / `PrimitiveRef`: the asynchronous evaluation contract
//! - `EvalContext` / `EvalMode` / `Activation`: per-evaluation state
//! - `PrimitiveName`: hierarchical node names and their strict parser
//! - `PatternRegistry`: signature strings mapped to primitive factories
//! - `Locality` / `CollectiveHub` / `Transport`: addressing and collectives
//!   across cooperating localities
//!
//! Concrete primitives (control flow and the core catalogue) live in
//! `tessel_eval`.

pub mod annotation;
pub mod context;
pub mod distributed;
pub mod errors;
pub mod naming;
pub mod primitive;
pub mod registry;
pub mod signature;
mod value;

#[cfg(test)]
mod test_helpers;

pub use annotation::{Annotation, Annotations, Tile, TileSpan};
pub use context::{Activation, EvalContext, EvalMode, Frame, SlotId};
pub use distributed::{
    CollectiveHub, InProcessTransport, Locality, NameRegistry, RemotePrimitive, Transport,
    DEFAULT_COLLECTIVE_TIMEOUT,
};
pub use errors::{DistributedSyncError, EvalError, EvalErrorKind, EvalResult};
pub use naming::{NameError, PrimitiveName};
pub use primitive::{
    evaluate_operand, evaluate_operands, evaluate_operands_sequential, EvalFuture,
    ExpressionTopology, Primitive, PrimitiveRef,
};
pub use registry::{Lookup, PatternEntry, PatternRegistry, PrimitiveFactory};
pub use signature::{Arity, PatternSignature, SignatureError};
pub use value::{
    DictValue, Element, Heap, ListIter, ListRepr, ListValue, NdArray, Shape, Value, MAX_DIMS,
};
