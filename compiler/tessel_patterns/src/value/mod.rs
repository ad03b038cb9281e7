//! Runtime values.
//!
//! `Value` is a closed sum type shared by every layer: the compiler wraps
//! literals in it, primitives exchange it, and collectives ship it between
//! localities. Heap payloads go through [`Heap`] so they are cheap to clone.
//!
//! # Equality
//!
//! Equality and hashing are structural over the closed variant set:
//! - floats compare by bit pattern, keeping `Eq` and `Hash` lawful
//! - a lazy range equals the materialized list with the same elements
//! - dictionaries hash order-independently
//! - primitives compare by node identity
//! - annotations are ignored

mod array;
mod dict;
mod heap;
mod list;

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashMap;

pub use array::{Element, NdArray, Shape, MAX_DIMS};
pub use dict::DictValue;
pub use heap::Heap;
pub use list::{ListIter, ListRepr, ListValue};

use crate::annotation::Annotations;
use crate::errors::{type_mismatch, EvalError};
use crate::primitive::PrimitiveRef;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// `valid: true` is the language `nil`. `valid: false` is the void
    /// result of statements such as `define`, or of `if` without an else.
    Nil { valid: bool },
    Bool(NdArray<bool>),
    Int64(NdArray<i64>),
    Float64(NdArray<f64>),
    Str(Heap<String>),
    /// A live handle to a primitive; callable values are closures and
    /// partial applications.
    Primitive(PrimitiveRef),
    List(ListValue),
    Dict(DictValue),
}

impl Value {
    // Factory methods

    #[inline]
    pub fn nil() -> Self {
        Value::Nil { valid: true }
    }

    /// The void result.
    #[inline]
    pub fn void() -> Self {
        Value::Nil { valid: false }
    }

    #[inline]
    pub fn bool(value: bool) -> Self {
        Value::Bool(NdArray::scalar(value))
    }

    #[inline]
    pub fn int(value: i64) -> Self {
        Value::Int64(NdArray::scalar(value))
    }

    #[inline]
    pub fn float(value: f64) -> Self {
        Value::Float64(NdArray::scalar(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::Str(Heap::new(value.into()))
    }

    #[inline]
    pub fn primitive(node: PrimitiveRef) -> Self {
        Value::Primitive(node)
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(ListValue::from_vec(items))
    }

    /// A lazy integer range.
    pub fn range(start: i64, stop: i64, step: i64) -> Result<Self, EvalError> {
        ListValue::range(start, stop, step).map(Value::List)
    }

    pub fn dict(map: FxHashMap<Value, Value>) -> Self {
        Value::Dict(DictValue::new(map))
    }

    pub fn int_vector(values: Vec<i64>) -> Self {
        Value::Int64(NdArray::vector(values))
    }

    pub fn float_vector(values: Vec<f64>) -> Self {
        Value::Float64(NdArray::vector(values))
    }

    pub fn bool_vector(values: Vec<bool>) -> Self {
        Value::Bool(NdArray::vector(values))
    }

    // Queries

    /// Whether this is the void result.
    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Nil { valid: false })
    }

    /// Whether this is the language `nil`.
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil { valid: true })
    }

    /// Truthiness used by `if`, `while`, `filter` and the logical operators.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil { .. } => false,
            Value::Bool(a) => a.any_truthy(),
            Value::Int64(a) => a.any_truthy(),
            Value::Float64(a) => a.any_truthy(),
            Value::Str(s) => !s.is_empty(),
            Value::Primitive(_) => true,
            Value::List(l) => !l.is_empty(),
            Value::Dict(d) => !d.is_empty(),
        }
    }

    /// Type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil { valid: true } => "nil",
            Value::Nil { valid: false } => "void",
            Value::Bool(a) if a.is_scalar() => "bool",
            Value::Bool(_) => "bool array",
            Value::Int64(a) if a.is_scalar() => "int",
            Value::Int64(_) => "int array",
            Value::Float64(a) if a.is_scalar() => "float",
            Value::Float64(_) => "float array",
            Value::Str(_) => "string",
            Value::Primitive(_) => "primitive",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    /// Scalar integer, also accepting scalar booleans.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int64(a) => a.scalar_value(),
            Value::Bool(a) => a.scalar_value().map(i64::from),
            _ => None,
        }
    }

    /// Scalar float, promoting integers.
    #[expect(clippy::cast_precision_loss, reason = "int to float promotion")]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float64(a) => a.scalar_value(),
            Value::Int64(a) => a.scalar_value().map(|i| i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveRef> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListValue> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictValue> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// The primitive, if this value can be called.
    pub fn as_callable(&self) -> Option<&PrimitiveRef> {
        self.as_primitive().filter(|p| p.callable_arity().is_some())
    }

    /// Elements of an iterable value: lists and 1-d arrays.
    pub fn to_items(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(l) => Ok(l.to_vec()),
            Value::Int64(a) if a.ndim() == 1 => Ok(a.data().iter().map(|&v| Value::int(v)).collect()),
            Value::Float64(a) if a.ndim() == 1 => {
                Ok(a.data().iter().map(|&v| Value::float(v)).collect())
            }
            Value::Bool(a) if a.ndim() == 1 => {
                Ok(a.data().iter().map(|&v| Value::bool(v)).collect())
            }
            other => Err(type_mismatch("list or vector", other.type_name())),
        }
    }

    // Annotations

    /// Annotations carried by this value; `None` for variants that cannot
    /// carry any.
    pub fn annotations(&self) -> Option<&Annotations> {
        match self {
            Value::Bool(a) => Some(a.annotations()),
            Value::Int64(a) => Some(a.annotations()),
            Value::Float64(a) => Some(a.annotations()),
            Value::List(l) => Some(l.annotations()),
            Value::Dict(d) => Some(d.annotations()),
            Value::Nil { .. } | Value::Str(_) | Value::Primitive(_) => None,
        }
    }

    /// Replace the annotations. Fails for variants that cannot carry any.
    pub fn with_annotations(self, annotations: Annotations) -> Result<Value, EvalError> {
        match self {
            Value::Bool(a) => Ok(Value::Bool(a.with_annotations(annotations))),
            Value::Int64(a) => Ok(Value::Int64(a.with_annotations(annotations))),
            Value::Float64(a) => Ok(Value::Float64(a.with_annotations(annotations))),
            Value::List(l) => Ok(Value::List(l.with_annotations(annotations))),
            Value::Dict(d) => Ok(Value::Dict(d.with_annotations(annotations))),
            other => Err(type_mismatch(
                "array, list or dict (annotation target)",
                other.type_name(),
            )),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil { valid: a }, Value::Nil { valid: b }) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil { valid } => valid.hash(state),
            Value::Bool(a) => a.hash(state),
            Value::Int64(a) => a.hash(state),
            Value::Float64(a) => a.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Primitive(p) => p.hash(state),
            Value::List(l) => l.hash(state),
            Value::Dict(d) => d.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil { valid: true } => write!(f, "Nil"),
            Value::Nil { valid: false } => write!(f, "Void"),
            Value::Bool(a) => write!(f, "Bool({a})"),
            Value::Int64(a) => write!(f, "Int64({a})"),
            Value::Float64(a) => write!(f, "Float64({a})"),
            Value::Str(s) => write!(f, "Str({:?})", s.as_str()),
            Value::Primitive(p) => write!(f, "Primitive({p:?})"),
            Value::List(l) => write!(f, "List({l:?})"),
            Value::Dict(d) => write!(f, "Dict({d:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil { valid: true } => write!(f, "nil"),
            Value::Nil { valid: false } => write!(f, "<void>"),
            Value::Bool(a) => write!(f, "{a}"),
            Value::Int64(a) => write!(f, "{a}"),
            Value::Float64(a) => write!(f, "{a}"),
            Value::Str(s) => write!(f, "{}", s.as_str()),
            Value::Primitive(p) => write!(f, "<{}>", p.name()),
            Value::List(l) => write!(f, "{l}"),
            Value::Dict(d) => write!(f, "{d}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}
