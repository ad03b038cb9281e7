//! Error types for primitive evaluation.
//!
//! `EvalErrorKind` provides typed error categories so callers can match on
//! the failure instead of parsing messages. Factory functions (e.g.
//! `division_by_zero()`) are the public API: they populate both `kind` and
//! `message`.
//!
//! Collective failures have their own `thiserror` enum,
//! [`DistributedSyncError`], which is wrapped into an `EvalError` of kind
//! `DistributedSync` when it crosses the evaluation boundary.

use std::fmt;
use std::time::Duration;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Failure of an all-to-all collective.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DistributedSyncError {
    /// Not every locality contributed within the configured timeout.
    #[error(
        "collective `{key}` timed out after {timeout:?} ({arrived} of {expected} localities contributed)"
    )]
    Timeout {
        key: String,
        timeout: Duration,
        arrived: usize,
        expected: usize,
    },
    /// The collective was torn down before it completed.
    #[error("collective `{key}` lost a participant before completing")]
    ParticipantLost { key: String },
    /// A contribution could not be combined with the others.
    #[error("collective `{key}` received an inconsistent contribution: {reason}")]
    ContributionMismatch { key: String, reason: String },
}

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Calls
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
        /// `expected` is a lower bound rather than an exact count.
        at_least: bool,
    },
    NotCallable {
        type_name: String,
    },
    UndefinedArgument {
        index: usize,
        depth: usize,
    },

    // Types and shapes
    TypeMismatch {
        expected: String,
        got: String,
    },
    InvalidDimensionality {
        reason: String,
    },

    // Arithmetic
    DivisionByZero,
    Domain {
        operation: String,
    },

    // Access
    IndexOutOfBounds {
        index: i64,
    },
    UnresolvedName {
        name: String,
    },

    // Usage contract
    InvalidState {
        reason: String,
    },

    // Distribution
    DistributedSync(DistributedSyncError),

    /// Catch-all for errors without a structured kind.
    Custom {
        message: String,
    },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArityMismatch {
                name,
                expected,
                got,
                at_least,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                let bound = if *at_least { "at least " } else { "" };
                write!(f, "{name} expects {bound}{expected} {arg_word}, got {got}")
            }
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),
            Self::UndefinedArgument { index, depth } => {
                write!(f, "argument {index} at depth {depth} is not available")
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::InvalidDimensionality { reason } => {
                write!(f, "invalid dimensionality: {reason}")
            }
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Domain { operation } => write!(f, "domain error in {operation}"),
            Self::IndexOutOfBounds { index } => write!(f, "index {index} out of bounds"),
            Self::UnresolvedName { name } => write!(f, "cannot resolve primitive name {name}"),
            Self::InvalidState { reason } => write!(f, "invalid state: {reason}"),
            Self::DistributedSync(err) => write!(f, "{err}"),
            Self::Custom { message } => write!(f, "{message}"),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable error message; equals `kind.to_string()` for
    /// factory-created errors.
    pub message: String,
    /// Name of the innermost primitive that reported the failure.
    pub node: Option<String>,
}

impl EvalError {
    /// Create an error with just a message (`Custom` kind).
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        EvalError {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
            node: None,
        }
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError {
            kind,
            message,
            node: None,
        }
    }

    /// Attach the failing primitive's name.
    ///
    /// The first attached name wins, so an error keeps pointing at the node
    /// closest to the failure while it propagates through parents.
    #[must_use]
    pub fn with_node(mut self, node: impl fmt::Display) -> Self {
        if self.node.is_none() {
            self.node = Some(node.to_string());
        }
        self
    }

    /// The collective failure, if this error wraps one.
    pub fn as_distributed_sync(&self) -> Option<&DistributedSyncError> {
        match &self.kind {
            EvalErrorKind::DistributedSync(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "{} (at {node})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for EvalError {}

impl From<DistributedSyncError> for EvalError {
    fn from(err: DistributedSyncError) -> Self {
        EvalError::from_kind(EvalErrorKind::DistributedSync(err))
    }
}

// Error factories

#[cold]
pub fn wrong_arg_count(name: &str, expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
        at_least: false,
    })
}

#[cold]
pub fn too_few_args(name: &str, minimum: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected: minimum,
        got,
        at_least: true,
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn undefined_argument(index: usize, depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedArgument { index, depth })
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn invalid_dimensionality(reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidDimensionality {
        reason: reason.into(),
    })
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn domain_error(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Domain {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index })
}

#[cold]
pub fn unresolved_name(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnresolvedName {
        name: name.to_string(),
    })
}

#[cold]
pub fn invalid_state(reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidState {
        reason: reason.into(),
    })
}
