//! Driver errors.

use tessel_eval::CompileError;
use tessel_patterns::{EvalError, SignatureError};

/// Invalid session configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not valid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("a cluster needs at least one locality")]
    NoLocalities,

    #[error("locality {id} is outside a cluster of {count}")]
    LocalityOutOfRange { id: u32, count: u32 },

    #[error("worker thread count must be at least 1")]
    NoWorkerThreads,
}

/// Anything a session can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("catalogue error: {0}")]
    Catalogue(#[from] SignatureError),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// The evaluation error, if evaluation is what failed.
    pub fn as_eval(&self) -> Option<&EvalError> {
        match self {
            Error::Eval(err) => Some(err),
            _ => None,
        }
    }
}
