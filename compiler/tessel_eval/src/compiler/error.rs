//! Compile errors.

use tessel_ir::SourceTag;
use tessel_patterns::NameError;

/// Error produced while translating an expression tree.
///
/// Every variant carries the tag of the offending expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{tag}: unknown primitive `{name}`")]
    UnknownPrimitive { name: String, tag: SourceTag },

    #[error("{tag}: `{name}` does not accept {got} argument(s) (accepts {expected})")]
    ArityMismatch {
        name: String,
        /// Human-readable accepted counts, e.g. `2 or 3`, `1+`.
        expected: String,
        got: usize,
        tag: SourceTag,
    },

    #[error("{tag}: undefined identifier `{name}`")]
    UndefinedIdentifier { name: String, tag: SourceTag },

    #[error("{tag}: invalid `{form}`: {reason}")]
    InvalidDefine {
        form: &'static str,
        reason: String,
        tag: SourceTag,
    },

    #[error("{tag}: {source}")]
    Malformed {
        #[source]
        source: NameError,
        tag: SourceTag,
    },
}

impl CompileError {
    /// Source position of the offending expression.
    pub fn tag(&self) -> SourceTag {
        match self {
            CompileError::UnknownPrimitive { tag, .. }
            | CompileError::ArityMismatch { tag, .. }
            | CompileError::UndefinedIdentifier { tag, .. }
            | CompileError::InvalidDefine { tag, .. }
            | CompileError::Malformed { tag, .. } => *tag,
        }
    }
}

#[cold]
pub(super) fn arity_mismatch(
    name: &str,
    expected: impl Into<String>,
    got: usize,
    tag: SourceTag,
) -> CompileError {
    CompileError::ArityMismatch {
        name: name.to_string(),
        expected: expected.into(),
        got,
        tag,
    }
}

#[cold]
pub(super) fn invalid_define(
    form: &'static str,
    reason: impl Into<String>,
    tag: SourceTag,
) -> CompileError {
    CompileError::InvalidDefine {
        form,
        reason: reason.into(),
        tag,
    }
}
