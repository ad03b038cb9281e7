//! Pattern signature parsing.
//!
//! Signatures describe the call forms a factory accepts:
//!
//! | Form | Example | Key | Arity |
//! |------|---------|-----|-------|
//! | fixed | `range(_1, _2)` | `range` | exactly 2 |
//! | variadic | `list(__1)` | `list` | 1 or more |
//! | nullary | `locality()` | `locality` | exactly 0 |
//! | infix | `_1 + _2` | `__add` | exactly 2 |
//! | prefix | `-_1` | `__minus` | exactly 1 |
//!
//! Placeholders are numbered from 1 in order. A variadic placeholder
//! (`__N`) must come last and consumes one or more remaining arguments.

use std::fmt;

use tessel_ir::{BinaryOp, UnaryOp};

/// Error produced by [`PatternSignature::parse`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("empty pattern signature")]
    Empty,
    #[error("invalid pattern name in `{signature}`")]
    InvalidName { signature: String },
    #[error("unbalanced parentheses in `{signature}`")]
    Unbalanced { signature: String },
    #[error("unexpected placeholder `{placeholder}` in `{signature}`")]
    BadPlaceholder {
        signature: String,
        placeholder: String,
    },
    #[error("variadic placeholder must be last in `{signature}`")]
    VariadicNotLast { signature: String },
    #[error("unknown operator `{operator}` in `{signature}`")]
    UnknownOperator { signature: String, operator: String },
}

/// Number of arguments a signature accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    #[inline]
    pub fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Exactly(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
        }
    }

    /// The smallest accepted argument count.
    #[inline]
    pub fn minimum(self) -> usize {
        match self {
            Arity::Exactly(n) | Arity::AtLeast(n) => n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

/// A parsed signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternSignature {
    name: String,
    arity: Arity,
    text: String,
}

impl PatternSignature {
    /// Registry key (`range`, or `__add` for `_1 + _2`).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// The signature as written.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parse(signature: &str) -> Result<Self, SignatureError> {
        let text = signature.trim();
        if text.is_empty() {
            return Err(SignatureError::Empty);
        }
        if let Some(open) = text.find('(') {
            return Self::parse_call(text, open);
        }
        if text.contains(')') {
            return Err(SignatureError::Unbalanced {
                signature: text.to_string(),
            });
        }
        Self::parse_operator(text)
    }

    fn parse_call(text: &str, open: usize) -> Result<Self, SignatureError> {
        let name = text[..open].trim();
        if !is_identifier(name) {
            return Err(SignatureError::InvalidName {
                signature: text.to_string(),
            });
        }
        let inner = text[open + 1..]
            .strip_suffix(')')
            .filter(|inner| !inner.contains(['(', ')']))
            .ok_or_else(|| SignatureError::Unbalanced {
                signature: text.to_string(),
            })?;

        let placeholders: Vec<&str> = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };

        let mut variadic = false;
        for (i, placeholder) in placeholders.iter().enumerate() {
            if variadic {
                return Err(SignatureError::VariadicNotLast {
                    signature: text.to_string(),
                });
            }
            let expected = (i + 1).to_string();
            if placeholder.strip_prefix("__") == Some(expected.as_str()) {
                variadic = true;
            } else if placeholder.strip_prefix('_') != Some(expected.as_str()) {
                return Err(SignatureError::BadPlaceholder {
                    signature: text.to_string(),
                    placeholder: (*placeholder).to_string(),
                });
            }
        }

        let arity = if variadic {
            Arity::AtLeast(placeholders.len())
        } else {
            Arity::Exactly(placeholders.len())
        };
        Ok(PatternSignature {
            name: name.to_string(),
            arity,
            text: text.to_string(),
        })
    }

    fn parse_operator(text: &str) -> Result<Self, SignatureError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            ["_1", op, "_2"] => {
                let op = BinaryOp::from_symbol(op).ok_or_else(|| {
                    SignatureError::UnknownOperator {
                        signature: text.to_string(),
                        operator: (*op).to_string(),
                    }
                })?;
                Ok(PatternSignature {
                    name: op.pattern_name().to_string(),
                    arity: Arity::Exactly(2),
                    text: text.to_string(),
                })
            }
            _ => {
                let compact: String = tokens.concat();
                let Some(op) = compact.strip_suffix("_1") else {
                    return Err(SignatureError::InvalidName {
                        signature: text.to_string(),
                    });
                };
                let op = UnaryOp::from_symbol(op).ok_or_else(|| {
                    SignatureError::UnknownOperator {
                        signature: text.to_string(),
                        operator: op.to_string(),
                    }
                })?;
                Ok(PatternSignature {
                    name: op.pattern_name().to_string(),
                    arity: Arity::Exactly(1),
                    text: text.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for PatternSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
