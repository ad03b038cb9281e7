//! Tessel IR - the expression tree handed to the Tessel compiler.
//!
//! The textual grammar lives outside this workspace. Whatever parser a host
//! uses produces [`Expr`] trees; the compiler only ever reads them.
//!
//! Infix and prefix operators are kept as [`BinaryOp`] / [`UnaryOp`] nodes
//! rather than being desugared here. Each operator knows its *pattern name*
//! (`__add`, `__lt`, ...), which is the key the pattern registry uses.

mod expr;
mod tag;

pub use expr::{BinaryOp, Call, Expr, ExprKind, Literal, UnaryOp};
pub use tag::SourceTag;
