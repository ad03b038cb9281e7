//! Expression tree nodes.
//!
//! Trees are owned (`Box`/`Vec`) and immutable once built. The builder
//! functions on [`Expr`] exist so hosts without a parser (and tests) can
//! assemble trees directly:
//!
//! ```text
//! // define(x, 1 + 2)
//! Expr::call("define", vec![Expr::ident("x"), Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2))])
//! ```

use crate::SourceTag;

/// Binary operators.
///
/// The compiler never special-cases these: each one is looked up in the
/// pattern registry under its [`pattern_name`](BinaryOp::pattern_name).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    /// All binary operators, in declaration order.
    pub const ALL: [BinaryOp; 13] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Lt,
        Self::LtEq,
        Self::Gt,
        Self::GtEq,
        Self::Eq,
        Self::NotEq,
        Self::And,
        Self::Or,
    ];

    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Registry key for this operator (`_1 + _2` registers as `__add`).
    pub const fn pattern_name(self) -> &'static str {
        match self {
            Self::Add => "__add",
            Self::Sub => "__sub",
            Self::Mul => "__mul",
            Self::Div => "__div",
            Self::Mod => "__mod",
            Self::Lt => "__lt",
            Self::LtEq => "__le",
            Self::Gt => "__gt",
            Self::GtEq => "__ge",
            Self::Eq => "__eq",
            Self::NotEq => "__ne",
            Self::And => "__and",
            Self::Or => "__or",
        }
    }

    /// Parse a source-level symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_symbol() == symbol)
    }
}

/// Unary (prefix) operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Logical not, `!x`.
    Not,
}

impl UnaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }

    /// Registry key for this operator.
    pub const fn pattern_name(self) -> &'static str {
        match self {
            Self::Neg => "__minus",
            Self::Not => "__not",
        }
    }

    /// Parse a source-level symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(Self::Neg),
            "!" => Some(Self::Not),
            _ => None,
        }
    }
}

/// Literal values.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// A call form: `name{attribute}(args...)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub name: String,
    /// Optional attribute tag, e.g. `constant` in `define{constant}(x, 1)`.
    pub attribute: Option<String>,
    pub args: Vec<Expr>,
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call(Call),
    /// List literal, `[a, b, c]`.
    List(Vec<Expr>),
}

/// An expression node with its source tag.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub tag: SourceTag,
}

impl Expr {
    /// Create an expression with an unknown source tag.
    #[inline]
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            tag: SourceTag::UNKNOWN,
        }
    }

    /// Attach a source position.
    #[must_use]
    pub fn at(mut self, line: i64, column: i64) -> Self {
        self.tag = SourceTag::new(line, column);
        self
    }

    /// Attach a source tag.
    #[must_use]
    pub fn with_tag(mut self, tag: SourceTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn nil() -> Self {
        Self::new(ExprKind::Literal(Literal::Nil))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ExprKind::Literal(Literal::Float(value)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Literal(Literal::Str(value.into())))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()))
    }

    pub fn list(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::List(items))
    }

    /// Create a call form without an attribute.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call(Call {
            name: name.into(),
            attribute: None,
            args,
        }))
    }

    /// Create a call form carrying an attribute tag.
    pub fn call_with_attribute(
        name: impl Into<String>,
        attribute: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self::new(ExprKind::Call(Call {
            name: name.into(),
            attribute: Some(attribute.into()),
            args,
        }))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// The identifier name, if this is an identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// The call form, if this is a call.
    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            ExprKind::Literal(lit) => format!("literal {lit:?}"),
            ExprKind::Ident(name) => format!("identifier `{name}`"),
            ExprKind::Unary { op, .. } => format!("unary `{}`", op.as_symbol()),
            ExprKind::Binary { op, .. } => format!("binary `{}`", op.as_symbol()),
            ExprKind::Call(call) => format!("call `{}`", call.name),
            ExprKind::List(items) => format!("list of {} items", items.len()),
        }
    }
}
