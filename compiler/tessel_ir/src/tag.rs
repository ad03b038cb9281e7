//! Source position tags.

use std::fmt;

/// Source position of an expression.
///
/// Tags end up in primitive names (`tag1`/`tag2`) and in compile errors.
/// They are purely diagnostic; nothing in evaluation depends on them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceTag {
    /// Line (or block position) of the originating expression, `-1` if unknown.
    pub line: i64,
    /// Column, when the producer tracked one.
    pub column: Option<i64>,
}

impl SourceTag {
    /// Tag for generated expressions with no source position.
    pub const UNKNOWN: SourceTag = SourceTag {
        line: -1,
        column: None,
    };

    /// Create a tag with both line and column.
    #[inline]
    pub const fn new(line: i64, column: i64) -> Self {
        SourceTag {
            line,
            column: Some(column),
        }
    }

    /// Create a tag carrying only a line (or block position).
    #[inline]
    pub const fn line(line: i64) -> Self {
        SourceTag { line, column: None }
    }

    /// Whether this tag refers to a real source position.
    #[inline]
    pub fn is_known(self) -> bool {
        self.line >= 0
    }
}

impl Default for SourceTag {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            return write!(f, "<unknown>");
        }
        match self.column {
            Some(column) => write!(f, "{}:{column}", self.line),
            None => write!(f, "{}", self.line),
        }
    }
}

#[cfg(test)]
mod tests;
