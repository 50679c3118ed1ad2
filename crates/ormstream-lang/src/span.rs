//! Byte spans into filter source text.

use std::fmt;
use std::ops::Range;

/// Half-open byte range `start..end` of a token or condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`, e.g. the end of input.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Smallest span covering both spans.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Covered source text; empty if the span does not fit `source`.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }

    /// Line and column where the span starts.
    pub fn location(&self, source: &str) -> Location {
        let before = source.get(..self.start).unwrap_or(source);
        let current_line = before.rsplit('\n').next().unwrap_or("");
        Location {
            line: before.matches('\n').count() + 1,
            column: current_line.chars().count() + 1,
        }
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// 1-based position in the source, counting columns in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{}", self.line, self.column)
    }
}

/// A parsed value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}
