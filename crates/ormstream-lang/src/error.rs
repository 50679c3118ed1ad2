//! Error types for parsing and compilation.

use crate::span::Span;
use thiserror::Error;

/// Error during lexing or parsing.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Where the error occurred.
    pub span: Span,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Attach a hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Render the error with the offending source line and a caret.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut result = format!("error: {}\n", self.message);
        result.push_str(&source_context(source, self.span));
        if let Some(hint) = &self.hint {
            result.push_str(&format!("   = hint: {}\n", hint));
        }
        result
    }
}

/// Kinds of compilation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The table is not configured.
    UnknownTable,
    /// No enabled column has this name or alias.
    UnknownColumn,
    /// A literal does not fit the column type.
    TypeMismatch,
    /// A literal cannot be used with the operator.
    InvalidLiteral,
}

/// Error while resolving a parsed filter against a table.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// Where the error occurred.
    pub span: Span,
    /// Error kind for programmatic handling.
    pub kind: CompileErrorKind,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, span: Span, kind: CompileErrorKind) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
        }
    }

    /// Unknown table error.
    pub fn unknown_table(table: &str) -> Self {
        Self::new(
            format!("unknown table '{}'", table),
            Span::default(),
            CompileErrorKind::UnknownTable,
        )
    }

    /// Unknown column error.
    pub fn unknown_column(table: &str, column: &str, span: Span) -> Self {
        Self::new(
            format!("unknown column '{}' on table '{}'", column, table),
            span,
            CompileErrorKind::UnknownColumn,
        )
    }

    /// Type mismatch error.
    pub fn type_mismatch(column: &str, expected: &str, got: &str, span: Span) -> Self {
        Self::new(
            format!("type mismatch for '{}': expected {}, got {}", column, expected, got),
            span,
            CompileErrorKind::TypeMismatch,
        )
    }

    /// Invalid literal error.
    pub fn invalid_literal(message: impl Into<String>, span: Span) -> Self {
        Self::new(message, span, CompileErrorKind::InvalidLiteral)
    }

    /// Render the error with the offending source line and a caret.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut result = format!("error[{:?}]: {}\n", self.kind, self.message);
        result.push_str(&source_context(source, self.span));
        result
    }
}

/// Combined error type for the public API.
#[derive(Debug, Error)]
pub enum LangError {
    /// Parse error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// Compile error.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

impl LangError {
    /// Render the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        match self {
            LangError::Parse(e) => e.format_with_source(source),
            LangError::Compile(e) => e.format_with_source(source),
        }
    }

    /// Span of the error.
    pub fn span(&self) -> Span {
        match self {
            LangError::Parse(e) => e.span,
            LangError::Compile(e) => e.span,
        }
    }
}

fn source_context(source: &str, span: Span) -> String {
    let location = span.location(source);
    let (line, col) = (location.line, location.column);
    let mut result = format!("  --> {}\n", location);

    if let Some(source_line) = source.lines().nth(line - 1) {
        result.push_str(&format!("   |\n{:3}| {}\n   |", line, source_line));
        result.push_str(&" ".repeat(col));
        result.push('^');

        let width = source_line.chars().count().saturating_sub(col - 1);
        let span_len = span.text(source).chars().count().min(width);
        if span_len > 1 {
            result.push_str(&"~".repeat(span_len - 1));
        }
        result.push('\n');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_formatting() {
        let source = "age = 18";
        let err = ParseError::new("unexpected character '='", Span::new(4, 5))
            .with_hint("use '==' for equality");

        let formatted = err.format_with_source(source);
        assert!(formatted.contains("line 1:5"));
        assert!(formatted.contains("unexpected character '='"));
        assert!(formatted.contains("hint: use '==' for equality"));
    }

    #[test]
    fn test_compile_error_underlines_span() {
        let source = "rating == 5";
        let err = CompileError::unknown_column("film", "rating", Span::new(0, 6));

        let formatted = err.format_with_source(source);
        assert!(formatted.starts_with("error[UnknownColumn]: unknown column 'rating'"));
        assert!(formatted.contains("  1| rating == 5\n   | ^~~~~~\n"));
    }
}
