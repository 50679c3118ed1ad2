//! Filter expression language for ormstream.
//!
//! A small textual language for writing pushable predicates against a
//! configured table. Expressions compile to [`Predicate<Row>`] values, which
//! render to SQL through `ormstream_core::render_where` or evaluate in memory.
//!
//! # Syntax
//!
//! ```text
//! length >= 60 && rating != null
//! title startsWith "AC" || title contains 'DINO'
//! film_id in [1, 2, 3] and not (length between 60 and 120)
//! rating is not null
//! title not like "A_E%"
//! description isNotEmpty
//! ```
//!
//! Columns are looked up by database name or alias. `&&` binds tighter than
//! `||`; `and`, `or` and `not` are word forms of `&&`, `||` and `!`. Bounds of
//! `between` are inclusive. Comparing with `null` is only allowed through
//! `==`, `!=` and `is [not] null`.
//!
//! # Usage
//!
//! ```rust
//! use ormstream_core::{
//!     Column, Dbms, DbmsType, Project, ScalarType, Schema, Table, TableIdentifier,
//! };
//! use ormstream_lang::parse_filter;
//!
//! let project = Project::new("sakila").with_dbms(
//!     Dbms::new("db", DbmsType::MySql).with_schema(
//!         Schema::new("sakila").with_table(
//!             Table::new("film").with_column(Column::new("length", ScalarType::Int32)),
//!         ),
//!     ),
//! );
//! let film = TableIdentifier::new("db", "sakila", "film");
//!
//! let predicate = parse_filter(&project, &film, "length > 120").unwrap();
//! assert!(predicate.is_pushable());
//! ```

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use ast::{ComparisonOp, Condition, Literal, TextOp};
pub use compiler::FilterCompiler;
pub use error::{CompileError, CompileErrorKind, LangError, ParseError};
pub use span::{Location, Span, Spanned};

use ormstream_core::{Predicate, Project, Row, TableIdentifier};

/// Parse a filter expression into an AST.
///
/// # Example
///
/// ```rust
/// use ormstream_lang::parse;
///
/// let condition = parse("length > 120 || rating is null").unwrap();
/// assert_eq!(condition.to_string(), "(length > 120 || rating is null)");
/// ```
pub fn parse(source: &str) -> Result<Condition, ParseError> {
    parser::parse(source)
}

/// Compile a parsed condition against a table of `project`.
pub fn compile(
    project: &Project,
    table: &TableIdentifier,
    condition: &Condition,
) -> Result<Predicate<Row>, CompileError> {
    FilterCompiler::new(project, table)?.compile(condition)
}

/// Parse and compile a filter expression in one step.
pub fn parse_filter(
    project: &Project,
    table: &TableIdentifier,
    source: &str,
) -> Result<Predicate<Row>, LangError> {
    let condition = parse(source)?;
    let predicate = compile(project, table, &condition)?;
    Ok(predicate)
}

/// Tokenize a source string (for debugging/testing).
pub fn tokenize(source: &str) -> Result<Vec<lexer::SpannedToken>, ParseError> {
    lexer::tokenize(source)
}
