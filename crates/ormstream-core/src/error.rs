//! Core error types.

use crate::config::{ColumnIdentifier, ScalarType};
use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A predicate that cannot be expressed in SQL reached the renderer.
    #[error("predicate #{index} is not pushable: {reason}")]
    UnpushablePredicate {
        /// Position of the offending predicate in the rendered list.
        index: usize,
        /// Description of the offending node.
        reason: String,
    },

    /// No column is configured for the identifier.
    #[error("unknown column {0}")]
    UnknownColumn(ColumnIdentifier),

    /// No table is configured for the identifier.
    #[error("unknown table {0}")]
    UnknownTable(String),

    /// An operand cannot be converted to the column's type.
    #[error("type mismatch for {column}: expected {expected:?}, found {found}")]
    TypeMismatch {
        /// Column the operand is compared against.
        column: ColumnIdentifier,
        /// Configured column type.
        expected: ScalarType,
        /// Debug form of the offending operand.
        found: String,
    },

    /// Invalid operand supplied to a predicate builder.
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    /// The pipeline was mutated after a terminal operation consumed it.
    #[error("pipeline already consumed by a terminal operation")]
    PipelineConsumed,

    /// Index outside the pipeline bounds.
    #[error("pipeline index {index} out of bounds (len {len})")]
    PipelineIndex {
        /// Requested position.
        index: usize,
        /// Current pipeline length.
        len: usize,
    },

    /// Invalid configuration document.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration document could not be parsed.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration document could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by a query executor.
    #[error("executor error: {0}")]
    Executor(String),

    /// Component lifecycle error.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Component dependencies form a cycle.
    #[error("dependency cycle between components: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),
}

/// Core result alias.
pub type Result<T> = std::result::Result<T, Error>;
