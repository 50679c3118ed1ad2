//! Configuration document model.
//!
//! The document describes dbms instances, their schemas, tables and columns.
//! It is the read-only metadata collaborator that resolves field identifiers
//! to column names and types.

mod column;
mod identifier;
mod project;
mod table;
mod types;

pub use column::Column;
pub use identifier::{ColumnIdentifier, TableIdentifier};
pub use project::{Dbms, Project, Schema};
pub use table::Table;
pub use types::ScalarType;
