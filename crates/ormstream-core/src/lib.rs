//! ormstream core - typed field predicates, SQL push-down and entity streams.
//!
//! Entities are read through [`Field`]s bound to columns of a configured
//! [`Project`]. Predicates and comparators built from fields stay
//! inspectable, so a stream over a table turns its leading filters, sort
//! and pagination into one parameterized SELECT and replays the rest in
//! memory.

pub mod config;
pub mod error;
pub mod field;
pub mod lifecycle;
pub mod manager;
pub mod predicate;
pub mod row;
pub mod sql;
pub mod stream;
pub mod value;

pub use config::{
    Column, ColumnIdentifier, Dbms, Project, ScalarType, Schema, Table, TableIdentifier,
};
pub use error::{Error, Result};
pub use field::{ComparableField, Comparator, Field, SortKey, SortOrder, StringField};
pub use lifecycle::{Application, ApplicationBuilder, ComponentState, Lifecycle, ProjectComponent};
pub use manager::{Manager, ManagerBuilder};
pub use predicate::{FieldPredicate, Inclusion, Predicate, PredicateType};
pub use row::{column_field, Row};
pub use sql::{render_where, DbmsType, RenderResult, SelectBuilder, SqlQuery};
pub use stream::{
    Action, EntityStream, Explain, Pipeline, QueryExecutor, RecordingExecutor, Source,
    StreamConfig, TableSource,
};
pub use value::Value;
