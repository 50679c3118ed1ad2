//! Lazy entity streams with SQL push-down.
//!
//! Streams record their stages in a [`Pipeline`]. Terminal operations hand
//! the pipeline to the terminator, which turns the pushable prefix into one
//! SELECT statement and replays the rest in memory.

mod action;
mod config;
mod entity_stream;
mod executor;
mod pipeline;
mod source;
mod terminator;

pub use action::{Action, EqFn, FlatMapFn, MapFn, PeekFn};
pub use config::StreamConfig;
pub use entity_stream::EntityStream;
pub use executor::{QueryExecutor, RecordingExecutor};
pub use pipeline::{Pipeline, PipelineParts};
pub use source::{Source, Supplier, TableSource};
pub use terminator::Explain;
