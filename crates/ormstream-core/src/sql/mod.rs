//! SQL generation: dialects, WHERE rendering and SELECT assembly.

mod dialect;
mod render;
mod select;

pub use dialect::DbmsType;
pub use render::{render_where, RenderResult};
pub use select::{SelectBuilder, SqlQuery};
