//! ormstream Command-Line Client
//!
//! Loads a project document and prints the SQL that streams over its
//! tables would push down, without connecting to a database.

mod commands;
mod formatter;

use clap::{Parser, Subcommand};
use formatter::OutputFormat;
use ormstream_core::DbmsType;
use std::path::PathBuf;

/// ormstream Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "ormstream")]
#[command(version, about = "Render push-down SQL for configured tables")]
pub struct Args {
    /// Project document (JSON)
    #[arg(short, long, default_value = "ormstream.json")]
    pub config: PathBuf,

    /// Override the dialect of the table's dbms (generic, mysql, postgresql, sqlite)
    #[arg(short, long)]
    pub dialect: Option<DbmsType>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List configured tables
    Tables,

    /// List the columns of a table
    Describe {
        /// Table name: `table`, `schema.table` or `dbms.schema.table`
        table: String,
    },

    /// Render filter expressions as a WHERE clause
    Render {
        table: String,

        /// Filter expression; repeated filters are AND-ed
        #[arg(short, long = "filter", required = true)]
        filters: Vec<String>,
    },

    /// Print the statement a stream over the table pushes down
    Select {
        table: String,

        /// Filter expression; repeated filters are AND-ed
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Sort column, `column` or `column.desc`; repeat for tie-breakers
        #[arg(short, long = "order-by")]
        order_by: Vec<String>,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<u64>,

        /// Number of rows to skip
        #[arg(long)]
        offset: Option<u64>,

        /// Count matching rows instead of selecting them
        #[arg(long)]
        count: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ormstream_cli=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    match commands::run(&args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
