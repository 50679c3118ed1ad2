//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use ormstream_core::{Column, Explain, SqlQuery, TableIdentifier, Value};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format the configured tables with their column counts.
    fn format_tables(&self, tables: &[(TableIdentifier, usize)]) -> String;

    /// Format the columns of one table.
    fn format_columns(&self, table: &TableIdentifier, columns: &[Column]) -> String;

    /// Format a rendered statement or WHERE fragment.
    fn format_query(&self, query: &SqlQuery) -> String;

    /// Format a push-down plan.
    fn format_explain(&self, explain: &Explain) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_tables(&self, tables: &[(TableIdentifier, usize)]) -> String {
        if tables.is_empty() {
            return "No tables".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["Dbms", "Schema", "Table", "Columns"]);
        for (id, columns) in tables {
            table.add_row(vec![
                Cell::new(&id.dbms),
                Cell::new(&id.schema),
                Cell::new(&id.table),
                Cell::new(columns),
            ]);
        }
        table.to_string()
    }

    fn format_columns(&self, id: &TableIdentifier, columns: &[Column]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Column", "Alias", "Type", "Nullable", "Enabled"]);
        for column in columns {
            table.add_row(vec![
                Cell::new(&column.name),
                Cell::new(column.alias.as_deref().unwrap_or("")),
                Cell::new(&column.column_type),
                Cell::new(yes_no(column.nullable)),
                Cell::new(yes_no(column.enabled)),
            ]);
        }
        format!("{}\n{}", id, table)
    }

    fn format_query(&self, query: &SqlQuery) -> String {
        let mut output = query.sql.clone();
        if !query.values.is_empty() {
            let mut table = Table::new();
            table.set_header(vec!["#", "Value"]);
            for (i, value) in query.values.iter().enumerate() {
                table.add_row(vec![Cell::new(i + 1), Cell::new(value)]);
            }
            output.push('\n');
            output.push_str(&table.to_string());
        }
        output
    }

    fn format_explain(&self, explain: &Explain) -> String {
        let mut output = format!("source: {}\n", explain.source);
        match &explain.query {
            Some(query) => output.push_str(&self.format_query(query)),
            None => output.push_str("(no SQL, stream is not backed by a table)"),
        }
        if !explain.in_memory.is_empty() {
            output.push_str(&format!("\nin memory: {}", explain.in_memory.join(", ")));
        }
        output
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_tables(&self, tables: &[(TableIdentifier, usize)]) -> String {
        let rows: Vec<serde_json::Value> = tables
            .iter()
            .map(|(id, columns)| {
                serde_json::json!({
                    "dbms": id.dbms,
                    "schema": id.schema,
                    "table": id.table,
                    "columns": columns,
                })
            })
            .collect();
        pretty(&serde_json::Value::Array(rows))
    }

    fn format_columns(&self, id: &TableIdentifier, columns: &[Column]) -> String {
        let columns = serde_json::to_value(columns).unwrap_or(serde_json::Value::Null);
        pretty(&serde_json::json!({
            "table": id.to_string(),
            "columns": columns,
        }))
    }

    fn format_query(&self, query: &SqlQuery) -> String {
        pretty(&query_to_json(query))
    }

    fn format_explain(&self, explain: &Explain) -> String {
        pretty(&serde_json::json!({
            "source": explain.source,
            "query": explain.query.as_ref().map(query_to_json),
            "pushed_down": explain.pushed_down,
            "in_memory": explain.in_memory,
        }))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

fn query_to_json(query: &SqlQuery) -> serde_json::Value {
    serde_json::json!({
        "sql": query.sql,
        "values": query.values.iter().map(value_to_json).collect::<Vec<_>>(),
    })
}

/// Convert a bind value to plain JSON.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int32(n) => serde_json::json!(n),
        Value::Int64(n) => serde_json::json!(n),
        Value::Float32(n) => serde_json::json!(n),
        Value::Float64(n) => serde_json::json!(n),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::json!(b),
        Value::Timestamp(ts) => serde_json::json!(ts),
    }
}
