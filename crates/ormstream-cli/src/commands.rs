//! Command execution.

use crate::formatter::{create_formatter, Formatter};
use crate::{Args, Command};
use ormstream_core::{
    column_field, render_where, ApplicationBuilder, ColumnIdentifier, Comparator, DbmsType, Error,
    Manager, Predicate, Project, ProjectComponent, RecordingExecutor, Row, SortKey, SortOrder,
    SqlQuery, TableIdentifier,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Command errors.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Filter parse or compile error, rendered with source context.
    #[error("{0}")]
    Language(String),

    /// Configuration, rendering or lifecycle error.
    #[error("error: {0}")]
    Core(#[from] Error),
}

/// Options of the `select` command.
struct SelectOptions<'a> {
    filters: &'a [String],
    order_by: &'a [String],
    limit: Option<u64>,
    offset: Option<u64>,
    count: bool,
}

/// Load the project document and run the command.
pub fn run(args: &Args) -> Result<String, CommandError> {
    let project = Arc::new(Project::from_path(&args.config)?);
    info!(
        path = %args.config.display(),
        project = %project.name,
        "Loaded project document"
    );
    let formatter = create_formatter(args.format);

    match &args.command {
        Command::Tables => Ok(list_tables(&project, &*formatter)),
        Command::Describe { table } => describe(&project, table, &*formatter),
        Command::Render { table, filters } => {
            render(&project, table, filters, args.dialect, &*formatter)
        }
        Command::Select {
            table,
            filters,
            order_by,
            limit,
            offset,
            count,
        } => {
            let options = SelectOptions {
                filters,
                order_by,
                limit: *limit,
                offset: *offset,
                count: *count,
            };
            select(project, table, &options, args.dialect, &*formatter)
        }
    }
}

fn list_tables(project: &Project, formatter: &dyn Formatter) -> String {
    let tables: Vec<(TableIdentifier, usize)> = project
        .tables()
        .into_iter()
        .map(|(id, table)| (id, table.columns.len()))
        .collect();
    formatter.format_tables(&tables)
}

fn describe(
    project: &Project,
    table: &str,
    formatter: &dyn Formatter,
) -> Result<String, CommandError> {
    let id = project.resolve_table(table)?;
    let columns = project
        .find_table(&id)
        .map(|t| t.columns.clone())
        .ok_or_else(|| Error::UnknownTable(id.to_string()))?;
    Ok(formatter.format_columns(&id, &columns))
}

fn render(
    project: &Project,
    table: &str,
    filters: &[String],
    dialect: Option<DbmsType>,
    formatter: &dyn Formatter,
) -> Result<String, CommandError> {
    let id = project.resolve_table(table)?;
    let dbms_type = dialect
        .or_else(|| project.dbms_type_of(&id))
        .unwrap_or_default();
    let predicates = compile_filters(project, &id, filters)?;

    let result = render_where(
        dbms_type,
        |column: &ColumnIdentifier| Ok(dbms_type.quote_identifier(&column.column)),
        |column: &ColumnIdentifier| {
            project
                .find_column(column)
                .map(|c| c.column_type.clone())
                .ok_or_else(|| Error::UnknownColumn(column.clone()))
        },
        &predicates,
    )?;
    debug!(dialect = %dbms_type, values = result.values.len(), "Rendered filters");

    Ok(formatter.format_query(&SqlQuery {
        sql: result.sql,
        values: result.values,
    }))
}

fn select(
    project: Arc<Project>,
    table: &str,
    options: &SelectOptions<'_>,
    dialect: Option<DbmsType>,
    formatter: &dyn Formatter,
) -> Result<String, CommandError> {
    let id = project.resolve_table(table)?;
    let predicates = compile_filters(&project, &id, options.filters)?;

    let executor = Arc::new(RecordingExecutor::<Row>::new(Vec::new()));
    let mut builder = Manager::<Row>::builder(Arc::clone(&project), id, executor.clone());
    if let Some(dbms_type) = dialect {
        builder = builder.with_dialect(dbms_type);
    }
    let manager = builder.build()?;

    let application = ApplicationBuilder::new()
        .with_component(ProjectComponent::new(Arc::clone(&project)))
        .with_component(manager.clone())
        .start()?;

    let mut stream = manager.stream();
    for predicate in predicates {
        stream = stream.filter(predicate);
    }
    if let Some(comparator) = comparator(&manager, options.order_by)? {
        stream = stream.sorted(comparator);
    }
    if let Some(offset) = options.offset {
        stream = stream.skip(offset);
    }
    if let Some(limit) = options.limit {
        stream = stream.limit(limit);
    }

    let output = if options.count {
        stream.count()?;
        let query = executor
            .last_query()
            .ok_or_else(|| Error::Executor("count issued no statement".to_string()))?;
        formatter.format_query(&query)
    } else {
        formatter.format_explain(&stream.explain()?)
    };

    application.stop()?;
    Ok(output)
}

fn compile_filters(
    project: &Project,
    table: &TableIdentifier,
    filters: &[String],
) -> Result<Vec<Predicate<Row>>, CommandError> {
    filters
        .iter()
        .map(|source| {
            ormstream_lang::parse_filter(project, table, source)
                .map_err(|e| CommandError::Language(e.format_with_source(source)))
        })
        .collect()
}

/// Build a comparator from `column` / `column.asc` / `column.desc` specs.
fn comparator(
    manager: &Manager<Row>,
    specs: &[String],
) -> Result<Option<Comparator<Row>>, CommandError> {
    let mut comparator: Option<Comparator<Row>> = None;
    for spec in specs {
        let (name, order) = match spec.rsplit_once('.') {
            Some((name, "desc")) => (name, SortOrder::Descending),
            Some((name, "asc")) => (name, SortOrder::Ascending),
            _ => (spec.as_str(), SortOrder::Ascending),
        };
        let key = SortKey::field(column_field(manager.column_identifier(name)?), order);
        comparator = Some(match comparator {
            Some(comparator) => comparator.then(key),
            None => Comparator::new(key),
        });
    }
    Ok(comparator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PROJECT: &str = r#"{
        "name": "sakila",
        "dbmses": [{
            "name": "db",
            "type": "mysql",
            "schemas": [{
                "name": "sakila",
                "tables": [{
                    "name": "film",
                    "primary_key": ["film_id"],
                    "columns": [
                        {"name": "film_id", "type": "int32", "alias": "id"},
                        {"name": "title", "type": "string"},
                        {"name": "rating", "type": "string", "nullable": true},
                        {"name": "length", "type": "int32"}
                    ]
                }]
            }]
        }]
    }"#;

    fn project_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PROJECT.as_bytes()).unwrap();
        file
    }

    fn run_with(
        file: &NamedTempFile,
        dialect: Option<DbmsType>,
        command: Command,
    ) -> Result<String, CommandError> {
        run(&Args {
            config: file.path().to_path_buf(),
            dialect,
            format: OutputFormat::Json,
            command,
        })
    }

    fn json(output: &str) -> serde_json::Value {
        serde_json::from_str(output).unwrap()
    }

    fn select_command(filters: &[&str], order_by: &[&str]) -> Command {
        Command::Select {
            table: "film".to_string(),
            filters: filters.iter().map(|f| f.to_string()).collect(),
            order_by: order_by.iter().map(|o| o.to_string()).collect(),
            limit: Some(10),
            offset: None,
            count: false,
        }
    }

    #[test]
    fn test_tables() {
        let file = project_file();
        let output = json(&run_with(&file, None, Command::Tables).unwrap());
        assert_eq!(output[0]["table"], "film");
        assert_eq!(output[0]["columns"], 4);
    }

    #[test]
    fn test_describe() {
        let file = project_file();
        let output = run_with(
            &file,
            None,
            Command::Describe {
                table: "sakila.film".to_string(),
            },
        )
        .unwrap();
        let output = json(&output);
        assert_eq!(output["table"], "db.sakila.film");
        assert_eq!(output["columns"][0]["alias"], "id");
    }

    #[test]
    fn test_render() {
        let file = project_file();
        let output = run_with(
            &file,
            Some(DbmsType::PostgreSql),
            Command::Render {
                table: "film".to_string(),
                filters: vec!["id > 5".to_string(), "rating == null".to_string()],
            },
        )
        .unwrap();
        let output = json(&output);
        assert_eq!(
            output["sql"],
            "(\"film_id\" > $1) AND (\"rating\" IS NULL)"
        );
        assert_eq!(output["values"], serde_json::json!([5]));
    }

    #[test]
    fn test_select_explains_pushed_statement() {
        let file = project_file();
        let command = select_command(&["length > 60"], &["title.desc", "id"]);
        let output = run_with(&file, None, command).unwrap();
        let output = json(&output);
        assert_eq!(
            output["query"]["sql"],
            "SELECT `film_id`, `title`, `rating`, `length` FROM `sakila`.`film` \
             WHERE (`length` > ?) ORDER BY `title` DESC, `film_id` ASC LIMIT ?"
        );
        assert_eq!(output["query"]["values"], serde_json::json!([60, 10]));
        assert_eq!(output["in_memory"], serde_json::json!([]));
    }

    #[test]
    fn test_select_count() {
        let file = project_file();
        let command = Command::Select {
            table: "film".to_string(),
            filters: vec!["title startsWith 'A'".to_string()],
            order_by: vec!["title".to_string()],
            limit: None,
            offset: None,
            count: true,
        };
        let output = json(&run_with(&file, None, command).unwrap());
        assert_eq!(
            output["sql"],
            "SELECT COUNT(*) FROM `sakila`.`film` WHERE (`title` LIKE ?)"
        );
        assert_eq!(output["values"], serde_json::json!(["A%"]));
    }

    #[test]
    fn test_filter_errors_render_source_context() {
        let file = project_file();
        let err = run_with(&file, None, select_command(&["length = 60"], &[])).unwrap_err();
        match err {
            CommandError::Language(message) => {
                assert!(message.contains("use '==' for equality"));
                assert!(message.contains("length = 60"));
            }
            other => panic!("expected language error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_sort_column() {
        let file = project_file();
        let err = run_with(&file, None, select_command(&[], &["budget.desc"])).unwrap_err();
        assert!(matches!(err, CommandError::Core(Error::UnknownColumn(_))));
    }
}
