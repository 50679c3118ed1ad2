//! Initial data sources of a pipeline.

use super::{QueryExecutor, StreamConfig};
use crate::config::{Column, ColumnIdentifier, Project, ScalarType, TableIdentifier};
use crate::error::{Error, Result};
use crate::lifecycle::ComponentState;
use crate::sql::DbmsType;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Deferred producer of in-memory elements.
pub type Supplier<E> = Box<dyn FnOnce() -> Result<Vec<E>> + Send>;

/// Where a pipeline's elements come from.
pub enum Source<E> {
    /// Elements produced in memory; every stage is replayed.
    Supplier(Supplier<E>),
    /// Rows of a configured table; leading stages may become SQL.
    Table(Arc<TableSource<E>>),
}

impl<E> Source<E> {
    /// Source over a fixed list of elements.
    pub fn from_vec(elements: Vec<E>) -> Self
    where
        E: Send + 'static,
    {
        Source::Supplier(Box::new(move || Ok(elements)))
    }
}

impl<E> fmt::Debug for Source<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Supplier(_) => f.write_str("Supplier(<closure>)"),
            Source::Table(table) => f
                .debug_tuple("Table")
                .field(&table.table().to_string())
                .finish(),
        }
    }
}

/// Table metadata and collaborators needed to run a stream against SQL.
///
/// Built once per manager from the project document; column lookups go
/// through a map keyed by [`ColumnIdentifier`].
pub struct TableSource<E> {
    table: TableIdentifier,
    dbms_type: DbmsType,
    columns: HashMap<ColumnIdentifier, Column>,
    select_columns: Vec<ColumnIdentifier>,
    executor: Arc<dyn QueryExecutor<E>>,
    config: StreamConfig,
    state: RwLock<ComponentState>,
}

impl<E> TableSource<E> {
    /// Resolve a table of `project`. The dialect defaults to the owning
    /// dbms type.
    pub fn new(
        project: &Project,
        table: TableIdentifier,
        dbms_type: Option<DbmsType>,
        executor: Arc<dyn QueryExecutor<E>>,
        config: StreamConfig,
    ) -> Result<Self> {
        let definition = project
            .find_table(&table)
            .ok_or_else(|| Error::UnknownTable(table.to_string()))?;
        let dbms_type = match dbms_type {
            Some(dbms_type) => dbms_type,
            None => project
                .dbms_type_of(&table)
                .ok_or_else(|| Error::UnknownTable(table.to_string()))?,
        };

        let select_columns: Vec<ColumnIdentifier> = definition
            .enabled_columns()
            .map(|c| table.column(&c.name))
            .collect();
        let columns = definition
            .enabled_columns()
            .map(|c| (table.column(&c.name), c.clone()))
            .collect();

        Ok(Self {
            table,
            dbms_type,
            columns,
            select_columns,
            executor,
            config,
            state: RwLock::new(ComponentState::Created),
        })
    }

    /// The backing table.
    pub fn table(&self) -> &TableIdentifier {
        &self.table
    }

    /// SQL dialect.
    pub fn dbms_type(&self) -> DbmsType {
        self.dbms_type
    }

    /// Push-down settings.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// The query executor.
    pub fn executor(&self) -> &dyn QueryExecutor<E> {
        self.executor.as_ref()
    }

    /// Column definition for an identifier of this table.
    pub fn column(&self, id: &ColumnIdentifier) -> Result<&Column> {
        self.columns
            .get(id)
            .ok_or_else(|| Error::UnknownColumn(id.clone()))
    }

    /// Quoted column name.
    pub fn column_name(&self, id: &ColumnIdentifier) -> Result<String> {
        Ok(self.dbms_type.quote_identifier(&self.column(id)?.name))
    }

    /// Configured column type.
    pub fn column_type(&self, id: &ColumnIdentifier) -> Result<ScalarType> {
        Ok(self.column(id)?.column_type.clone())
    }

    /// Quoted `schema.table` reference.
    pub fn qualified_table(&self) -> String {
        format!(
            "{}.{}",
            self.dbms_type.quote_identifier(&self.table.schema),
            self.dbms_type.quote_identifier(&self.table.table)
        )
    }

    /// Quoted names of the selected columns, in declaration order.
    pub fn select_list(&self) -> Vec<String> {
        self.select_columns
            .iter()
            .filter_map(|id| self.column_name(id).ok())
            .collect()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComponentState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, state: ComponentState) {
        *self.state.write() = state;
    }

    /// Fail if the owning manager has been stopped.
    pub fn ensure_running(&self) -> Result<()> {
        match self.state() {
            ComponentState::Stopped => Err(Error::Lifecycle(format!(
                "manager for {} is stopped",
                self.table
            ))),
            ComponentState::Created | ComponentState::Started => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dbms, Schema, Table};
    use crate::stream::RecordingExecutor;

    fn project() -> Project {
        let table = Table::new("user")
            .with_column(Column::new("id", ScalarType::Int64))
            .with_column(Column::new("name", ScalarType::String).with_alias("fullName"))
            .with_column(Column::new("legacy", ScalarType::String).disabled());
        Project::new("p").with_dbms(
            Dbms::new("db", DbmsType::MySql).with_schema(Schema::new("app").with_table(table)),
        )
    }

    fn source(dbms_type: Option<DbmsType>) -> TableSource<()> {
        TableSource::new(
            &project(),
            TableIdentifier::new("db", "app", "user"),
            dbms_type,
            Arc::new(RecordingExecutor::<()>::new(Vec::new())),
            StreamConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_column_lookup() {
        let source = source(None);
        let table = source.table().clone();

        assert_eq!(source.dbms_type(), DbmsType::MySql);
        assert_eq!(source.column_name(&table.column("name")).unwrap(), "`name`");
        assert_eq!(source.column_type(&table.column("id")).unwrap(), ScalarType::Int64);
        assert!(matches!(
            source.column_name(&table.column("legacy")),
            Err(Error::UnknownColumn(_))
        ));
        assert_eq!(source.select_list(), vec!["`id`", "`name`"]);
        assert_eq!(source.qualified_table(), "`app`.`user`");
    }

    #[test]
    fn test_dialect_override() {
        let source = source(Some(DbmsType::PostgreSql));
        assert_eq!(source.qualified_table(), "\"app\".\"user\"");
    }

    #[test]
    fn test_unknown_table() {
        let result = TableSource::<()>::new(
            &project(),
            TableIdentifier::new("db", "app", "order"),
            None,
            Arc::new(RecordingExecutor::<()>::new(Vec::new())),
            StreamConfig::default(),
        );
        assert!(matches!(result, Err(Error::UnknownTable(_))));
    }

    #[test]
    fn test_stopped_rejects() {
        let source = source(None);
        assert!(source.ensure_running().is_ok());
        source.set_state(ComponentState::Stopped);
        assert!(matches!(source.ensure_running(), Err(Error::Lifecycle(_))));
    }
}
