//! Table managers: the entry point for streaming a configured table.

use crate::config::{ColumnIdentifier, Project, TableIdentifier};
use crate::error::{Error, Result};
use crate::lifecycle::{ComponentState, Lifecycle, ProjectComponent};
use crate::sql::DbmsType;
use crate::stream::{EntityStream, QueryExecutor, Source, StreamConfig, TableSource};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Streams entities of one configured table.
///
/// Cloning is cheap; clones share the table metadata, the executor and the
/// lifecycle state. A stopped manager rejects execution.
pub struct Manager<E> {
    name: String,
    project: Arc<Project>,
    source: Arc<TableSource<E>>,
}

impl<E> Manager<E> {
    /// Start building a manager for `table`.
    pub fn builder(
        project: Arc<Project>,
        table: TableIdentifier,
        executor: Arc<dyn QueryExecutor<E>>,
    ) -> ManagerBuilder<E> {
        ManagerBuilder {
            project,
            table,
            executor,
            dbms_type: None,
            config: StreamConfig::default(),
        }
    }

    /// A new stream over every row of the table.
    pub fn stream(&self) -> EntityStream<E> {
        EntityStream::from_source(Source::Table(Arc::clone(&self.source)))
    }

    /// The managed table.
    pub fn table(&self) -> &TableIdentifier {
        self.source.table()
    }

    /// SQL dialect used for rendering.
    pub fn dbms_type(&self) -> DbmsType {
        self.source.dbms_type()
    }

    /// Push-down settings.
    pub fn config(&self) -> &StreamConfig {
        self.source.config()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComponentState {
        self.source.state()
    }

    /// Identifier of an enabled column, looked up by name or alias.
    pub fn column_identifier(&self, name: &str) -> Result<ColumnIdentifier> {
        let table = self.source.table();
        self.project
            .find_table(table)
            .and_then(|t| t.find_column(name))
            .map(|c| table.column(&c.name))
            .ok_or_else(|| Error::UnknownColumn(table.column(name)))
    }
}

impl<E> Clone for Manager<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            project: Arc::clone(&self.project),
            source: Arc::clone(&self.source),
        }
    }
}

impl<E> fmt::Debug for Manager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("table", &self.table().to_string())
            .field("dbms_type", &self.dbms_type())
            .field("state", &self.state())
            .finish()
    }
}

impl<E> Lifecycle for Manager<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        vec![ProjectComponent::NAME.to_string()]
    }

    fn start(&self) -> Result<()> {
        self.source.set_state(ComponentState::Started);
        info!(table = %self.table(), dialect = %self.dbms_type(), "Manager started");
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.source.set_state(ComponentState::Stopped);
        info!(table = %self.table(), "Manager stopped");
        Ok(())
    }
}

/// Builder for [`Manager`].
pub struct ManagerBuilder<E> {
    project: Arc<Project>,
    table: TableIdentifier,
    executor: Arc<dyn QueryExecutor<E>>,
    dbms_type: Option<DbmsType>,
    config: StreamConfig,
}

impl<E> ManagerBuilder<E> {
    /// Render with `dbms_type` instead of the owning dbms type.
    pub fn with_dialect(mut self, dbms_type: DbmsType) -> Self {
        self.dbms_type = Some(dbms_type);
        self
    }

    /// Push-down settings.
    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve the table against the document and build the manager.
    pub fn build(self) -> Result<Manager<E>> {
        let source = TableSource::new(
            &self.project,
            self.table,
            self.dbms_type,
            self.executor,
            self.config,
        )?;
        Ok(Manager {
            name: format!("manager:{}", source.table()),
            project: self.project,
            source: Arc::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Column, Dbms, ScalarType, Schema, Table};
    use crate::stream::RecordingExecutor;

    fn project() -> Arc<Project> {
        let table = Table::new("film")
            .with_column(Column::new("film_id", ScalarType::Int32).with_alias("id"))
            .with_column(Column::new("title", ScalarType::String));
        Arc::new(Project::new("sakila").with_dbms(
            Dbms::new("db", DbmsType::MySql).with_schema(Schema::new("sakila").with_table(table)),
        ))
    }

    fn manager() -> Manager<i32> {
        Manager::builder(
            project(),
            TableIdentifier::new("db", "sakila", "film"),
            Arc::new(RecordingExecutor::new(vec![1, 2, 3])),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_column_identifier_by_name_or_alias() {
        let manager = manager();
        let expected = ColumnIdentifier::new("db", "sakila", "film", "film_id");

        assert_eq!(manager.column_identifier("film_id").unwrap(), expected);
        assert_eq!(manager.column_identifier("id").unwrap(), expected);
        assert!(matches!(
            manager.column_identifier("rating"),
            Err(Error::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_lifecycle_state_is_shared() {
        let manager = manager();
        let clone = manager.clone();
        assert_eq!(manager.name(), "manager:db.sakila.film");
        assert_eq!(manager.dependencies(), vec!["project"]);

        manager.start().unwrap();
        assert_eq!(clone.state(), ComponentState::Started);
        assert_eq!(clone.stream().collect().unwrap(), vec![1, 2, 3]);

        manager.stop().unwrap();
        assert!(matches!(clone.stream().collect(), Err(Error::Lifecycle(_))));
        assert!(matches!(clone.stream().count(), Err(Error::Lifecycle(_))));
    }

    #[test]
    fn test_dialect_override() {
        let manager = Manager::builder(
            project(),
            TableIdentifier::new("db", "sakila", "film"),
            Arc::new(RecordingExecutor::<i32>::new(Vec::new())),
        )
        .with_dialect(DbmsType::PostgreSql)
        .with_config(StreamConfig::in_memory())
        .build()
        .unwrap();

        assert_eq!(manager.dbms_type(), DbmsType::PostgreSql);
        assert!(!manager.config().push_down_filters);
    }
}
