//! Project document - the root of the configuration tree.

use super::{Column, ColumnIdentifier, Table, TableIdentifier};
use crate::error::{Error, Result};
use crate::sql::DbmsType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// A schema containing tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name.
    pub name: String,
    /// Tables in the schema.
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Add a table to the schema.
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// A database management system instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dbms {
    /// Dbms name, unique within the project.
    pub name: String,
    /// Vendor type, selects the SQL dialect.
    #[serde(rename = "type")]
    pub dbms_type: DbmsType,
    /// Schemas in the dbms.
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

impl Dbms {
    /// Create an empty dbms.
    pub fn new(name: impl Into<String>, dbms_type: DbmsType) -> Self {
        Self {
            name: name.into(),
            dbms_type,
            schemas: Vec::new(),
        }
    }

    /// Add a schema to the dbms.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Get a schema by name.
    pub fn get_schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }
}

/// The configuration document: dbms, schema, table and column metadata.
///
/// Built once per application and treated as read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Configured dbms instances.
    #[serde(default)]
    pub dbmses: Vec<Dbms>,
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dbmses: Vec::new(),
        }
    }

    /// Add a dbms to the project.
    pub fn with_dbms(mut self, dbms: Dbms) -> Self {
        self.dbmses.push(dbms);
        self
    }

    /// Parse and validate a JSON project document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let project: Project = serde_json::from_str(json)?;
        project.validate()?;
        Ok(project)
    }

    /// Read, parse and validate a JSON project document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let project = Self::from_json_str(&json)?;
        debug!(
            path = %path.display(),
            project = %project.name,
            tables = project.tables().len(),
            "Loaded project document"
        );
        Ok(project)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check names are unique at every level and primary keys exist.
    pub fn validate(&self) -> Result<()> {
        check_unique("dbms", &self.name, self.dbmses.iter().map(|d| d.name.as_str()))?;

        for dbms in &self.dbmses {
            check_unique("schema", &dbms.name, dbms.schemas.iter().map(|s| s.name.as_str()))?;

            for schema in &dbms.schemas {
                let scope = format!("{}.{}", dbms.name, schema.name);
                check_unique("table", &scope, schema.tables.iter().map(|t| t.name.as_str()))?;

                for table in &schema.tables {
                    let scope = format!("{}.{}.{}", dbms.name, schema.name, table.name);
                    check_unique("column", &scope, table.columns.iter().map(|c| c.name.as_str()))?;

                    for key in &table.primary_key {
                        if table.get_column(key).is_none() {
                            return Err(Error::Config(format!(
                                "primary key column '{}' not found in {}",
                                key, scope
                            )));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Get a dbms by name.
    pub fn get_dbms(&self, name: &str) -> Option<&Dbms> {
        self.dbmses.iter().find(|d| d.name == name)
    }

    /// Look up a table.
    pub fn find_table(&self, id: &TableIdentifier) -> Option<&Table> {
        self.get_dbms(&id.dbms)?
            .get_schema(&id.schema)?
            .get_table(&id.table)
    }

    /// Look up an enabled column by its database name.
    pub fn find_column(&self, id: &ColumnIdentifier) -> Option<&Column> {
        self.find_table(&id.table_identifier())?
            .enabled_columns()
            .find(|c| c.name == id.column)
    }

    /// Dialect of the dbms owning a table.
    pub fn dbms_type_of(&self, id: &TableIdentifier) -> Option<DbmsType> {
        self.get_dbms(&id.dbms).map(|d| d.dbms_type)
    }

    /// All tables with their identifiers, in document order.
    pub fn tables(&self) -> Vec<(TableIdentifier, &Table)> {
        let mut tables = Vec::new();
        for dbms in &self.dbmses {
            for schema in &dbms.schemas {
                for table in &schema.tables {
                    tables.push((
                        TableIdentifier::new(&dbms.name, &schema.name, &table.name),
                        table,
                    ));
                }
            }
        }
        tables
    }

    /// Resolve `table`, `schema.table` or `dbms.schema.table` to a unique
    /// table identifier.
    pub fn resolve_table(&self, name: &str) -> Result<TableIdentifier> {
        let parts: Vec<&str> = name.split('.').collect();
        let mut matches: Vec<TableIdentifier> = self
            .tables()
            .into_iter()
            .map(|(id, _)| id)
            .filter(|id| match parts.as_slice() {
                [table] => id.table == *table,
                [schema, table] => id.schema == *schema && id.table == *table,
                [dbms, schema, table] => {
                    id.dbms == *dbms && id.schema == *schema && id.table == *table
                }
                _ => false,
            })
            .collect();

        match matches.len() {
            0 => Err(Error::UnknownTable(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::Config(format!(
                "table name '{}' is ambiguous: {}",
                name,
                matches
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

fn check_unique<'a>(
    kind: &str,
    scope: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::Config(format!(
                "duplicate {} '{}' in {}",
                kind, name, scope
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScalarType;

    fn sample_project() -> Project {
        let user = Table::new("user")
            .with_primary_key(["id"])
            .with_column(Column::new("id", ScalarType::Int64))
            .with_column(Column::new("name", ScalarType::String))
            .with_column(Column::nullable("age", ScalarType::Int32));

        Project::new("demo").with_dbms(
            Dbms::new("db0", DbmsType::PostgreSql)
                .with_schema(Schema::new("public").with_table(user))
                .with_schema(Schema::new("audit").with_table(Table::new("user"))),
        )
    }

    #[test]
    fn test_find_column() {
        let project = sample_project();
        let id = ColumnIdentifier::new("db0", "public", "user", "age");

        let column = project.find_column(&id).unwrap();
        assert_eq!(column.column_type, ScalarType::Int32);
        assert!(column.nullable);

        let missing = ColumnIdentifier::new("db0", "public", "user", "email");
        assert!(project.find_column(&missing).is_none());
    }

    #[test]
    fn test_resolve_table() {
        let project = sample_project();

        let id = project.resolve_table("public.user").unwrap();
        assert_eq!(id, TableIdentifier::new("db0", "public", "user"));
        assert!(project.resolve_table("db0.audit.user").is_ok());

        assert!(matches!(project.resolve_table("user"), Err(Error::Config(_))));
        assert!(matches!(project.resolve_table("order"), Err(Error::UnknownTable(_))));
    }

    #[test]
    fn test_validate_duplicate_column() {
        let table = Table::new("t")
            .with_column(Column::new("a", ScalarType::Int32))
            .with_column(Column::new("a", ScalarType::Int64));
        let project = Project::new("p").with_dbms(
            Dbms::new("db", DbmsType::MySql).with_schema(Schema::new("s").with_table(table)),
        );

        let err = project.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate column 'a'"));
    }

    #[test]
    fn test_validate_missing_primary_key() {
        let table = Table::new("t")
            .with_primary_key(["id"])
            .with_column(Column::new("a", ScalarType::Int32));
        let project = Project::new("p").with_dbms(
            Dbms::new("db", DbmsType::MySql).with_schema(Schema::new("s").with_table(table)),
        );

        assert!(matches!(project.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_json_roundtrip_and_path() {
        let project = sample_project();
        let json = project.to_json_string().unwrap();
        assert_eq!(Project::from_json_str(&json).unwrap(), project);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(&path, json).unwrap();
        assert_eq!(Project::from_path(&path).unwrap(), project);
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "name": "shop",
            "dbmses": [{
                "name": "main",
                "type": "mysql",
                "schemas": [{
                    "name": "shop",
                    "tables": [{
                        "name": "product",
                        "primary_key": ["id"],
                        "columns": [
                            {"name": "id", "type": "int64"},
                            {"name": "price", "type": {"decimal": {"precision": 10, "scale": 2}}},
                            {"name": "title", "type": "string", "nullable": true}
                        ]
                    }]
                }]
            }]
        }"#;

        let project = Project::from_json_str(json).unwrap();
        let id = project.resolve_table("product").unwrap();
        assert_eq!(project.dbms_type_of(&id), Some(DbmsType::MySql));
        assert_eq!(project.find_table(&id).unwrap().columns.len(), 3);
    }
}
