//! Table definitions.

use super::column::Column;
use serde::{Deserialize, Serialize};

/// A table definition within a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name in the database.
    pub name: String,
    /// Alternative name used by generated code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Names of the primary key columns, in key order.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Column definitions in declaration order.
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a new table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            primary_key: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Add a column to the table.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add multiple columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Set the primary key columns.
    pub fn with_primary_key<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Get a column by its database name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get an enabled column by database name or alias.
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.enabled_columns().find(|c| c.is_named(name))
    }

    /// All enabled columns in declaration order.
    pub fn enabled_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.enabled)
    }

    /// Get the primary key column definitions.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key
            .iter()
            .filter_map(|name| self.get_column(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScalarType;

    fn user_table() -> Table {
        Table::new("user")
            .with_primary_key(["id"])
            .with_column(Column::new("id", ScalarType::Int64))
            .with_column(Column::new("name", ScalarType::String).with_alias("fullName"))
            .with_column(Column::nullable("legacy", ScalarType::String).disabled())
    }

    #[test]
    fn test_table_builder() {
        let table = user_table();

        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.enabled_columns().count(), 2);
        assert_eq!(
            table.primary_key_columns().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["id"]
        );
    }

    #[test]
    fn test_find_column_by_alias_skips_disabled() {
        let table = user_table();

        assert_eq!(table.find_column("fullName").map(|c| c.name.as_str()), Some("name"));
        assert!(table.get_column("legacy").is_some());
        assert!(table.find_column("legacy").is_none());
        assert!(table.find_column("nonexistent").is_none());
    }
}
