//! Column definitions for tables.

use super::types::ScalarType;
use serde::{Deserialize, Serialize};

fn enabled_by_default() -> bool {
    true
}

/// A column definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name in the database.
    pub name: String,
    /// Alternative name used by generated code and the filter language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Column data type.
    #[serde(rename = "type")]
    pub column_type: ScalarType,
    /// Whether the column accepts nulls.
    #[serde(default)]
    pub nullable: bool,
    /// Disabled columns are neither selected nor usable in predicates.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Column {
    /// Create a new non-nullable column.
    pub fn new(name: impl Into<String>, column_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            column_type,
            nullable: false,
            enabled: true,
        }
    }

    /// Create a nullable column.
    pub fn nullable(name: impl Into<String>, column_type: ScalarType) -> Self {
        Self {
            nullable: true,
            ..Self::new(name, column_type)
        }
    }

    /// Set the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Mark as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Alias if set, otherwise the database name.
    pub fn property_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Check whether `name` refers to this column by name or alias.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.alias.as_deref() == Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder() {
        let column = Column::nullable("birth_date", ScalarType::Timestamp).with_alias("born");

        assert!(column.nullable);
        assert!(column.enabled);
        assert_eq!(column.property_name(), "born");
        assert!(column.is_named("born"));
        assert!(column.is_named("birth_date"));
        assert!(!column.is_named("birth"));
    }

    #[test]
    fn test_column_json_defaults() {
        let column: Column = serde_json::from_str(r#"{"name": "id", "type": "int64"}"#).unwrap();

        assert_eq!(column, Column::new("id", ScalarType::Int64));
    }
}
