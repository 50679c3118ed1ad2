//! Composite identifiers for configured tables and columns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a table by dbms, schema and table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Dbms name.
    pub dbms: String,
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl TableIdentifier {
    /// Create a new table identifier.
    pub fn new(
        dbms: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            dbms: dbms.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Identifier of a column in this table.
    pub fn column(&self, column: impl Into<String>) -> ColumnIdentifier {
        ColumnIdentifier {
            dbms: self.dbms.clone(),
            schema: self.schema.clone(),
            table: self.table.clone(),
            column: column.into(),
        }
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.dbms, self.schema, self.table)
    }
}

/// Identifies a column by dbms, schema, table and column name.
///
/// Value equality makes it usable as the key correlating a typed field with
/// its configured column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnIdentifier {
    /// Dbms name.
    pub dbms: String,
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub table: String,
    /// Column name.
    pub column: String,
}

impl ColumnIdentifier {
    /// Create a new column identifier.
    pub fn new(
        dbms: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            dbms: dbms.into(),
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    /// Identifier of the owning table.
    pub fn table_identifier(&self) -> TableIdentifier {
        TableIdentifier::new(&self.dbms, &self.schema, &self.table)
    }
}

impl fmt::Display for ColumnIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.dbms, self.schema, self.table, self.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_identifier_value_equality() {
        let table = TableIdentifier::new("db0", "public", "user");
        let a = table.column("age");
        let b = ColumnIdentifier::new("db0", "public", "user", "age");
        assert_eq!(a, b);
        assert_eq!(a.table_identifier(), table);

        let mut names = HashMap::new();
        names.insert(a, "age");
        assert_eq!(names.get(&b), Some(&"age"));
    }

    #[test]
    fn test_identifier_display() {
        let id = ColumnIdentifier::new("db0", "public", "user", "age");
        assert_eq!(id.to_string(), "db0.public.user.age");
        assert_eq!(id.table_identifier().to_string(), "db0.public.user");
    }
}
