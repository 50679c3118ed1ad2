//! Dynamic rows keyed by column name.

use crate::config::ColumnIdentifier;
use crate::field::Field;
use crate::value::Value;

/// A row of named column values, in select-list order.
///
/// Used where no entity type exists, e.g. predicates compiled from the
/// filter language.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column value, replacing an existing one.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Value of a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Columns in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Row::new(), |row, (column, value)| row.with(column, value))
    }
}

/// Field reading the identified column from a [`Row`]; missing columns read
/// as null.
pub fn column_field(identifier: ColumnIdentifier) -> Field<Row> {
    let column = identifier.column.clone();
    Field::new(identifier, move |row: &Row| {
        row.get(&column).cloned().unwrap_or(Value::Null)
    })
}
