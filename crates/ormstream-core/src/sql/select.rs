//! SELECT statement assembly.

use super::{DbmsType, RenderResult};
use crate::error::{Error, Result};
use crate::field::SortOrder;
use crate::value::Value;
use std::fmt;

/// A parameterized statement ready for execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlQuery {
    /// Statement text with placeholders.
    pub sql: String,
    /// Bind values in placeholder order.
    pub values: Vec<Value>,
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        if !self.values.is_empty() {
            let values: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
            write!(f, " -- [{}]", values.join(", "))?;
        }
        Ok(())
    }
}

/// Builds `SELECT ... FROM ... [WHERE] [ORDER BY] [pagination]`.
///
/// Column and table names are taken as given; quote them with
/// [`DbmsType::quote_identifier`] first.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    dbms_type: DbmsType,
    table: String,
    columns: Vec<String>,
    filter: RenderResult,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    /// Start a statement over a (quoted) table reference.
    pub fn new(dbms_type: DbmsType, table: impl Into<String>) -> Self {
        Self {
            dbms_type,
            table: table.into(),
            columns: Vec::new(),
            filter: RenderResult::default(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Columns to select; `*` when none are given.
    pub fn columns(mut self, columns: impl IntoIterator<Item = String>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Rendered WHERE body.
    pub fn filter(mut self, filter: RenderResult) -> Self {
        self.filter = filter;
        self
    }

    /// Append an ORDER BY key.
    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    /// Maximum number of rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Number of leading rows to skip.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Assemble the row query.
    pub fn build(&self) -> Result<SqlQuery> {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", columns, self.table);
        let mut values = self.filter.values.clone();

        if !self.filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filter.sql);
        }

        if !self.order_by.is_empty() {
            let keys: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, order)| {
                    let nulls = self.dbms_type.null_ordering(*order);
                    format!("{} {}{}", column, order.sql(), nulls)
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        if let Some(pagination) = self.pagination(&mut values)? {
            sql.push(' ');
            sql.push_str(&pagination);
        }

        Ok(SqlQuery { sql, values })
    }

    /// Assemble a `COUNT(*)` query over the same rows.
    ///
    /// Ordering is dropped; a paginated selection is counted as a subquery.
    pub fn build_count(&self) -> Result<SqlQuery> {
        if self.limit.is_none() && self.offset.is_none() {
            let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);
            if !self.filter.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&self.filter.sql);
            }
            return Ok(SqlQuery {
                sql,
                values: self.filter.values.clone(),
            });
        }

        let inner = self.build()?;
        Ok(SqlQuery {
            sql: format!("SELECT COUNT(*) FROM ({}) counted", inner.sql),
            values: inner.values,
        })
    }

    fn pagination(&self, values: &mut Vec<Value>) -> Result<Option<String>> {
        if self.offset.is_some()
            && self.limit.is_none()
            && !self.dbms_type.supports_offset_without_limit()
        {
            return Err(Error::InvalidOperand(format!(
                "{} does not support OFFSET without LIMIT",
                self.dbms_type
            )));
        }

        let dbms_type = self.dbms_type;
        let mut bind = |n: u64| {
            values.push(Value::Int64(i64::try_from(n).unwrap_or(i64::MAX)));
            dbms_type.placeholder(values.len())
        };

        let (limit, offset) = if dbms_type.limit_before_offset() {
            let limit = self.limit.map(&mut bind);
            (limit, self.offset.map(&mut bind))
        } else {
            let offset = self.offset.map(&mut bind);
            (self.limit.map(&mut bind), offset)
        };

        Ok(dbms_type.pagination(limit.as_deref(), offset.as_deref()))
    }
}
