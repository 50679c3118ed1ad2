//! Vendor dialects.

use crate::field::SortOrder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database vendor, selecting quoting, placeholder and pagination syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbmsType {
    /// ANSI SQL.
    #[default]
    Generic,
    /// MySQL / MariaDB.
    MySql,
    /// PostgreSQL.
    PostgreSql,
    /// SQLite.
    Sqlite,
}

impl DbmsType {
    /// All known dialects.
    pub const ALL: [DbmsType; 4] = [
        DbmsType::Generic,
        DbmsType::MySql,
        DbmsType::PostgreSql,
        DbmsType::Sqlite,
    ];

    /// Lowercase dialect name.
    pub fn name(&self) -> &'static str {
        match self {
            DbmsType::Generic => "generic",
            DbmsType::MySql => "mysql",
            DbmsType::PostgreSql => "postgresql",
            DbmsType::Sqlite => "sqlite",
        }
    }

    /// Quote an identifier, doubling embedded quote characters.
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            DbmsType::MySql => format!("`{}`", name.replace('`', "``")),
            _ => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Placeholder for the bind value at 1-based `position`.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            DbmsType::PostgreSql => format!("${}", position),
            _ => "?".to_string(),
        }
    }

    /// Suffix appended after a LIKE operand whose pattern uses `\` escapes.
    ///
    /// MySQL and PostgreSQL treat backslash as the default escape character.
    pub fn like_escape_clause(&self) -> &'static str {
        match self {
            DbmsType::MySql | DbmsType::PostgreSql => "",
            DbmsType::Generic | DbmsType::Sqlite => " ESCAPE '\\'",
        }
    }

    /// Null placement appended to an ORDER BY key.
    ///
    /// In-memory sorting puts nulls first when ascending and last when
    /// descending. MySQL and SQLite already sort that way; PostgreSQL sorts
    /// nulls as the largest value and ANSI leaves it to the implementation.
    pub fn null_ordering(&self, order: SortOrder) -> &'static str {
        match (self, order) {
            (DbmsType::MySql | DbmsType::Sqlite, _) => "",
            (DbmsType::Generic | DbmsType::PostgreSql, SortOrder::Ascending) => " NULLS FIRST",
            (DbmsType::Generic | DbmsType::PostgreSql, SortOrder::Descending) => " NULLS LAST",
        }
    }

    /// Whether `OFFSET` may be used without a row limit.
    pub fn supports_offset_without_limit(&self) -> bool {
        matches!(self, DbmsType::Generic | DbmsType::PostgreSql)
    }

    /// Whether the pagination clause binds the limit before the offset.
    pub fn limit_before_offset(&self) -> bool {
        !matches!(self, DbmsType::Generic)
    }

    /// Render the pagination clause with the given placeholders.
    ///
    /// Returns `None` if neither a limit nor an offset is requested, or if
    /// an offset without limit is not supported. Placeholders are taken in
    /// the order given by [`DbmsType::limit_before_offset`].
    pub fn pagination(&self, limit: Option<&str>, offset: Option<&str>) -> Option<String> {
        match self {
            DbmsType::Generic => match (limit, offset) {
                (None, None) => None,
                (Some(limit), None) => Some(format!("FETCH FIRST {} ROWS ONLY", limit)),
                (None, Some(offset)) => Some(format!("OFFSET {} ROWS", offset)),
                (Some(limit), Some(offset)) => Some(format!(
                    "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                    offset, limit
                )),
            },
            DbmsType::MySql | DbmsType::Sqlite | DbmsType::PostgreSql => match (limit, offset) {
                (None, None) => None,
                (Some(limit), None) => Some(format!("LIMIT {}", limit)),
                (None, Some(offset)) if self.supports_offset_without_limit() => {
                    Some(format!("OFFSET {}", offset))
                }
                (None, Some(_)) => None,
                (Some(limit), Some(offset)) => Some(format!("LIMIT {} OFFSET {}", limit, offset)),
            },
        }
    }
}

impl fmt::Display for DbmsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DbmsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(DbmsType::Generic),
            "mysql" | "mariadb" => Ok(DbmsType::MySql),
            "postgresql" | "postgres" => Ok(DbmsType::PostgreSql),
            "sqlite" => Ok(DbmsType::Sqlite),
            other => Err(format!("unknown dbms type '{}'", other)),
        }
    }
}
