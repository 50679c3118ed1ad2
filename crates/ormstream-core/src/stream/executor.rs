//! Query execution seam.

use crate::error::Result;
use crate::sql::SqlQuery;
use parking_lot::Mutex;

/// Runs rendered statements against a database.
///
/// Implementations own the connection handling and row decoding; streams
/// only hand them parameterized SQL.
pub trait QueryExecutor<E>: Send + Sync {
    /// Run a row query and decode every returned row.
    fn query(&self, query: &SqlQuery) -> Result<Vec<E>>;

    /// Run a `SELECT COUNT(*)` query.
    fn count(&self, query: &SqlQuery) -> Result<u64>;
}

/// Executor that records statements and answers with canned rows.
///
/// Useful for dry runs and tests: every query returns a copy of the
/// configured rows and every count query returns the configured count.
#[derive(Debug, Default)]
pub struct RecordingExecutor<E> {
    rows: Vec<E>,
    count: u64,
    log: Mutex<Vec<SqlQuery>>,
}

impl<E> RecordingExecutor<E> {
    /// Executor answering row queries with `rows`.
    pub fn new(rows: Vec<E>) -> Self {
        let count = rows.len() as u64;
        Self {
            rows,
            count,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Override the answer to count queries.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    /// Statements executed so far, oldest first.
    pub fn queries(&self) -> Vec<SqlQuery> {
        self.log.lock().clone()
    }

    /// The most recent statement.
    pub fn last_query(&self) -> Option<SqlQuery> {
        self.log.lock().last().cloned()
    }
}

impl<E: Clone + Send + Sync> QueryExecutor<E> for RecordingExecutor<E> {
    fn query(&self, query: &SqlQuery) -> Result<Vec<E>> {
        self.log.lock().push(query.clone());
        Ok(self.rows.clone())
    }

    fn count(&self, query: &SqlQuery) -> Result<u64> {
        self.log.lock().push(query.clone());
        Ok(self.count)
    }
}
