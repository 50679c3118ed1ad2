//! Stream execution settings.

use serde::{Deserialize, Serialize};

/// Controls which stages a table-backed stream may push into SQL.
///
/// Everything is enabled by default. Disabled push-downs fall back to
/// in-memory replay over a full table fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Render pushable filters into the WHERE clause.
    pub push_down_filters: bool,
    /// Render a field-based sort into ORDER BY.
    pub push_down_sort: bool,
    /// Render skip and limit into the pagination clause.
    pub push_down_limit: bool,
    /// Answer `count` with `SELECT COUNT(*)` when every stage was pushed.
    pub use_count_query: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            push_down_filters: true,
            push_down_sort: true,
            push_down_limit: true,
            use_count_query: true,
        }
    }
}

impl StreamConfig {
    /// Configuration with every push-down disabled.
    pub fn in_memory() -> Self {
        Self {
            push_down_filters: false,
            push_down_sort: false,
            push_down_limit: false,
            use_count_query: false,
        }
    }

    /// Enable or disable filter push-down.
    pub fn with_push_down_filters(mut self, enabled: bool) -> Self {
        self.push_down_filters = enabled;
        self
    }

    /// Enable or disable sort push-down.
    pub fn with_push_down_sort(mut self, enabled: bool) -> Self {
        self.push_down_sort = enabled;
        self
    }

    /// Enable or disable skip/limit push-down.
    pub fn with_push_down_limit(mut self, enabled: bool) -> Self {
        self.push_down_limit = enabled;
        self
    }

    /// Enable or disable `COUNT(*)` queries.
    pub fn with_count_query(mut self, enabled: bool) -> Self {
        self.use_count_query = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_defaults() {
        let config = StreamConfig::default().with_push_down_sort(false);
        assert!(config.push_down_filters);
        assert!(!config.push_down_sort);

        let parsed: StreamConfig = serde_json::from_str(r#"{"use_count_query": false}"#).unwrap();
        assert_eq!(parsed, StreamConfig::default().with_count_query(false));
        assert_ne!(StreamConfig::in_memory(), StreamConfig::default());
    }
}
