use crate::dialect::Dialect;
use crate::meta::NamingStrategy;
use std::time::Duration;

/// Configuration of a [`Db`](crate::Db) handle.
///
/// Defaults: PostgreSQL dialect, snake_case naming, SQL logging on (truncated to 200 chars),
/// no slow-query threshold.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Dialect statements are rendered for.
    pub dialect: Dialect,
    /// Field/type name to column/table name transform.
    pub naming: NamingStrategy,
    /// Statements slower than this emit a warning.
    pub slow_query_threshold: Option<Duration>,
    /// Emit a debug event for every dispatched statement.
    pub log_sql: bool,
    /// Truncate logged SQL (in chars). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            naming: NamingStrategy::default(),
            slow_query_threshold: None,
            log_sql: true,
            max_sql_length: Some(200),
        }
    }
}

impl DbConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}
