//! Error types for eorm

use thiserror::Error;

/// Result type alias for eorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed error reported by a [`Session`](crate::Session) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for query construction, execution and row mapping.
///
/// `Mapping`, `Compile` and `Validation` are produced before anything reaches the session,
/// so a statement failing with one of them never has side effects.
#[derive(Debug, Error)]
pub enum OrmError {
    /// The entity type cannot be described as a table.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// A predicate or column reference does not resolve against the target table.
    #[error("compile error: {0}")]
    Compile(String),

    /// The builder was given insufficient input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The session reported a failure while executing a statement.
    ///
    /// `statement` describes the shape (`"SELECT users"`), never the SQL text or its values.
    #[error("execution error ({statement}): {source}")]
    Execution {
        statement: String,
        #[source]
        source: BoxError,
    },

    /// A result row does not fit the target entity.
    #[error("scan error on column '{column}': {message}")]
    Scan { column: String, message: String },

    /// `Selector::get` matched no row.
    #[error("no rows in result set")]
    NoRows,

    /// The context was cancelled before the statement completed.
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed before the statement completed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("pool error: {0}")]
    Pool(String),
}

/// A result value a [`RowStream`](crate::RowStream) could not decode.
///
/// Returned from `next_row`, it surfaces as [`OrmError::Scan`] instead of an execution error.
#[derive(Debug, Error)]
#[error("cannot decode column '{column}': {message}")]
pub struct DecodeError {
    pub column: String,
    pub message: String,
}

impl DecodeError {
    pub fn new(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            message: message.into(),
        }
    }
}

impl OrmError {
    /// Create a mapping error
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }

    /// Create a compile error
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a scan error for a specific column
    pub fn scan(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap a session error with the shape of the statement that caused it.
    pub fn execution(statement: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Execution {
            statement: statement.into(),
            source: source.into(),
        }
    }

    /// Classify an error raised while reading rows: decode failures are scan errors.
    pub(crate) fn from_row_error(statement: &str, source: BoxError) -> Self {
        match source.downcast::<DecodeError>() {
            Ok(decode) => {
                let DecodeError { column, message } = *decode;
                Self::Scan { column, message }
            }
            Err(source) => Self::execution(statement, source),
        }
    }

    /// Check if this is the no-rows sentinel
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    /// Check if the context was cancelled or its deadline passed
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled | Self::DeadlineExceeded)
    }

    /// Check if the error was raised before any I/O happened
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            Self::Mapping(_) | Self::Compile(_) | Self::Validation(_)
        )
    }

    /// The unchanged error reported by the session, if this is an execution error.
    pub fn driver_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Execution { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// The underlying `tokio_postgres` error, if the session was a PostgreSQL one.
    pub fn as_db_error(&self) -> Option<&tokio_postgres::Error> {
        self.driver_error()?.downcast_ref::<tokio_postgres::Error>()
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
