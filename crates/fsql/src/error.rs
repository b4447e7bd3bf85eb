//! Error types for fsql

use thiserror::Error;

/// Result type alias for fsql operations
pub type FsqlResult<T> = Result<T, FsqlError>;

/// Error types for rendering and execution.
///
/// A document that is absent or not a JSON object is never an error: rendering
/// short-circuits and returns the template unchanged.
#[derive(Debug, Error)]
pub enum FsqlError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement compile or execution failure reported by tokio-postgres
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Statement compile or execution failure reported by another engine
    #[error("Engine error: {0}")]
    Engine(String),

    /// Statement cache could not be allocated
    #[error("Resource error: {0}")]
    Resource(String),

    /// Result column could not be converted to a JSON value
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Nested rendering did not settle within the configured number of passes
    #[error("Template nesting exceeded max depth of {0}")]
    DepthExceeded(usize),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl FsqlError {
    /// Create an engine failure carrying the engine's diagnostic message.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from compiling or executing a statement.
    ///
    /// Resource failures are reported as engine failures as well.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Self::Query(_) | Self::Engine(_) | Self::Resource(_))
    }

    /// Check if this is a depth-exceeded error
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, Self::DepthExceeded(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for FsqlError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
