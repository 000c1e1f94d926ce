//! Custom error types for sqlcrew
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for sqlcrew operations
#[derive(Error, Debug)]
pub enum CrewError {
    /// Missing or unusable configuration (credentials, arguments, limits)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion backend could not be reached or failed server-side
    #[error("Completion backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The completion backend refused the request
    #[error("Completion backend rejected the request: {0}")]
    BackendRejected(String),

    /// A reply did not contain the agreed delimiter exactly once
    #[error("Malformed response: expected delimiter '{delimiter}' exactly once, found {occurrences}")]
    MalformedResponse {
        delimiter: String,
        occurrences: usize,
    },

    /// A capability request named something that is not registered
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// A capability request's arguments do not satisfy the declared schema
    #[error("Invalid arguments for '{capability}': {reason}")]
    InvalidArguments { capability: String, reason: String },

    /// A query failed inside the database
    #[error("Query error: {0}")]
    Query(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database driver errors outside of query execution
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for sqlcrew operations
pub type Result<T> = std::result::Result<T, CrewError>;

impl CrewError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a backend-unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create a backend-rejected error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::BackendRejected(msg.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create an invalid-arguments error
    pub fn invalid_arguments(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Whether the conversation can carry on after this error by showing it
    /// to the agents instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownCapability(_) | Self::InvalidArguments { .. } | Self::Query(_)
        )
    }
}
