//! Error types for the contact cache.
//!
//! This module defines custom error types using `thiserror` for precise error handling.
//! Degraded inputs (unparsable durations, unformattable phones, partial addresses)
//! are deliberately absent here: they are recovered where they occur and never surface.

use thiserror::Error;

/// Errors surfaced by the match and retention services.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The caller passed an unusable client or context. Not recoverable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A rule set is structurally malformed (missing keys, unknown bits).
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// The event store could not answer. Callers decide fail-open vs fail-closed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CacheError {
    /// Whether retrying the same call may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, CacheError::Store(_))
    }
}

/// Errors raised by the event store or its connection pools.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No connection could be checked out of a pool
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// The statement failed on the server
    #[error("Query failed: {0}")]
    Query(String),

    /// The statement or checkout timed out
    #[error("Store timeout")]
    Timeout,

    /// The store is not reachable or not configured
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Query(err.to_string())
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        match err {
            deadpool_postgres::PoolError::Timeout(_) => StoreError::Timeout,
            deadpool_postgres::PoolError::Backend(e) => StoreError::from(e),
            other => StoreError::Pool(other.to_string()),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Other(String),
}

/// Convenience type alias for Results with CacheError
pub type CacheResult<T> = Result<T, CacheError>;

/// Convenience type alias for Results with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
