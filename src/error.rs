//! Error types for the Feedsift relevance filter
//!
//! The classifier and decision engine are total and never return errors.
//! Everything here belongs to the outer layers: persistence, configuration
//! and the request/response transport.

use thiserror::Error;

/// Main error type for Feedsift operations
#[derive(Error, Debug)]
pub enum FeedsiftError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Store-level failure that is not a raw database error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Settings failed validation (threshold outside 0..=100)
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Rating value other than +1 / -1, or a rating request without one
    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request/response channel closed or dropped a reply
    #[error("Channel error: {0}")]
    Channel(String),

    /// Request did not get a response in time
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Feedsift operations
pub type Result<T> = std::result::Result<T, FeedsiftError>;

/// Convert anyhow::Error to FeedsiftError
impl From<anyhow::Error> for FeedsiftError {
    fn from(err: anyhow::Error) -> Self {
        FeedsiftError::Other(err.to_string())
    }
}

impl From<rusqlite::Error> for FeedsiftError {
    fn from(err: rusqlite::Error) -> Self {
        FeedsiftError::Database(err.to_string())
    }
}
