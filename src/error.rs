//! Error types for the writegate crate.

use std::time::Duration;
use thiserror::Error;

/// Main error type for writegate operations.
#[derive(Error, Debug)]
pub enum WritegateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable store errors
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Durable store round trip exceeded the configured timeout
    #[error("Store timed out after {0:?}")]
    StoreTimeout(Duration),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for writegate operations.
pub type Result<T> = std::result::Result<T, WritegateError>;
