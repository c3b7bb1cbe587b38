//! Error types for the weeksync engine.

use thiserror::Error;

/// Errors that can occur in weeksync operations.
#[derive(Error, Debug)]
pub enum WeekSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Time resolution error: {0}")]
    Time(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for weeksync operations.
pub type WeekSyncResult<T> = Result<T, WeekSyncError>;
