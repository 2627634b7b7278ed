//! Error types for report I/O

use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Write error: {message}")]
    WriteError { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report I/O
pub type IoResult<T> = std::result::Result<T, IoError>;
