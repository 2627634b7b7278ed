//! Error types for treevol

use thiserror::Error;

/// Main error type for treevol operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
