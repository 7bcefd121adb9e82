//! Error types for fitadmin-core

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Result type alias using fitadmin-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fitadmin-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Form values rejected before submission
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
