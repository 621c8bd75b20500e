//! Error types for output generation.

use std::path::PathBuf;

use aec_model::AecError;
use thiserror::Error;

/// Errors raised while writing outputs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OutputError {
    // === File System ===
    #[error("failed to create {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Encoding ===
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    // === Table Shape ===
    #[error(transparent)]
    Model(#[from] AecError),
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
