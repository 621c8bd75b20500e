//! Error types for product ingestion.

use std::path::PathBuf;

use aec_model::AecError;
use thiserror::Error;

/// Errors that can occur while loading product records.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Product file not found.
    #[error("product file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// Input is not valid JSON.
    #[error("failed to parse product JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON is valid but neither a product list nor a page object.
    #[error("unsupported product payload: expected an array or an object with `results`, found {found}")]
    UnsupportedPayload { found: String },

    /// CSV table could not be parsed.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// A product entry is not a JSON object.
    #[error("product at index {index} is not an object")]
    InvalidProduct {
        index: usize,
        #[source]
        source: AecError,
    },

    // === Paging Errors ===
    /// The page source failed to deliver a page.
    #[error("failed to fetch page {page}: {message}")]
    PageFetch { page: usize, message: String },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
