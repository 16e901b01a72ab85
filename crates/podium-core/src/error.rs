//! Error types for the Podium pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Extraction failed for document {document_id}: {reason}")]
    Extraction {
        document_id: String,
        reason: String,
    },

    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding model version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },

    #[error("Generation backend unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Index/store drift: {0}")]
    StoreDrift(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {elapsed_ms}ms in {operation}")]
    Timeout {
        operation: &'static str,
        elapsed_ms: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
