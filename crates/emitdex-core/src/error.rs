//! Core error types for emitdex.

use emitdex_indexer::IndexerError;
use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Invalid config {path}: {message}")]
    Config { path: String, message: String },

    /// Invalid workspace path
    #[error("Invalid workspace path: {0}")]
    InvalidPath(String),

    /// Indexer error
    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),
}
