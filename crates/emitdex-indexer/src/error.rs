//! Indexer error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during indexing operations.
///
/// None of these reach the query side: scan cycles log them and move on
/// to the next file.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Path not found
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Include or exclude glob could not be compiled
    #[error("Invalid pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    /// Directory walk failed
    #[error("Walk error: {0}")]
    Walk(String),

    /// Failed to parse a file with tree-sitter
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Symbol provider could not outline a definitions file
    #[error("Symbol provider failed for {}: {message}", path.display())]
    SymbolProvider { path: PathBuf, message: String },
}

impl From<ignore::Error> for IndexerError {
    fn from(e: ignore::Error) -> Self {
        IndexerError::Walk(e.to_string())
    }
}

impl From<tokio::task::JoinError> for IndexerError {
    fn from(e: tokio::task::JoinError) -> Self {
        IndexerError::Walk(e.to_string())
    }
}
