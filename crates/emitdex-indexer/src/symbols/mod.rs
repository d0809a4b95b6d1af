//! Hierarchical document outlines.
//!
//! The variable index only needs a symbol tree (name, source range,
//! children) and the text the ranges point into. Hosts that already have an
//! outline can hand it over through [`StaticSymbolProvider`]; otherwise
//! [`TreeSitterSymbolProvider`] builds one from TypeScript/JavaScript source.

mod typescript;

pub use typescript::{outline, Dialect, TreeSitterSymbolProvider};

use crate::IndexerError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Kind of outline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Constant,
    Variable,
    Property,
    Enum,
    EnumMember,
    Namespace,
}

/// One node of a document outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Byte range into the document text
    pub range: Range<usize>,
    pub children: Vec<DocumentSymbol>,
}

impl DocumentSymbol {
    pub fn leaf(name: impl Into<String>, kind: SymbolKind, range: Range<usize>) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Source of document outlines for definitions files.
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    /// Outline of the file at `path`.
    async fn document_symbols(&self, path: &Path) -> Result<Vec<DocumentSymbol>, IndexerError>;

    /// Text of the file at `path`, as indexed by symbol ranges.
    async fn open_document(&self, path: &Path) -> Result<String, IndexerError>;
}

/// Outlines registered up front, keyed by path.
#[derive(Debug, Default)]
pub struct StaticSymbolProvider {
    documents: RwLock<HashMap<PathBuf, (String, Vec<DocumentSymbol>)>>,
}

impl StaticSymbolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the text and outline of `path`.
    pub fn insert(
        &self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
        symbols: Vec<DocumentSymbol>,
    ) {
        self.documents
            .write()
            .insert(path.into(), (text.into(), symbols));
    }

    fn missing(path: &Path) -> IndexerError {
        IndexerError::SymbolProvider {
            path: path.to_path_buf(),
            message: "no outline registered".to_string(),
        }
    }
}

#[async_trait]
impl SymbolProvider for StaticSymbolProvider {
    async fn document_symbols(&self, path: &Path) -> Result<Vec<DocumentSymbol>, IndexerError> {
        self.documents
            .read()
            .get(path)
            .map(|(_, symbols)| symbols.clone())
            .ok_or_else(|| Self::missing(path))
    }

    async fn open_document(&self, path: &Path) -> Result<String, IndexerError> {
        self.documents
            .read()
            .get(path)
            .map(|(text, _)| text.clone())
            .ok_or_else(|| Self::missing(path))
    }
}
