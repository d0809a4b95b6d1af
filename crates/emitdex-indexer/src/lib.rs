//! Emitdex Indexer
//!
//! This crate provides the event index engine for emitdex, including:
//! - Workspace enumeration with gitignore support and size fingerprints
//! - Line-based recognition of `emit` calls and their direction
//! - Variable resolution from symbol outlines of definitions files
//! - Periodic, non-overlapping re-scan cycles
//! - Completion helpers for event names and handler parameters

pub mod completion;
pub mod engine;
mod error;
pub mod index;
pub mod scanner;
pub mod scheduler;
pub mod symbols;
pub mod variables;

pub use completion::{CompletionItem, CompletionKind};
pub use engine::{
    DefinitionOutcome, EngineOptions, EventEngine, FileOutcome, ScanReport, VariableReport,
    DEFAULT_CLIENT_MARKER, DEFAULT_DEFINITION_PATTERNS, DEFAULT_EXCLUDE, DEFAULT_EXTENSIONS,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_SERVER_MARKER,
};
pub use error::IndexerError;
pub use index::{EventIndex, EventRecord, ParamSuggestion};
pub use scanner::{Direction, PathSide};
pub use scheduler::{CycleReport, Scheduler, SchedulerHandle, SchedulerOptions};
pub use symbols::{DocumentSymbol, StaticSymbolProvider, SymbolKind, SymbolProvider, TreeSitterSymbolProvider};
pub use variables::VariableIndex;
