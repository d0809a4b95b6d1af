//! The event index engine.
//!
//! An [`EventEngine`] owns everything one workspace needs: the event index,
//! the variable index and the two fingerprint caches. Several engines can
//! live side by side; nothing here is global.

use crate::index::{EventIndex, EventRecord, ParamSuggestion};
use crate::scanner::{extension_patterns, Direction, EmitParser, FileEntry, FingerprintCache, PathSide, Walker};
use crate::scheduler::CycleGate;
use crate::symbols::{SymbolProvider, TreeSitterSymbolProvider};
use crate::variables::{collect_definitions, VariableIndex};
use crate::IndexerError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extensions scanned for emit calls, in enumeration order.
pub const DEFAULT_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js", "html", "svelte"];

/// Globs never enumerated.
pub const DEFAULT_EXCLUDE: &[&str] = &["**/node_modules/**"];

/// Globs of files whose symbols feed the variable index.
pub const DEFAULT_DEFINITION_PATTERNS: &[&str] = &["**/server/index.ts"];

pub const DEFAULT_SERVER_MARKER: &str = "server";
pub const DEFAULT_CLIENT_MARKER: &str = "client";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Options for an engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Workspace root to enumerate
    pub root: PathBuf,
    /// Extensions scanned for emit calls, in enumeration order
    pub extensions: Vec<String>,
    /// Globs never enumerated (dependency folders)
    pub exclude: Vec<String>,
    /// Globs of files whose symbols feed the variable index
    pub definition_patterns: Vec<String>,
    /// Path substring marking server-side files
    pub server_marker: String,
    /// Path substring marking client-side files
    pub client_marker: String,
    /// Files larger than this are not scanned
    pub max_file_size: u64,
    /// Whether `.gitignore` rules prune enumeration
    pub respect_gitignore: bool,
}

impl EngineOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: owned(DEFAULT_EXTENSIONS),
            exclude: owned(DEFAULT_EXCLUDE),
            definition_patterns: owned(DEFAULT_DEFINITION_PATTERNS),
            server_marker: DEFAULT_SERVER_MARKER.to_string(),
            client_marker: DEFAULT_CLIENT_MARKER.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            respect_gitignore: true,
        }
    }
}

/// Summary of one event cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Files enumerated
    pub files_seen: usize,
    /// Files read and re-parsed
    pub files_scanned: usize,
    /// Files whose fingerprint had not changed
    pub files_unchanged: usize,
    /// Files skipped for size or I/O errors
    pub files_skipped: usize,
    /// Records produced by the re-parsed files
    pub records: usize,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// Summary of one variable-definition cycle.
#[derive(Debug, Clone, Serialize)]
pub struct VariableReport {
    pub files_seen: usize,
    /// Files whose outline was walked this cycle
    pub files_walked: usize,
    /// Definitions collected from the walked files
    pub definitions: usize,
    /// Size of the variable index afterwards
    pub variables: usize,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// What happened to one file during an event cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Scanned { records: usize },
    Unchanged,
    TooLarge,
}

/// What happened to one definitions file during a variable cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionOutcome {
    Walked { definitions: usize, changed: bool },
    Unchanged,
}

/// Incremental emit-call index for one workspace.
pub struct EventEngine {
    options: EngineOptions,
    index: EventIndex,
    variables: VariableIndex,
    file_fingerprints: Mutex<FingerprintCache>,
    definition_fingerprints: Mutex<FingerprintCache>,
    symbols: Arc<dyn SymbolProvider>,
    event_cycle: CycleGate,
    variable_cycle: CycleGate,
}

impl EventEngine {
    /// Create an engine that outlines definitions files with tree-sitter.
    pub fn new(options: EngineOptions) -> Self {
        Self::with_symbol_provider(options, Arc::new(TreeSitterSymbolProvider::new()))
    }

    /// Create an engine with a host-supplied symbol provider.
    pub fn with_symbol_provider(options: EngineOptions, symbols: Arc<dyn SymbolProvider>) -> Self {
        Self {
            options,
            index: EventIndex::new(),
            variables: VariableIndex::new(),
            file_fingerprints: Mutex::new(FingerprintCache::new()),
            definition_fingerprints: Mutex::new(FingerprintCache::new()),
            symbols,
            event_cycle: CycleGate::new("events"),
            variable_cycle: CycleGate::new("variables"),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn index(&self) -> &EventIndex {
        &self.index
    }

    pub fn variables(&self) -> &VariableIndex {
        &self.variables
    }

    /// Server/client side of `path` according to the configured markers.
    ///
    /// Only the part below the workspace root is matched, so the directory
    /// the workspace lives in never decides the side.
    pub fn path_side(&self, path: &Path) -> PathSide {
        let relative = path.strip_prefix(&self.options.root).unwrap_or(path);
        PathSide::detect(
            &relative.to_string_lossy(),
            &self.options.server_marker,
            &self.options.client_marker,
        )
    }

    /// Enumerate files matching `patterns` off the async runtime.
    async fn enumerate(&self, patterns: Vec<String>) -> Vec<FileEntry> {
        let walker = Walker::new(&self.options.root)
            .with_excludes(&self.options.exclude)
            .respect_gitignore(self.options.respect_gitignore);

        match tokio::task::spawn_blocking(move || walker.walk_all(&patterns)).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Enumeration task failed");
                Vec::new()
            }
        }
    }

    /// Run one event cycle over every supported file.
    ///
    /// Returns `None` without doing anything if a cycle is already running.
    pub async fn scan_events(&self) -> Option<ScanReport> {
        let _guard = self.event_cycle.try_begin()?;
        let start = Instant::now();

        let entries = self
            .enumerate(extension_patterns(&self.options.extensions))
            .await;

        let mut report = ScanReport {
            files_seen: entries.len(),
            files_scanned: 0,
            files_unchanged: 0,
            files_skipped: 0,
            records: 0,
            duration_ms: 0,
            completed_at: Utc::now(),
        };

        for entry in &entries {
            match self.index_file(&entry.path, entry.size).await {
                Ok(FileOutcome::Scanned { records }) => {
                    report.files_scanned += 1;
                    report.records += records;
                }
                Ok(FileOutcome::Unchanged) => report.files_unchanged += 1,
                Ok(FileOutcome::TooLarge) => report.files_skipped += 1,
                Err(e) => {
                    debug!(path = ?entry.path, error = %e, "Skipping file this cycle");
                    report.files_skipped += 1;
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        report.completed_at = Utc::now();

        if report.files_scanned > 0 {
            info!(
                files = report.files_seen,
                scanned = report.files_scanned,
                skipped = report.files_skipped,
                records = report.records,
                duration_ms = report.duration_ms,
                "Event scan complete"
            );
        } else {
            debug!(files = report.files_seen, "Event scan found no changes");
        }

        Some(report)
    }

    /// Re-parse one file if its size changed and swap in its records.
    ///
    /// On a read failure the fingerprint is dropped so the next cycle
    /// retries, and the previous records stay in place.
    pub async fn scan_file(&self, path: &Path) -> Result<FileOutcome, IndexerError> {
        let size = tokio::fs::metadata(path).await?.len();
        self.index_file(path, size).await
    }

    /// `scan_file` with the size already known from enumeration.
    async fn index_file(&self, path: &Path, size: u64) -> Result<FileOutcome, IndexerError> {
        if size > self.options.max_file_size {
            debug!(path = ?path, size, "Skipping large file");
            return Ok(FileOutcome::TooLarge);
        }

        if !self.file_fingerprints.lock().should_scan(path, size) {
            return Ok(FileOutcome::Unchanged);
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.file_fingerprints.lock().forget(path);
                return Err(e.into());
            }
        };
        let content = String::from_utf8_lossy(&bytes);

        let records = EmitParser::new(self.path_side(path), &self.variables).parse(&content);
        let count = records.len();
        self.index.upsert_file(path, records);

        debug!(path = ?path, records = count, "File indexed");

        Ok(FileOutcome::Scanned { records: count })
    }

    /// Run one variable cycle over every definitions file.
    ///
    /// Returns `None` without doing anything if a cycle is already running.
    /// When the cycle changes the variable table, every event fingerprint is
    /// dropped so symbolic references get another chance to resolve.
    pub async fn refresh_variables(&self) -> Option<VariableReport> {
        let _guard = self.variable_cycle.try_begin()?;
        let start = Instant::now();

        let entries = self
            .enumerate(self.options.definition_patterns.clone())
            .await;

        let mut files_walked = 0;
        let mut definitions = 0;
        let mut changed = false;

        for entry in &entries {
            match self.walk_definitions(&entry.path, entry.size).await {
                Ok(DefinitionOutcome::Walked {
                    definitions: count,
                    changed: file_changed,
                }) => {
                    files_walked += 1;
                    definitions += count;
                    changed |= file_changed;
                }
                Ok(DefinitionOutcome::Unchanged) => {}
                Err(e) => {
                    warn!(path = ?entry.path, error = %e, "Skipping definitions file this cycle");
                }
            }
        }

        if changed {
            self.file_fingerprints.lock().clear();
        }

        let report = VariableReport {
            files_seen: entries.len(),
            files_walked,
            definitions,
            variables: self.variables.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        };

        if report.files_walked > 0 {
            info!(
                files = report.files_seen,
                walked = report.files_walked,
                definitions = report.definitions,
                variables = report.variables,
                "Variable scan complete"
            );
        }

        Some(report)
    }

    /// Walk the outline of one definitions file if its size changed.
    ///
    /// Provider failures leave the fingerprint unset (retry next cycle) and
    /// keep every previously resolved variable.
    pub async fn refresh_definitions_file(
        &self,
        path: &Path,
    ) -> Result<DefinitionOutcome, IndexerError> {
        let size = tokio::fs::metadata(path).await?.len();
        self.walk_definitions(path, size).await
    }

    async fn walk_definitions(
        &self,
        path: &Path,
        size: u64,
    ) -> Result<DefinitionOutcome, IndexerError> {
        if !self.definition_fingerprints.lock().should_scan(path, size) {
            return Ok(DefinitionOutcome::Unchanged);
        }

        let outline = match self.symbols.document_symbols(path).await {
            Ok(symbols) if symbols.is_empty() => Ok(None),
            Ok(symbols) => self
                .symbols
                .open_document(path)
                .await
                .map(|text| Some((symbols, text))),
            Err(e) => Err(e),
        };

        let (symbols, text) = match outline {
            Ok(Some(outline)) => outline,
            Ok(None) => {
                return Ok(DefinitionOutcome::Walked {
                    definitions: 0,
                    changed: false,
                })
            }
            Err(e) => {
                self.definition_fingerprints.lock().forget(path);
                return Err(e);
            }
        };

        let found = collect_definitions(&symbols, &text);
        let count = found.len();
        let changed = self.variables.extend(found);

        debug!(path = ?path, definitions = count, changed, "Definitions walked");

        Ok(DefinitionOutcome::Walked {
            definitions: count,
            changed,
        })
    }

    /// Event names emitted in `direction`, in discovery order.
    pub fn query_by_direction(&self, direction: Direction) -> Vec<String> {
        self.index.query_by_direction(direction)
    }

    /// Parameter hints for events referenced on `line`.
    pub fn query_by_context(&self, line: &str) -> Vec<ParamSuggestion> {
        self.index.query_by_context(line)
    }

    pub fn records_for(&self, path: &Path) -> Option<Vec<EventRecord>> {
        self.index.records_for(path)
    }

    /// Every distinct event name in the index, sorted.
    pub fn all_event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .index
            .entries()
            .into_iter()
            .flat_map(|(_, records)| records.into_iter().map(|r| r.event_name))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn resolve(&self, name: &str) -> Option<String> {
        self.variables.resolve(name)
    }

    pub fn file_count(&self) -> usize {
        self.index.file_count()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}
