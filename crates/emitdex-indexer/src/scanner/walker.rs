//! File system walker with glob include/exclude support.

use crate::IndexerError;
use ignore::overrides::{Override, OverrideBuilder};
use ignore::{WalkBuilder, WalkState};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, warn};

/// A discovered file entry.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Build the include glob for each supported extension, in order.
pub fn extension_patterns(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| format!("**/*.{}", ext.trim_start_matches('.')))
        .collect()
}

/// File system walker that lists files matching include globs.
pub struct Walker {
    root: PathBuf,
    excludes: Vec<String>,
    respect_gitignore: bool,
}

impl Walker {
    /// Create a new walker for the given root directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            excludes: Vec::new(),
            respect_gitignore: true,
        }
    }

    /// Exclude paths matching these globs (e.g. `**/node_modules/**`).
    pub fn with_excludes(mut self, excludes: &[String]) -> Self {
        self.excludes = excludes.to_vec();
        self
    }

    /// Whether `.gitignore` rules prune the walk.
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    fn pattern_error(pattern: &str, e: ignore::Error) -> IndexerError {
        IndexerError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }
    }

    /// Matcher for a single include glob.
    fn include_matcher(&self, include: &str) -> Result<Override, IndexerError> {
        let mut builder = OverrideBuilder::new(&self.root);
        builder
            .add(include)
            .map_err(|e| Self::pattern_error(include, e))?;
        builder
            .build()
            .map_err(|e| Self::pattern_error(include, e))
    }

    /// Ignore-only overrides for the exclude globs.
    fn exclude_overrides(&self) -> Result<Override, IndexerError> {
        let mut builder = OverrideBuilder::new(&self.root);

        for exclude in &self.excludes {
            builder
                .add(&format!("!{}", exclude))
                .map_err(|e| Self::pattern_error(exclude, e))?;

            // `dir/**` only matches the children; also match the directory
            // itself so the walk never descends into it.
            if let Some(dir) = exclude.strip_suffix("/**") {
                builder
                    .add(&format!("!{}", dir))
                    .map_err(|e| Self::pattern_error(exclude, e))?;
            }
        }

        builder.build().map_err(|e| IndexerError::Walk(e.to_string()))
    }

    /// Walk the directory tree and return all files matching `include`.
    pub fn walk(&self, include: &str) -> Result<Vec<FileEntry>, IndexerError> {
        let matcher = self.include_matcher(include)?;
        self.walk_matching(&[matcher])
    }

    /// Walk once and return files matching any of `includes`.
    ///
    /// Files come back grouped by the first pattern they match, in pattern
    /// order, then path order. A pattern that fails to compile is logged and
    /// skipped; the others still apply.
    pub fn walk_all(&self, includes: &[String]) -> Vec<FileEntry> {
        let matchers: Vec<Override> = includes
            .iter()
            .filter_map(|include| match self.include_matcher(include) {
                Ok(matcher) => Some(matcher),
                Err(e) => {
                    warn!(pattern = %include, error = %e, "Skipping include pattern");
                    None
                }
            })
            .collect();

        if matchers.is_empty() {
            return Vec::new();
        }

        match self.walk_matching(&matchers) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = ?self.root, error = %e, "Enumeration failed");
                Vec::new()
            }
        }
    }

    fn walk_matching(&self, matchers: &[Override]) -> Result<Vec<FileEntry>, IndexerError> {
        if !self.root.is_dir() {
            return Err(IndexerError::NotFound(self.root.clone()));
        }

        let overrides = self.exclude_overrides()?;
        let (tx, rx) = mpsc::channel();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true) // Skip hidden files by default
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .overrides(overrides)
            .build_parallel();

        walker.run(|| {
            let tx = tx.clone();
            Box::new(move |result| {
                match result {
                    Ok(entry) => {
                        // Only process files, not directories
                        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
                        let rank = matchers
                            .iter()
                            .position(|m| m.matched(entry.path(), false).is_whitelist());

                        if let (true, Some(rank)) = (is_file, rank) {
                            if let Ok(metadata) = entry.metadata() {
                                let _ = tx.send((
                                    rank,
                                    FileEntry {
                                        path: entry.path().to_path_buf(),
                                        size: metadata.len(),
                                    },
                                ));
                            }
                        }
                    }
                    Err(e) => {
                        // Don't fail the entire walk for individual errors
                        debug!(error = %e, "Walk error");
                    }
                }
                WalkState::Continue
            })
        });

        // Drop our sender so the receiver knows when we're done
        drop(tx);

        let mut ranked: Vec<(usize, FileEntry)> = rx.into_iter().collect();

        // Pattern order, then path order, for deterministic output
        ranked.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.path.cmp(&b.path)));

        debug!(files = ranked.len(), patterns = matchers.len(), "Enumerated");

        Ok(ranked.into_iter().map(|(_, entry)| entry).collect())
    }
}
