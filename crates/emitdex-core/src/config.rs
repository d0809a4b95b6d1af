//! Configuration for emitdex.

use crate::CoreError;
use emitdex_indexer::{
    EngineOptions, SchedulerOptions, DEFAULT_CLIENT_MARKER, DEFAULT_DEFINITION_PATTERNS,
    DEFAULT_EXCLUDE, DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE, DEFAULT_SERVER_MARKER,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up at the workspace root
pub const WORKSPACE_CONFIG_FILE: &str = ".emitdex.yaml";

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitdexConfig {
    /// Extensions scanned for emit calls
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Globs never enumerated
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Globs of files that define event name constants
    #[serde(default = "default_definition_patterns")]
    pub definition_patterns: Vec<String>,

    /// Path substring marking server-side files
    #[serde(default = "default_server_marker")]
    pub server_marker: String,

    /// Path substring marking client-side files
    #[serde(default = "default_client_marker")]
    pub client_marker: String,

    /// Event re-scan period in milliseconds
    #[serde(default = "default_event_scan_interval_ms")]
    pub event_scan_interval_ms: u64,

    /// Variable re-scan period in milliseconds
    #[serde(default = "default_variable_scan_interval_ms")]
    pub variable_scan_interval_ms: u64,

    /// Maximum file size to scan (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Honor .gitignore files during enumeration
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_extensions() -> Vec<String> {
    owned(DEFAULT_EXTENSIONS)
}

fn default_exclude() -> Vec<String> {
    owned(DEFAULT_EXCLUDE)
}

fn default_definition_patterns() -> Vec<String> {
    owned(DEFAULT_DEFINITION_PATTERNS)
}

fn default_server_marker() -> String {
    DEFAULT_SERVER_MARKER.to_string()
}

fn default_client_marker() -> String {
    DEFAULT_CLIENT_MARKER.to_string()
}

fn default_event_scan_interval_ms() -> u64 {
    1000
}

fn default_variable_scan_interval_ms() -> u64 {
    2000
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".emitdex").join("config.yaml"))
}

impl Default for EmitdexConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: default_exclude(),
            definition_patterns: default_definition_patterns(),
            server_marker: default_server_marker(),
            client_marker: default_client_marker(),
            event_scan_interval_ms: default_event_scan_interval_ms(),
            variable_scan_interval_ms: default_variable_scan_interval_ms(),
            max_file_size: default_max_file_size(),
            respect_gitignore: default_true(),
            log_level: default_log_level(),
        }
    }
}

impl EmitdexConfig {
    /// Load configuration for a workspace, falling back to defaults.
    ///
    /// `<workspace>/.emitdex.yaml` is tried first, then
    /// `~/.emitdex/config.yaml`. A file that fails to parse is logged and
    /// skipped.
    pub fn load(workspace: &Path) -> Self {
        let candidates = std::iter::once(workspace.join(WORKSPACE_CONFIG_FILE))
            .chain(user_config_path());

        for path in candidates {
            if !path.exists() {
                continue;
            }

            match Self::load_from(&path) {
                Ok(config) => {
                    tracing::debug!(path = ?path, "Loaded config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| CoreError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Engine options for a workspace rooted at `root`
    pub fn engine_options(&self, root: &Path) -> EngineOptions {
        EngineOptions {
            root: root.to_path_buf(),
            extensions: self.extensions.clone(),
            exclude: self.exclude.clone(),
            definition_patterns: self.definition_patterns.clone(),
            server_marker: self.server_marker.clone(),
            client_marker: self.client_marker.clone(),
            max_file_size: self.max_file_size,
            respect_gitignore: self.respect_gitignore,
        }
    }

    /// Timer periods for the scheduler
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            event_interval: Duration::from_millis(self.event_scan_interval_ms.max(1)),
            variable_interval: Duration::from_millis(self.variable_scan_interval_ms.max(1)),
        }
    }
}
