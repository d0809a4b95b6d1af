//! One indexed workspace.
//!
//! Owns the engine for a workspace root and, while watching, the scheduler
//! driving it.

use crate::{CoreError, EmitdexConfig};
use emitdex_indexer::{CycleReport, EventEngine, Scheduler, SchedulerHandle, ScanReport, VariableReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// An indexed workspace
pub struct Workspace {
    /// Canonical workspace root
    pub root: PathBuf,
    config: EmitdexConfig,
    engine: Arc<EventEngine>,
    scheduler: Option<SchedulerHandle>,
}

impl Workspace {
    /// Open a workspace rooted at `path`
    pub fn open(path: &Path, config: EmitdexConfig) -> Result<Self, CoreError> {
        let root = path
            .canonicalize()
            .map_err(|_| CoreError::InvalidPath(path.display().to_string()))?;

        if !root.is_dir() {
            return Err(CoreError::InvalidPath(root.display().to_string()));
        }

        let engine = Arc::new(EventEngine::new(config.engine_options(&root)));

        tracing::debug!(root = ?root, "Workspace opened");

        Ok(Self {
            root,
            config,
            engine,
            scheduler: None,
        })
    }

    pub fn engine(&self) -> &Arc<EventEngine> {
        &self.engine
    }

    pub fn config(&self) -> &EmitdexConfig {
        &self.config
    }

    /// Run one variable cycle followed by one event cycle.
    ///
    /// Either report is `None` if that cycle was already running.
    pub async fn refresh(&self) -> (Option<VariableReport>, Option<ScanReport>) {
        let variables = self.engine.refresh_variables().await;
        let events = self.engine.scan_events().await;
        (variables, events)
    }

    /// Start the periodic cycles, if not already running
    pub fn start_watching(&mut self) -> broadcast::Receiver<CycleReport> {
        let handle = self.scheduler.get_or_insert_with(|| {
            Scheduler::start(self.engine.clone(), self.config.scheduler_options())
        });
        handle.subscribe()
    }

    pub fn is_watching(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Stop the periodic cycles and wait for an in-flight cycle to finish
    pub async fn stop_watching(&mut self) {
        if let Some(handle) = self.scheduler.take() {
            handle.stop().await;
        }
    }
}
