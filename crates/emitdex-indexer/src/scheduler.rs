//! Periodic re-scan driver.
//!
//! Two independent cycles run on their own timers: event re-scan and
//! variable-definition re-scan. Each cycle goes through a [`CycleGate`], an
//! `Idle -> Scanning -> Idle` state machine; a trigger that arrives while
//! the cycle is Scanning is dropped, never queued.

use crate::engine::{EventEngine, ScanReport, VariableReport};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// State of one scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Scanning,
}

/// Single-slot admission for a scan cycle.
#[derive(Debug)]
pub struct CycleGate {
    name: &'static str,
    state: Mutex<CycleState>,
}

impl CycleGate {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(CycleState::Idle),
        }
    }

    pub fn state(&self) -> CycleState {
        *self.state.lock()
    }

    /// Move to Scanning, or return `None` if already Scanning.
    pub fn try_begin(&self) -> Option<CycleGuard<'_>> {
        let mut state = self.state.lock();
        match *state {
            CycleState::Scanning => {
                debug!(cycle = self.name, "Cycle in flight, trigger dropped");
                None
            }
            CycleState::Idle => {
                *state = CycleState::Scanning;
                Some(CycleGuard { gate: self })
            }
        }
    }
}

/// Returns its gate to Idle when dropped.
#[derive(Debug)]
pub struct CycleGuard<'a> {
    gate: &'a CycleGate,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *self.gate.state.lock() = CycleState::Idle;
    }
}

/// Timer periods for the two cycles.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub event_interval: Duration,
    pub variable_interval: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            event_interval: Duration::from_millis(1000),
            variable_interval: Duration::from_millis(2000),
        }
    }
}

/// Outcome of a completed cycle, broadcast to subscribers.
#[derive(Debug, Clone)]
pub enum CycleReport {
    Events(ScanReport),
    Variables(VariableReport),
}

#[derive(Debug, Clone, Copy)]
enum CycleKind {
    Events,
    Variables,
}

/// Starts the periodic cycles for an engine.
pub struct Scheduler;

impl Scheduler {
    /// Spawn both cycle tasks. The first tick of each fires immediately.
    pub fn start(engine: Arc<EventEngine>, options: SchedulerOptions) -> SchedulerHandle {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (reports_tx, _) = broadcast::channel(64);

        let tasks = vec![
            tokio::spawn(run_cycle(
                CycleKind::Variables,
                engine.clone(),
                options.variable_interval,
                shutdown_tx.subscribe(),
                reports_tx.clone(),
            )),
            tokio::spawn(run_cycle(
                CycleKind::Events,
                engine.clone(),
                options.event_interval,
                shutdown_tx.subscribe(),
                reports_tx.clone(),
            )),
        ];

        info!(
            event_interval_ms = options.event_interval.as_millis() as u64,
            variable_interval_ms = options.variable_interval.as_millis() as u64,
            "Scheduler started"
        );

        SchedulerHandle {
            engine,
            shutdown_tx,
            reports_tx,
            tasks,
        }
    }
}

/// Handle to running cycles.
pub struct SchedulerHandle {
    engine: Arc<EventEngine>,
    shutdown_tx: broadcast::Sender<()>,
    reports_tx: broadcast::Sender<CycleReport>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn engine(&self) -> &Arc<EventEngine> {
        &self.engine
    }

    /// Receive a report after every completed cycle.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.reports_tx.subscribe()
    }

    /// Cancel the timers and wait for the tasks to exit. A cycle that is
    /// already running finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());

        for task in self.tasks {
            if let Err(e) = task.await {
                debug!(error = %e, "Scheduler task ended abnormally");
            }
        }

        info!("Scheduler stopped");
    }
}

async fn run_cycle(
    kind: CycleKind,
    engine: Arc<EventEngine>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    reports: broadcast::Sender<CycleReport>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => break,
            _ = ticker.tick() => {
                let report = match kind {
                    CycleKind::Events => engine.scan_events().await.map(CycleReport::Events),
                    CycleKind::Variables => {
                        engine.refresh_variables().await.map(CycleReport::Variables)
                    }
                };

                if let Some(report) = report {
                    // No subscribers is fine
                    let _ = reports.send(report);
                }
            }
        }
    }

    debug!(cycle = ?kind, "Cycle task exiting");
}
