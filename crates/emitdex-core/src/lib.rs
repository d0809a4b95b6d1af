//! Emitdex Core Components
//!
//! This crate wires the event index engine to a workspace: configuration
//! loading, the engine/scheduler lifecycle, and core error types.

mod config;
mod error;
mod workspace;

pub use config::EmitdexConfig;
pub use error::CoreError;
pub use workspace::Workspace;
