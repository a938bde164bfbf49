//! Traced Interpreter Session
//!
//! Runs one program at a time under a per-line trace hook and answers
//! every `start_execution`/`continue_execution` with exactly one pause
//! (`line_executed`) or terminal (`program_end`/`error`) event.
//!
//! ## Module Organization
//! - `traced`: the session itself (bootstrap, start, continue)
//! - `hook`: the trace hook that snapshots and reports each line
//! - `snapshot`: variable capture and display-string truncation
//! - `emitter`: enveloped, JSON-encoded event output
//! - `worker`: the tokio task that owns a session and its channels

pub mod emitter;
pub mod hook;
pub mod snapshot;
pub mod state;
pub mod traced;
pub mod worker;

#[cfg(test)]
mod tests;

use crate::interpreter::LoadError;
use crate::protocol::WireError;
use thiserror::Error;

pub use emitter::EventEmitter;
pub use hook::TraceHook;
pub use snapshot::SnapshotLimits;
pub use state::SessionState;
pub use traced::{SessionOptions, TracedSession};
pub use worker::{spawn_worker, WorkerHandle};

/// Failures the session reports back as `error` events
#[derive(Debug, Error)]
pub enum SessionError {
    /// A command arrived that the current state cannot accept
    #[error("InvalidStateError: {0}")]
    InvalidState(String),

    #[error("LoadError: {0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Wire(#[from] WireError),

    #[error("event channel closed")]
    ChannelClosed,
}
