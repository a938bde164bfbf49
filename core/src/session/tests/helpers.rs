//! Test helpers for session tests

use crate::config::InterpreterConfig;
use crate::interpreter::{ConfiguredLoader, LoadError, RuntimeLoader, ScriptRuntime};
use crate::protocol::{self, Envelope, Event, SessionId};
use crate::session::{EventEmitter, SessionOptions, SnapshotLimits, TracedSession};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Loader that counts how often it is asked to bootstrap
#[derive(Default)]
pub struct CountingLoader {
    pub loads: AtomicUsize,
}

impl RuntimeLoader for CountingLoader {
    fn load(&self) -> Result<ScriptRuntime, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        ScriptRuntime::bootstrap(&InterpreterConfig::default())
    }
}

/// Loader whose bootstrap always fails
pub struct FailingLoader;

impl RuntimeLoader for FailingLoader {
    fn load(&self) -> Result<ScriptRuntime, LoadError> {
        Err(LoadError::Bootstrap("runtime image unavailable".into()))
    }
}

pub fn session_with(
    loader: Arc<dyn RuntimeLoader>,
    options: SessionOptions,
) -> (TracedSession, UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let emitter = EventEmitter::new(SessionId::new(), tx);
    (TracedSession::new(emitter, loader, options), rx)
}

pub fn default_session() -> (TracedSession, UnboundedReceiver<String>) {
    session_with(Arc::new(ConfiguredLoader::default()), SessionOptions::default())
}

pub fn limited_session(limits: SnapshotLimits) -> (TracedSession, UnboundedReceiver<String>) {
    session_with(
        Arc::new(ConfiguredLoader::default()),
        SessionOptions {
            snapshot: limits,
            ..SessionOptions::default()
        },
    )
}

/// Decode every event emitted so far
pub fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(text) = rx.try_recv() {
        let envelope: Envelope = protocol::decode(&text).expect("valid envelope");
        events.push(envelope.event);
    }
    events
}

/// Drain events, dropping interpreter lifecycle output
pub fn drain_program_events(rx: &mut UnboundedReceiver<String>) -> Vec<Event> {
    drain(rx)
        .into_iter()
        .filter(|e| !matches!(e, Event::Output { text } if text.starts_with("Worker: ")))
        .collect()
}

pub fn output(text: &str) -> Event {
    Event::Output {
        text: text.to_string(),
    }
}
