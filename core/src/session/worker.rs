//! Session worker task
//!
//! Each worker is a tokio task owning one `TracedSession`. The host talks
//! to it only through two unbounded channels of JSON text; nothing else is
//! shared. Dropping or aborting the handle tears the worker down.

use super::traced::{SessionOptions, TracedSession};
use super::{EventEmitter, SessionError};
use crate::interpreter::RuntimeLoader;
use crate::protocol::{self, Command, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

/// Host-side handle to a running worker
#[derive(Debug)]
pub struct WorkerHandle {
    id: SessionId,
    commands: UnboundedSender<String>,
    events: UnboundedReceiver<String>,
    task: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Assemble a handle from raw channel ends (no task attached)
    pub fn from_parts(
        id: SessionId,
        commands: UnboundedSender<String>,
        events: UnboundedReceiver<String>,
    ) -> Self {
        Self {
            id,
            commands,
            events,
            task: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn send(&self, command: &Command) -> Result<(), SessionError> {
        let text = protocol::encode(command)?;
        debug!(session = %self.id, command = command.name(), "sending command");
        self.send_raw(text)
    }

    pub fn send_raw(&self, text: String) -> Result<(), SessionError> {
        self.commands.send(text).map_err(|_| SessionError::ChannelClosed)
    }

    /// Next raw message from the worker; `None` once the worker is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.events.recv().await
    }

    /// Stop the worker task immediately, discarding any in-flight command
    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Spawn a fresh worker with a new session id
pub fn spawn_worker(loader: Arc<dyn RuntimeLoader>, options: SessionOptions) -> WorkerHandle {
    let id = SessionId::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let session = TracedSession::new(EventEmitter::new(id, event_tx), loader, options);
    let task = tokio::spawn(
        run_worker(session, command_rx).instrument(info_span!("session", session = %id)),
    );

    WorkerHandle {
        id,
        commands: command_tx,
        events: event_rx,
        task: Some(task),
    }
}

async fn run_worker(mut session: TracedSession, mut commands: UnboundedReceiver<String>) {
    info!("session worker started");

    while let Some(text) = commands.recv().await {
        let command: Command = match protocol::decode(&text) {
            Ok(command) => command,
            Err(err) => {
                warn!(error = %err, "rejecting malformed command");
                session.report(&SessionError::Wire(err));
                continue;
            }
        };

        debug!(command = command.name(), "command received");
        if let Err(err) = session.handle(command).await {
            session.report(&err);
        }
    }

    info!("command channel closed, session worker exiting");
}
