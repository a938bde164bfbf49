//! Event output for one session

use super::SessionError;
use crate::protocol::{self, Envelope, Event, SessionId};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Stamps events with the session id and sends them as JSON text
#[derive(Debug, Clone)]
pub struct EventEmitter {
    session: SessionId,
    tx: UnboundedSender<String>,
}

impl EventEmitter {
    pub fn new(session: SessionId, tx: UnboundedSender<String>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn emit(&self, event: Event) -> Result<(), SessionError> {
        let name = event.name();
        let text = protocol::encode(&Envelope {
            session: self.session,
            event,
        })?;
        self.tx.send(text).map_err(|_| SessionError::ChannelClosed)?;
        debug!(session = %self.session, event = name, "event emitted");
        Ok(())
    }
}
