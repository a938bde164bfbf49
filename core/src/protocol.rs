//! Messages exchanged between the controller and a session worker
//!
//! Both directions cross the worker boundary as JSON text. Commands are
//! tagged by a `command` field, events by a `type` field, and every event
//! travels inside an envelope naming the session that emitted it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/* ===================== Controller → Session ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Bootstrap the interpreter (idempotent)
    Initialize,
    /// Begin a new run of `source`, replacing any previous run
    StartExecution { source: String },
    /// Advance the current run by one line
    ContinueExecution,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize => "initialize",
            Command::StartExecution { .. } => "start_execution",
            Command::ContinueExecution => "continue_execution",
        }
    }
}

/* ===================== Session → Controller ===================== */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Bootstrap finished; controls may be enabled
    Ready,
    LoadFailed {
        message: String,
    },
    Output {
        text: String,
    },
    /// Paused before executing `line`
    LineExecuted {
        line: u32,
        variables: BTreeMap<String, String>,
    },
    ProgramEnd,
    Error {
        message: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Ready => "ready",
            Event::LoadFailed { .. } => "load_failed",
            Event::Output { .. } => "output",
            Event::LineExecuted { .. } => "line_executed",
            Event::ProgramEnd => "program_end",
            Event::Error { .. } => "error",
        }
    }

    /// Whether this event answers an outstanding start/continue request
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Event::LineExecuted { .. } | Event::ProgramEnd | Event::Error { .. }
        )
    }
}

/// Identity of one session worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An event stamped with the session that emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub session: SessionId,
    pub event: Event,
}

/* ===================== Wire Codec ===================== */

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, WireError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, WireError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use serde_json::json;

    #[test]
    fn test_command_wire_names() {
        let start = Command::StartExecution {
            source: "x = 1".into(),
        };
        assert_eq!(
            serde_json::to_value(&start).unwrap(),
            json!({"command": "start_execution", "source": "x = 1"})
        );
        assert_eq!(
            serde_json::to_value(Command::ContinueExecution).unwrap(),
            json!({"command": "continue_execution"})
        );
        assert_eq!(
            decode::<Command>(r#"{"command":"initialize"}"#).unwrap(),
            Command::Initialize
        );
    }

    #[test]
    fn test_event_wire_names() {
        let paused = Event::LineExecuted {
            line: 2,
            variables: btreemap! { "x".to_string() => "1".to_string() },
        };
        assert_eq!(
            serde_json::to_value(&paused).unwrap(),
            json!({"type": "line_executed", "line": 2, "variables": {"x": "1"}})
        );
        assert_eq!(
            serde_json::to_value(Event::ProgramEnd).unwrap(),
            json!({"type": "program_end"})
        );
    }

    #[test]
    fn test_envelope_carries_session_id() {
        let session = SessionId::new();
        let text = encode(&Envelope {
            session,
            event: Event::Output { text: "2".into() },
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["session"], json!(session.to_string()));
        assert_eq!(value["event"], json!({"type": "output", "text": "2"}));

        let back: Envelope = decode(&text).unwrap();
        assert_eq!(back.session, session);
    }

    #[test]
    fn test_unknown_command_is_malformed() {
        let err = decode::<Command>(r#"{"command":"explode"}"#).unwrap_err();
        assert!(err.to_string().starts_with("malformed message:"));
        assert!(decode::<Command>("not json").is_err());
    }

    #[test]
    fn test_responses() {
        assert!(Event::ProgramEnd.is_response());
        assert!(Event::Error { message: "x".into() }.is_response());
        assert!(!Event::Ready.is_response());
        assert!(!Event::Output { text: "x".into() }.is_response());
    }
}
