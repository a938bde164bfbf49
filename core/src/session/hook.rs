//! The session's line hook
//!
//! At every line boundary: snapshot the frame, emit `line_executed`, and
//! let the VM pause. A failure in either step is a `TraceCaptureError`,
//! after which the VM drops the hook.

use super::emitter::EventEmitter;
use super::snapshot::{self, SnapshotLimits};
use crate::interpreter::executor::{FrameView, LineHook, TraceCaptureError};
use crate::protocol::Event;
use tracing::trace;

pub struct TraceHook {
    emitter: EventEmitter,
    limits: SnapshotLimits,
}

impl TraceHook {
    pub fn new(emitter: EventEmitter, limits: SnapshotLimits) -> Self {
        Self { emitter, limits }
    }
}

impl LineHook for TraceHook {
    fn on_line(&mut self, frame: &FrameView<'_>) -> Result<(), TraceCaptureError> {
        trace!(
            line = frame.line,
            function = frame.function,
            depth = frame.depth,
            "capturing line snapshot"
        );
        let variables = snapshot::capture(frame, self.limits)?;
        self.emitter
            .emit(Event::LineExecuted {
                line: frame.line,
                variables,
            })
            .map_err(|err| TraceCaptureError(format!("failed to emit line event: {}", err)))
    }
}
