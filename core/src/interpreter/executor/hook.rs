//! Seams between the VM and whoever is observing it
//!
//! - `LineHook`: called at every statement boundary while installed
//! - `FrameView`: read-only view of the frame about to run a line
//! - `OutputSink`: destination of `print` output

use super::types::{Line, Val};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Destination for text written by `print`
pub type OutputSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Failure inside a line hook; the VM uninstalls the hook when it sees one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("TraceCaptureError: {0}")]
pub struct TraceCaptureError(pub String);

/// Per-line trace hook
///
/// Returning `Ok(())` suspends the VM right after the hook: `resume`
/// returns `RunOutcome::Paused` and the line runs on the next `resume`.
pub trait LineHook: Send + Sync {
    fn on_line(&mut self, frame: &FrameView<'_>) -> Result<(), TraceCaptureError>;
}

/// The innermost frame at a statement boundary
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Line about to execute
    pub line: Line,
    /// Name of the running code object (`<module>` at top level)
    pub function: &'a str,
    /// Number of active call frames, 1 at top level
    pub depth: usize,
    bindings: &'a BTreeMap<String, Val>,
}

impl<'a> FrameView<'a> {
    pub(crate) fn new(
        line: Line,
        function: &'a str,
        depth: usize,
        bindings: &'a BTreeMap<String, Val>,
    ) -> Self {
        Self {
            line,
            function,
            depth,
            bindings,
        }
    }

    /// Bindings visible in the frame's own scope, sorted by name
    pub fn locals(&self) -> impl Iterator<Item = (&'a str, &'a Val)> + 'a {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}
