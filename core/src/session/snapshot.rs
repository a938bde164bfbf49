//! Variable snapshots taken at each pause
//!
//! Values are rendered to their display strings here; the snapshot that
//! leaves the session carries no type information.

use crate::config::InterpreterConfig;
use crate::interpreter::executor::{FrameView, TraceCaptureError, Val};
use std::collections::BTreeMap;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLimits {
    /// Bindings allowed in one snapshot
    pub max_vars: usize,
    /// Longest display string, in characters, before truncation
    pub max_value_len: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self::from(&InterpreterConfig::default())
    }
}

impl From<&InterpreterConfig> for SnapshotLimits {
    fn from(config: &InterpreterConfig) -> Self {
        Self {
            max_vars: config.max_snapshot_vars,
            max_value_len: config.max_value_len,
        }
    }
}

/// Capture every binding of the frame as `name -> display string`
pub fn capture(
    frame: &FrameView<'_>,
    limits: SnapshotLimits,
) -> Result<BTreeMap<String, String>, TraceCaptureError> {
    let count = frame.binding_count();
    if count > limits.max_vars {
        return Err(TraceCaptureError(format!(
            "{} variables in scope at line {} exceeds the snapshot limit of {}",
            count, frame.line, limits.max_vars
        )));
    }
    Ok(frame
        .locals()
        .map(|(name, value)| (name.to_string(), display(value, limits.max_value_len)))
        .collect())
}

pub fn display(value: &Val, max_len: usize) -> String {
    truncate(value.to_string(), max_len)
}

fn truncate(text: String, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text;
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}
