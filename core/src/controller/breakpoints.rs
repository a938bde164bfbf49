//! Breakpoint set
//!
//! Owned by the controller; consulted only when a Run-mode pause arrives.

use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakpoints {
    lines: BTreeSet<u32>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the line was already set
    pub fn add(&mut self, line: u32) -> bool {
        let added = self.lines.insert(line);
        if added {
            info!(line, "breakpoint set");
        }
        added
    }

    pub fn remove(&mut self, line: u32) -> bool {
        let removed = self.lines.remove(&line);
        if removed {
            info!(line, "breakpoint removed");
        }
        removed
    }

    pub fn contains(&self, line: u32) -> bool {
        self.lines.contains(&line)
    }

    /// Lines in ascending order
    pub fn lines(&self) -> Vec<u32> {
        self.lines.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromIterator<u32> for Breakpoints {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

/// Parse user input as a breakpoint line: a positive integer, surrounding
/// whitespace allowed. Anything else yields `None`.
pub fn parse_line(input: &str) -> Option<u32> {
    match input.trim().parse::<u32>() {
        Ok(line) if line > 0 => Some(line),
        _ => {
            debug!(input, "ignoring invalid breakpoint input");
            None
        }
    }
}
