//! Runtime faults raised by user code
//!
//! A fault aborts the run; its `Display` form is what reaches the
//! controller inside an `error` event.

use super::types::Line;
use std::fmt;
use thiserror::Error;

/// Python-style error class of a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    SyntaxError,
    NameError,
    TypeError,
    ValueError,
    IndexError,
    ZeroDivisionError,
    OverflowError,
    RecursionError,
    MemoryError,
    SystemError,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::SyntaxError => "SyntaxError",
            FaultKind::NameError => "NameError",
            FaultKind::TypeError => "TypeError",
            FaultKind::ValueError => "ValueError",
            FaultKind::IndexError => "IndexError",
            FaultKind::ZeroDivisionError => "ZeroDivisionError",
            FaultKind::OverflowError => "OverflowError",
            FaultKind::RecursionError => "RecursionError",
            FaultKind::MemoryError => "MemoryError",
            FaultKind::SystemError => "SystemError",
        };
        f.write_str(name)
    }
}

/// An uncaught fault in user code
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}{}", .line.map(|l| format!(" (line {})", l)).unwrap_or_default())]
pub struct RuntimeFault {
    pub kind: FaultKind,
    pub message: String,
    /// Line that was executing when the fault was raised
    pub line: Option<Line>,
}

impl RuntimeFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    /// Attach the executing line unless one is already recorded
    pub fn at_line(mut self, line: Line) -> Self {
        if self.line.is_none() && line > 0 {
            self.line = Some(line);
        }
        self
    }
}

pub type FaultResult<T> = Result<T, RuntimeFault>;

pub fn type_error(message: impl Into<String>) -> RuntimeFault {
    RuntimeFault::new(FaultKind::TypeError, message)
}

pub fn value_error(message: impl Into<String>) -> RuntimeFault {
    RuntimeFault::new(FaultKind::ValueError, message)
}

pub fn name_error(name: &str) -> RuntimeFault {
    RuntimeFault::new(FaultKind::NameError, format!("name '{}' is not defined", name))
}
