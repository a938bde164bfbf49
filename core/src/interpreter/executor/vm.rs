//! Virtual Machine state
//!
//! The VM holds all execution state on the heap:
//! - frames: call frames, each with its own pc, operand stack and locals
//! - globals: module-level bindings
//! - control: whether the run is live, paused, finished or faulted
//!
//! Because nothing lives on the Rust call stack between instructions, a
//! pause is just `resume()` returning; the next `resume()` picks up at the
//! saved pc with every frame intact.

use super::errors::RuntimeFault;
use super::hook::{FrameView, LineHook, OutputSink, TraceCaptureError};
use super::types::{CodeObject, Line, Val};
use std::collections::BTreeMap;
use std::sync::Arc;

/* ===================== Limits ===================== */

/// Resource limits applied to every run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Frames allowed on the call stack, module frame included
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_call_depth: 200 }
    }
}

/* ===================== Frames ===================== */

/// Open `for` loop iterator
#[derive(Debug, Clone)]
pub struct LoopIter {
    pub items: Vec<Val>,
    pub next: usize,
}

/// One activation of a code object
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub code: Arc<CodeObject>,
    pub pc: usize,
    pub stack: Vec<Val>,
    /// Function locals (unused for the module frame, which binds globals)
    pub locals: BTreeMap<String, Val>,
    pub iters: Vec<LoopIter>,
    /// Line of the statement currently executing in this frame
    pub current_line: Line,
}

impl CallFrame {
    pub fn new(code: Arc<CodeObject>, locals: BTreeMap<String, Val>) -> Self {
        let current_line = code.first_line;
        Self {
            code,
            pc: 0,
            stack: Vec::new(),
            locals,
            iters: Vec::new(),
            current_line,
        }
    }
}

/* ===================== Control ===================== */

/// Lifecycle of a run
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Runnable (not started, or between instructions)
    None,
    /// Suspended by the line hook, about to execute this line
    Paused(Line),
    /// Module body ran to completion
    Done,
    /// Aborted by an uncaught fault
    Fault(RuntimeFault),
}

/// Result of executing a single instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Keep executing
    Continue,
    /// The line hook accepted this line; stop before running it
    Paused(Line),
    /// Module body finished
    Done,
    /// User code raised an uncaught fault
    Fault(RuntimeFault),
    /// The line hook failed and has been removed
    TraceFailed(TraceCaptureError),
}

/* ===================== VM ===================== */

pub struct Vm {
    /// Stack of call frames; the bottom one is the module
    pub frames: Vec<CallFrame>,

    /// Module-level bindings
    pub globals: BTreeMap<String, Val>,

    /// Current control flow state
    pub control: Control,

    pub(crate) limits: Limits,
    pub(crate) hook: Option<Box<dyn LineHook>>,
    pub(crate) output: Option<OutputSink>,
}

impl Vm {
    /// Create a VM positioned before the first instruction of `module`
    pub fn new(module: CodeObject, limits: Limits) -> Self {
        Vm {
            frames: vec![CallFrame::new(Arc::new(module), BTreeMap::new())],
            globals: BTreeMap::new(),
            control: Control::None,
            limits,
            hook: None,
            output: None,
        }
    }

    /// Route `print` output to `sink`
    pub fn redirect_output(&mut self, sink: OutputSink) {
        self.output = Some(sink);
    }

    /// Install the per-line trace hook, replacing any previous one
    pub fn install_line_hook(&mut self, hook: Box<dyn LineHook>) {
        self.hook = Some(hook);
    }

    /// Remove the trace hook; the rest of the run executes untraced
    pub fn remove_line_hook(&mut self) -> Option<Box<dyn LineHook>> {
        self.hook.take()
    }

    pub fn has_line_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Line the VM is paused on, if paused
    pub fn paused_line(&self) -> Option<Line> {
        match self.control {
            Control::Paused(line) => Some(line),
            _ => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.control, Control::Done | Control::Fault(_))
    }

    /// View of the innermost frame, as the hook saw it at the last pause
    pub fn frame_view(&self) -> Option<FrameView<'_>> {
        let frame = self.frames.last()?;
        Some(frame_view(&self.frames, &self.globals, frame.current_line))
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("frames", &self.frames.len())
            .field("globals", &self.globals)
            .field("control", &self.control)
            .field("hooked", &self.hook.is_some())
            .finish()
    }
}

/// Build the view of the innermost frame from disjoint VM fields, so the
/// caller can hold `&mut vm.hook` at the same time.
pub(crate) fn frame_view<'a>(
    frames: &'a [CallFrame],
    globals: &'a BTreeMap<String, Val>,
    line: Line,
) -> FrameView<'a> {
    let depth = frames.len();
    match frames.last() {
        Some(frame) if !frame.code.is_module() => {
            FrameView::new(line, frame.code.name.as_str(), depth, &frame.locals)
        }
        Some(frame) => FrameView::new(line, frame.code.name.as_str(), depth, globals),
        None => FrameView::new(line, super::types::MODULE_NAME, 0, globals),
    }
}
