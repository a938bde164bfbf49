//! Test helpers for executor tests
//!
//! Common utilities for compiling sources and observing a VM

use crate::interpreter::executor::{
    compile_program, resume, FrameView, Limits, Line, LineHook, RunOutcome, TraceCaptureError, Val,
    Vm,
};
use crate::interpreter::parser::parse_program;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Parse and compile `source`, then create a VM with default limits
pub fn build_vm(source: &str) -> Vm {
    build_vm_with_limits(source, Limits::default())
}

pub fn build_vm_with_limits(source: &str, limits: Limits) -> Vm {
    let program = parse_program(source).expect("Parse failed");
    let module = compile_program(&program).expect("Compile failed");
    Vm::new(module, limits)
}

/// Collect everything `print` writes
pub fn capture_output(vm: &mut Vm) -> Arc<Mutex<Vec<String>>> {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    vm.redirect_output(Arc::new(move |text: &str| {
        sink.lock().unwrap().push(text.to_string());
    }));
    lines
}

/// One hook firing: line, function, call depth and display strings of the frame
#[derive(Debug, Clone, PartialEq)]
pub struct Seen {
    pub line: Line,
    pub function: String,
    pub depth: usize,
    pub vars: BTreeMap<String, String>,
}

/// Hook that records every line it sees and always pauses
pub struct RecordingHook {
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

impl LineHook for RecordingHook {
    fn on_line(&mut self, frame: &FrameView<'_>) -> Result<(), TraceCaptureError> {
        self.seen.lock().unwrap().push(Seen {
            line: frame.line,
            function: frame.function.to_string(),
            depth: frame.depth,
            vars: frame
                .locals()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Ok(())
    }
}

pub fn install_recorder(vm: &mut Vm) -> Arc<Mutex<Vec<Seen>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    vm.install_line_hook(Box::new(RecordingHook {
        seen: Arc::clone(&seen),
    }));
    seen
}

/// Resume through every pause, returning the paused lines and final outcome
pub fn step_through(vm: &mut Vm) -> (Vec<Line>, RunOutcome) {
    let mut lines = Vec::new();
    loop {
        match resume(vm) {
            RunOutcome::Paused { line } => lines.push(line),
            other => return (lines, other),
        }
    }
}

pub fn global(vm: &Vm, name: &str) -> Option<Val> {
    vm.globals.get(name).cloned()
}
