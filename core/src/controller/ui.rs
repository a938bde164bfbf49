//! UI surface consumed by the controller
//!
//! The controller never renders anything itself. A front end (terminal,
//! test recorder, ...) implements `UiSurface` and receives every change
//! as a method call, in the order the controller applies its effects.

use super::state::ControlState;
use std::collections::BTreeMap;

pub trait UiSurface {
    /// Current editor contents, read when a run starts
    fn editor_source(&self) -> String;

    fn clear_output(&mut self);

    /// Append one chunk to the output log
    fn append_output(&mut self, text: &str);

    /// Replace the variables panel
    fn show_variables(&mut self, line: u32, variables: &BTreeMap<String, String>);

    fn clear_variables(&mut self);

    /// Replace the breakpoint list (sorted ascending)
    fn show_breakpoints(&mut self, lines: &[u32]);

    fn set_controls(&mut self, controls: ControlState);
}

/// One call made on a `RecordingSurface`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    ClearOutput,
    AppendOutput(String),
    ShowVariables {
        line: u32,
        variables: BTreeMap<String, String>,
    },
    ClearVariables,
    ShowBreakpoints(Vec<u32>),
    SetControls(ControlState),
}

/// In-memory surface that keeps the current panels and a call log
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub source: String,
    pub output: Vec<String>,
    pub variables: Option<(u32, BTreeMap<String, String>)>,
    pub breakpoints: Vec<u32>,
    pub controls: ControlState,
    pub calls: Vec<UiCall>,
}

impl RecordingSurface {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Every `ShowVariables` line in call order
    pub fn shown_lines(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                UiCall::ShowVariables { line, .. } => Some(*line),
                _ => None,
            })
            .collect()
    }

    pub fn output_contains(&self, needle: &str) -> bool {
        self.output.iter().any(|chunk| chunk.contains(needle))
    }
}

impl UiSurface for RecordingSurface {
    fn editor_source(&self) -> String {
        self.source.clone()
    }

    fn clear_output(&mut self) {
        self.output.clear();
        self.calls.push(UiCall::ClearOutput);
    }

    fn append_output(&mut self, text: &str) {
        self.output.push(text.to_string());
        self.calls.push(UiCall::AppendOutput(text.to_string()));
    }

    fn show_variables(&mut self, line: u32, variables: &BTreeMap<String, String>) {
        self.variables = Some((line, variables.clone()));
        self.calls.push(UiCall::ShowVariables {
            line,
            variables: variables.clone(),
        });
    }

    fn clear_variables(&mut self) {
        self.variables = None;
        self.calls.push(UiCall::ClearVariables);
    }

    fn show_breakpoints(&mut self, lines: &[u32]) {
        self.breakpoints = lines.to_vec();
        self.calls.push(UiCall::ShowBreakpoints(lines.to_vec()));
    }

    fn set_controls(&mut self, controls: ControlState) {
        self.controls = controls;
        self.calls.push(UiCall::SetControls(controls));
    }
}
