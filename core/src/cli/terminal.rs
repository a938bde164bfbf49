//! Terminal front end
//!
//! `TerminalSurface` renders controller updates as plain lines and
//! `parse_command` turns one line of stdin into a user action.

use crate::controller::{ControlState, UiSurface, UserAction};
use std::collections::BTreeMap;
use std::io::Write;

pub const HELP: &str = "commands: run | step (s) | reset | break N (b N) | clear N | breaks | help | quit (q)";

/// Line-oriented rendering of the debugger panels
pub struct TerminalSurface<W: Write> {
    source: String,
    out: W,
    /// Print the variables panel on every pause
    show_variables: bool,
    /// Print control changes and breakpoint lists
    interactive: bool,
    last_controls: Option<ControlState>,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(source: impl Into<String>, out: W) -> Self {
        Self {
            source: source.into(),
            out,
            show_variables: true,
            interactive: true,
            last_controls: None,
        }
    }

    /// Non-interactive rendering: program output, optionally with pauses
    pub fn headless(source: impl Into<String>, out: W, trace: bool) -> Self {
        Self {
            show_variables: trace,
            interactive: false,
            ..Self::new(source, out)
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // A closed stdout leaves nothing useful to report to
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }
}

impl<W: Write> UiSurface for TerminalSurface<W> {
    fn editor_source(&self) -> String {
        self.source.clone()
    }

    fn clear_output(&mut self) {
        if self.interactive {
            self.line("----------------------------------------");
        }
    }

    fn append_output(&mut self, text: &str) {
        self.line(text);
    }

    fn show_variables(&mut self, line: u32, variables: &BTreeMap<String, String>) {
        if self.show_variables {
            let rendered = render_variables(line, variables);
            self.line(&rendered);
        }
    }

    fn clear_variables(&mut self) {}

    fn show_breakpoints(&mut self, lines: &[u32]) {
        if self.interactive {
            let rendered = render_breakpoints(lines);
            self.line(&rendered);
        }
    }

    fn set_controls(&mut self, controls: ControlState) {
        if !self.interactive || self.last_controls == Some(controls) {
            return;
        }
        self.last_controls = Some(controls);
        let rendered = render_controls(controls);
        self.line(&rendered);
    }
}

pub fn render_variables(line: u32, variables: &BTreeMap<String, String>) -> String {
    if variables.is_empty() {
        return format!("  [line {}] (no variables)", line);
    }
    let pairs: Vec<String> = variables
        .iter()
        .map(|(name, value)| format!("{} = {}", name, value))
        .collect();
    format!("  [line {}] {}", line, pairs.join(", "))
}

pub fn render_breakpoints(lines: &[u32]) -> String {
    if lines.is_empty() {
        return "breakpoints: none".to_string();
    }
    let lines: Vec<String> = lines.iter().map(u32::to_string).collect();
    format!("breakpoints: {}", lines.join(", "))
}

pub fn render_controls(controls: ControlState) -> String {
    let mut enabled = Vec::new();
    if controls.run {
        enabled.push("run");
    }
    if controls.step {
        enabled.push("step");
    }
    if controls.reset {
        enabled.push("reset");
    }
    if controls.add_breakpoint {
        enabled.push("break");
    }
    format!("[available: {}]", enabled.join(" "))
}

/// What a line of terminal input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Action(UserAction),
    Help,
    Empty,
}

pub fn parse_command(input: &str) -> Result<TerminalCommand, String> {
    let mut words = input.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(TerminalCommand::Empty);
    };
    let arg = words.next();

    let action = match (verb, arg) {
        ("run" | "r", None) => UserAction::Run,
        ("step" | "s", None) => UserAction::Step,
        ("reset", None) => UserAction::Reset,
        ("breaks", None) => UserAction::ListBreakpoints,
        ("quit" | "q" | "exit", None) => UserAction::Quit,
        ("help" | "?", None) => return Ok(TerminalCommand::Help),
        // Validation happens in the controller, which ignores bad input
        ("break" | "b", Some(line)) => UserAction::AddBreakpoint(line.to_string()),
        ("clear", Some(line)) => match line.parse::<u32>() {
            Ok(line) => UserAction::RemoveBreakpoint(line),
            Err(_) => return Err(format!("not a line number: {}", line)),
        },
        _ => return Err(format!("unknown command: {}", input.trim())),
    };

    if words.next().is_some() {
        return Err(format!("unexpected arguments: {}", input.trim()));
    }
    Ok(TerminalCommand::Action(action))
}
