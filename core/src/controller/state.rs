//! Controller state machine
//!
//! `transition` is pure: given the current state, one input and the
//! breakpoint set it returns the next state and the effects to apply.
//! The controller owns the effects; nothing here touches a channel or UI.

use super::breakpoints::Breakpoints;
use crate::protocol::{Command, Event};
use std::collections::BTreeMap;

/// How pauses are treated while a request is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Auto-continue except at breakpoints
    Run,
    /// Stop at every line
    Step,
}

impl RunMode {
    pub fn should_stop_at(self, line: u32, breakpoints: &Breakpoints) -> bool {
        match self {
            RunMode::Step => true,
            RunMode::Run => breakpoints.contains(line),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RunMode::Run => "Run",
            RunMode::Step => "Step",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// Worker created, waiting for `ready`
    Loading,
    /// Bootstrap failed; only reset helps
    LoadFailed,
    /// Ready, no run in progress
    Idle,
    /// A start/continue request is outstanding
    AwaitingPause { mode: RunMode },
    /// Stopped at a line, waiting for the user
    Paused { line: u32 },
    Finished,
    /// The run raised an error; a fresh Run is allowed
    Errored,
    /// The worker misbehaved or went away
    Crashed,
}

/// Things the user or the worker can do to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Run { source: String },
    Step { source: String },
    Reset,
    Event(Event),
    /// Malformed message or lost worker
    WorkerFault(String),
}

/// Side effects requested by a transition, applied in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(Command),
    ClearOutput,
    AppendOutput(String),
    ShowVariables {
        line: u32,
        variables: BTreeMap<String, String>,
    },
    ClearVariables,
    RespawnWorker,
}

/// Enabled/disabled state of the four controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub run: bool,
    pub step: bool,
    pub reset: bool,
    pub add_breakpoint: bool,
}

impl ControlState {
    pub fn for_state(state: &ControllerState) -> Self {
        let (run, step) = match state {
            ControllerState::Idle | ControllerState::Paused { .. } => (true, true),
            ControllerState::Errored => (true, false),
            ControllerState::Loading
            | ControllerState::LoadFailed
            | ControllerState::AwaitingPause { .. }
            | ControllerState::Finished
            | ControllerState::Crashed => (false, false),
        };
        Self {
            run,
            step,
            reset: true,
            add_breakpoint: true,
        }
    }
}

pub const FINISHED_MESSAGE: &str = "--- Program Finished ---";
pub const RESET_MESSAGE: &str = "Debugger state reset.";

pub fn starting_message(mode: RunMode) -> String {
    format!("Starting execution in {} mode...", mode.label())
}

pub fn paused_message(line: u32) -> String {
    format!("Execution paused at line {}.", line)
}

/// Compute the next state and its effects
pub fn transition(
    state: &ControllerState,
    input: Input,
    breakpoints: &Breakpoints,
) -> (ControllerState, Vec<Effect>) {
    use ControllerState as S;

    match (state, input) {
        (_, Input::Reset) => (
            S::Loading,
            vec![
                Effect::ClearOutput,
                Effect::ClearVariables,
                Effect::RespawnWorker,
                Effect::AppendOutput(RESET_MESSAGE.to_string()),
                Effect::Send(Command::Initialize),
            ],
        ),

        (_, Input::WorkerFault(message)) => (
            S::Crashed,
            vec![Effect::AppendOutput(format!("WORKER ERROR: {}", message))],
        ),

        // Output is append-only and accepted in every state
        (_, Input::Event(Event::Output { text })) => (state.clone(), vec![Effect::AppendOutput(text)]),

        /* ----- bootstrap ----- */
        (S::Loading, Input::Event(Event::Ready)) => (S::Idle, vec![]),
        (S::Loading, Input::Event(Event::LoadFailed { message })) => (
            S::LoadFailed,
            vec![Effect::AppendOutput(format!("LOAD ERROR: {}", message))],
        ),

        /* ----- starting a run ----- */
        (S::Idle | S::Errored, Input::Run { source }) => start(RunMode::Run, source),
        (S::Idle, Input::Step { source }) => start(RunMode::Step, source),

        /* ----- resuming from a pause ----- */
        (S::Paused { .. }, Input::Step { .. }) => (
            S::AwaitingPause {
                mode: RunMode::Step,
            },
            vec![Effect::Send(Command::ContinueExecution)],
        ),
        (S::Paused { .. }, Input::Run { .. }) => (
            S::AwaitingPause { mode: RunMode::Run },
            vec![Effect::Send(Command::ContinueExecution)],
        ),

        /* ----- responses ----- */
        (S::AwaitingPause { mode }, Input::Event(Event::LineExecuted { line, variables })) => {
            let mut effects = vec![Effect::ShowVariables { line, variables }];
            if mode.should_stop_at(line, breakpoints) {
                effects.push(Effect::AppendOutput(paused_message(line)));
                (S::Paused { line }, effects)
            } else {
                effects.push(Effect::Send(Command::ContinueExecution));
                (S::AwaitingPause { mode: *mode }, effects)
            }
        }
        (S::AwaitingPause { .. } | S::Paused { .. }, Input::Event(Event::ProgramEnd)) => (
            S::Finished,
            vec![Effect::AppendOutput(FINISHED_MESSAGE.to_string())],
        ),
        (
            S::Idle | S::AwaitingPause { .. } | S::Paused { .. } | S::Finished | S::Errored,
            Input::Event(Event::Error { message }),
        ) => (
            S::Errored,
            vec![Effect::AppendOutput(format!("RUNTIME ERROR: {}", message))],
        ),
        // Errors while loading or after a crash are shown but change nothing
        (_, Input::Event(Event::Error { message })) => (
            state.clone(),
            vec![Effect::AppendOutput(format!("RUNTIME ERROR: {}", message))],
        ),

        // Disabled controls and unexpected events
        _ => (state.clone(), vec![]),
    }
}

fn start(mode: RunMode, source: String) -> (ControllerState, Vec<Effect>) {
    (
        ControllerState::AwaitingPause { mode },
        vec![
            Effect::ClearOutput,
            Effect::ClearVariables,
            Effect::AppendOutput(starting_message(mode)),
            Effect::Send(Command::StartExecution { source }),
        ],
    )
}
