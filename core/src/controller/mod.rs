//! Execution Controller
//!
//! Host-side owner of the breakpoint set and the run/step state machine.
//! It turns user actions into commands for the current session worker and
//! worker events into state transitions and UI updates.
//!
//! ## Module Organization
//! - `state`: the pure `transition` function and its types
//! - `breakpoints`: the breakpoint set and input parsing
//! - `ui`: the `UiSurface` trait and a recording implementation
//! - `host`: the async loop joining user actions and worker events

pub mod breakpoints;
pub mod host;
pub mod state;
pub mod ui;

#[cfg(test)]
mod tests;

pub use breakpoints::{parse_line, Breakpoints};
pub use host::{drive, run_host, Directive, UserAction};
pub use state::{transition, ControlState, ControllerState, Effect, Input, RunMode};
pub use ui::{RecordingSurface, UiCall, UiSurface};

use crate::interpreter::RuntimeLoader;
use crate::protocol::{self, Command, Envelope};
use crate::session::{spawn_worker, SessionOptions, WorkerHandle};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Creates a fresh worker; called at startup and on every reset
pub type WorkerSpawner = Arc<dyn Fn() -> WorkerHandle + Send + Sync>;

/// Spawner backed by real session workers
pub fn worker_spawner(loader: Arc<dyn RuntimeLoader>, options: SessionOptions) -> WorkerSpawner {
    Arc::new(move || spawn_worker(loader.clone(), options))
}

pub const WORKER_STOPPED_MESSAGE: &str = "session worker stopped unexpectedly";

pub struct ExecutionController<U: UiSurface> {
    ui: U,
    state: ControllerState,
    breakpoints: Breakpoints,
    worker: WorkerHandle,
    spawner: WorkerSpawner,
}

impl<U: UiSurface> ExecutionController<U> {
    /// Spawn the first worker and request its bootstrap
    pub fn new(ui: U, spawner: WorkerSpawner) -> Self {
        Self::with_breakpoints(ui, spawner, Breakpoints::new())
    }

    pub fn with_breakpoints(ui: U, spawner: WorkerSpawner, breakpoints: Breakpoints) -> Self {
        let worker = spawner();
        info!(session = %worker.id(), "controller started");

        let mut controller = Self {
            ui,
            state: ControllerState::Loading,
            breakpoints,
            worker,
            spawner,
        };
        controller.ui.show_breakpoints(&controller.breakpoints.lines());
        controller.perform(vec![Effect::Send(Command::Initialize)]);
        controller.ui.set_controls(ControlState::for_state(&controller.state));
        controller
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    /// Id of the worker whose events are currently accepted
    pub fn session(&self) -> protocol::SessionId {
        self.worker.id()
    }

    /// Whether worker events are still worth waiting for
    pub fn is_listening(&self) -> bool {
        !matches!(self.state, ControllerState::Crashed)
    }

    /* ===================== User Actions ===================== */

    pub fn run(&mut self) {
        let source = self.ui.editor_source();
        self.apply(Input::Run { source });
    }

    pub fn step(&mut self) {
        let source = self.ui.editor_source();
        self.apply(Input::Step { source });
    }

    pub fn reset(&mut self) {
        self.apply(Input::Reset);
    }

    /// Add a breakpoint from raw user input; invalid input is ignored
    pub fn add_breakpoint_input(&mut self, input: &str) -> Option<u32> {
        let line = parse_line(input)?;
        self.breakpoints.add(line);
        self.ui.show_breakpoints(&self.breakpoints.lines());
        Some(line)
    }

    pub fn remove_breakpoint(&mut self, line: u32) -> bool {
        let removed = self.breakpoints.remove(line);
        self.ui.show_breakpoints(&self.breakpoints.lines());
        removed
    }

    /* ===================== Worker Events ===================== */

    /// Wait for the next raw message from the current worker
    pub async fn next_wire(&mut self) -> Option<String> {
        self.worker.recv().await
    }

    /// Receive and handle one worker message
    pub async fn process_next(&mut self) {
        let message = self.next_wire().await;
        self.handle_wire(message);
    }

    /// Handle one raw worker message; `None` means the worker went away
    pub fn handle_wire(&mut self, message: Option<String>) {
        let Some(text) = message else {
            error!(session = %self.worker.id(), "worker channel closed");
            self.apply(Input::WorkerFault(WORKER_STOPPED_MESSAGE.to_string()));
            return;
        };

        let envelope: Envelope = match protocol::decode(&text) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(error = %err, "malformed message from worker");
                self.apply(Input::WorkerFault(err.to_string()));
                return;
            }
        };

        if envelope.session != self.worker.id() {
            warn!(
                stale = %envelope.session,
                current = %self.worker.id(),
                event = envelope.event.name(),
                "dropping event from stale session"
            );
            return;
        }

        debug!(event = envelope.event.name(), "event received");
        self.apply(Input::Event(envelope.event));
    }

    /* ===================== Transitions ===================== */

    /// Run one input through the state machine and apply its effects
    pub fn apply(&mut self, input: Input) {
        let (next, effects) = transition(&self.state, input, &self.breakpoints);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "controller transition");
        }
        self.state = next;
        self.perform(effects);
        self.ui.set_controls(ControlState::for_state(&self.state));
    }

    fn perform(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(command) => {
                    if let Err(err) = self.worker.send(&command) {
                        error!(command = command.name(), error = %err, "failed to reach worker");
                        self.apply(Input::WorkerFault(err.to_string()));
                        return;
                    }
                }
                Effect::ClearOutput => self.ui.clear_output(),
                Effect::AppendOutput(text) => self.ui.append_output(&text),
                Effect::ShowVariables { line, variables } => self.ui.show_variables(line, &variables),
                Effect::ClearVariables => self.ui.clear_variables(),
                Effect::RespawnWorker => {
                    self.worker.abort();
                    self.worker = (self.spawner)();
                    info!(session = %self.worker.id(), "worker respawned");
                }
            }
        }
    }
}
