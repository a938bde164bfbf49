//! The traced interpreter session
//!
//! Owns the bootstrapped runtime and at most one run. Each `start` or
//! `continue` advances the run to its next line pause or to termination,
//! so every request gets exactly one answering event.

use super::emitter::EventEmitter;
use super::hook::TraceHook;
use super::snapshot::{self, SnapshotLimits};
use super::state::SessionState;
use super::SessionError;
use crate::config::DebuggerConfig;
use crate::interpreter::executor::Line;
use crate::interpreter::{Execution, LoadError, RunOutcome, RuntimeFault, RuntimeLoader, ScriptRuntime};
use crate::protocol::{Command, Event, SessionId};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Lifecycle lines written to the output stream during bootstrap
pub const LOADING_MESSAGE: &str = "Worker: Loading interpreter...";
pub const LOADED_MESSAGE: &str = "Worker: Interpreter loaded and ready.";

/// Per-session settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Artificial delay before bootstrap completes
    pub bootstrap_delay: Duration,
    pub snapshot: SnapshotLimits,
}

impl SessionOptions {
    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self {
            bootstrap_delay: config.session.bootstrap_delay(),
            snapshot: SnapshotLimits::from(&config.interpreter),
        }
    }
}

pub struct TracedSession {
    emitter: EventEmitter,
    loader: Arc<dyn RuntimeLoader>,
    options: SessionOptions,

    /// Bootstrap outcome, computed once and shared by every caller
    runtime: OnceCell<Result<ScriptRuntime, LoadError>>,

    execution: Option<Execution>,
    state: SessionState,
}

impl TracedSession {
    pub fn new(emitter: EventEmitter, loader: Arc<dyn RuntimeLoader>, options: SessionOptions) -> Self {
        Self {
            emitter,
            loader,
            options,
            runtime: OnceCell::new(),
            execution: None,
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> SessionId {
        self.emitter.session()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /* ===================== Commands ===================== */

    /// Dispatch one decoded command
    pub async fn handle(&mut self, command: Command) -> Result<(), SessionError> {
        match command {
            Command::Initialize => {
                let event = match self.initialize().await {
                    Ok(_) => Event::Ready,
                    Err(err) => Event::LoadFailed {
                        message: err.to_string(),
                    },
                };
                self.emitter.emit(event)
            }
            Command::StartExecution { source } => self.start_execution(&source).await,
            Command::ContinueExecution => self.continue_execution(),
        }
    }

    /// Bootstrap the runtime once
    ///
    /// Concurrent and later callers wait for, and observe, the first
    /// caller's outcome; the loader runs at most once per session.
    pub async fn initialize(&self) -> Result<&ScriptRuntime, LoadError> {
        self.runtime
            .get_or_init(|| self.bootstrap())
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    async fn bootstrap(&self) -> Result<ScriptRuntime, LoadError> {
        info!(session = %self.id(), "bootstrapping interpreter");
        self.lifecycle(LOADING_MESSAGE);

        if !self.options.bootstrap_delay.is_zero() {
            tokio::time::sleep(self.options.bootstrap_delay).await;
        }

        let mut runtime = match self.loader.load() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(session = %self.id(), error = %err, "interpreter bootstrap failed");
                return Err(err);
            }
        };

        let emitter = self.emitter.clone();
        runtime.redirect_output(Arc::new(move |text: &str| {
            if let Err(err) = emitter.emit(Event::Output {
                text: text.to_string(),
            }) {
                warn!(error = %err, "dropping program output");
            }
        }));

        self.lifecycle(LOADED_MESSAGE);
        info!(session = %self.id(), "interpreter ready");
        Ok(runtime)
    }

    /// Begin a new run of `source`, discarding any previous run, and
    /// advance it to its first pause or termination
    pub async fn start_execution(&mut self, source: &str) -> Result<(), SessionError> {
        if self.execution.take().is_some() {
            debug!(session = %self.id(), "discarding previous run");
        }
        self.state = SessionState::Idle;

        let hook = TraceHook::new(self.emitter.clone(), self.options.snapshot);
        let prepared = {
            let runtime = self.initialize().await?;
            runtime.run(source, Box::new(hook))
        };

        info!(session = %self.id(), "execution started");
        match prepared {
            Ok(execution) => {
                self.execution = Some(execution);
                self.advance()
            }
            Err(fault) => self.fail(fault),
        }
    }

    /// Advance the paused run to its next pause or termination
    pub fn continue_execution(&mut self) -> Result<(), SessionError> {
        if !self.state.can_continue() {
            return Err(SessionError::InvalidState(format!(
                "cannot continue: {}",
                self.state
            )));
        }
        self.advance()
    }

    /// Re-capture the variables of the current pause point
    pub fn current_snapshot(&self) -> Option<(Line, BTreeMap<String, String>)> {
        let frame = self.execution.as_ref()?.frame_view()?;
        let variables = snapshot::capture(&frame, self.options.snapshot).ok()?;
        Some((frame.line, variables))
    }

    /// Report an error that ended a command without touching the run
    pub fn report(&self, err: &SessionError) {
        warn!(session = %self.id(), error = %err, "command failed");
        if let Err(emit_err) = self.emitter.emit(Event::Error {
            message: err.to_string(),
        }) {
            warn!(error = %emit_err, "could not report error");
        }
    }

    /* ===================== Run Control ===================== */

    fn advance(&mut self) -> Result<(), SessionError> {
        let id = self.id();
        let Some(execution) = self.execution.as_mut() else {
            return Err(SessionError::InvalidState(format!(
                "no active execution: {}",
                self.state
            )));
        };

        match execution.resume() {
            RunOutcome::Paused { line } => {
                // The hook already emitted `line_executed`
                debug!(session = %id, line, "paused");
                self.state = SessionState::Paused(line);
                Ok(())
            }
            RunOutcome::Finished => {
                info!(session = %id, "program finished");
                self.execution = None;
                self.state = SessionState::Finished;
                self.emitter.emit(Event::ProgramEnd)
            }
            RunOutcome::Faulted(fault) => self.fail(fault),
            RunOutcome::TraceFailed(err) => {
                warn!(session = %id, error = %err, "tracing disabled, finishing untraced");
                self.emitter.emit(Event::Error {
                    message: err.to_string(),
                })?;
                // The hook is gone: the rest of the program runs without pausing
                let outcome = loop {
                    match execution.resume() {
                        RunOutcome::Paused { .. } | RunOutcome::TraceFailed(_) => continue,
                        other => break other,
                    }
                };
                match outcome {
                    RunOutcome::Faulted(fault) => {
                        warn!(session = %id, fault = %fault, "untraced remainder raised a fault");
                        // The error event is already spent; report the fault as output
                        self.emitter.emit(Event::Output {
                            text: fault.to_string(),
                        })?;
                    }
                    other => debug!(session = %id, outcome = ?other, "untraced remainder ended"),
                }
                self.execution = None;
                self.state = SessionState::Errored;
                Ok(())
            }
        }
    }

    fn fail(&mut self, fault: RuntimeFault) -> Result<(), SessionError> {
        warn!(session = %self.id(), fault = %fault, "program raised an uncaught fault");
        self.execution = None;
        self.state = SessionState::Errored;
        self.emitter.emit(Event::Error {
            message: fault.to_string(),
        })
    }

    fn lifecycle(&self, text: &str) {
        if let Err(err) = self.emitter.emit(Event::Output {
            text: text.to_string(),
        }) {
            warn!(error = %err, "could not emit lifecycle output");
        }
    }
}
