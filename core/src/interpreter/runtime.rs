//! Interpreter runtime capability
//!
//! The session drives the interpreter only through this surface:
//! `bootstrap` once, `redirect_output` to route `print`, then `run` a
//! source with a line hook installed and `resume` the returned
//! execution until it terminates.

use super::executor::{
    compile_program, resume, FaultKind, FrameView, Limits, Line, LineHook, OutputSink, RunOutcome,
    RuntimeFault, Vm,
};
use super::parser::{parse_program_with_limit, ParseError};
use crate::config::InterpreterConfig;
use thiserror::Error;
use tracing::{debug, info};

/// Interpreter bootstrap failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("invalid interpreter configuration: {0}")]
    InvalidConfig(String),

    #[error("interpreter bootstrap failed: {0}")]
    Bootstrap(String),
}

/* ===================== Runtime ===================== */

/// A bootstrapped interpreter, ready to run programs
#[derive(Clone)]
pub struct ScriptRuntime {
    limits: Limits,
    max_nesting: usize,
    output: Option<OutputSink>,
}

impl std::fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("limits", &self.limits)
            .field("max_nesting", &self.max_nesting)
            .field("redirected", &self.output.is_some())
            .finish()
    }
}

impl ScriptRuntime {
    pub fn bootstrap(config: &InterpreterConfig) -> Result<Self, LoadError> {
        config.validate().map_err(LoadError::InvalidConfig)?;
        info!(
            max_call_depth = config.max_call_depth,
            max_nesting_depth = config.max_nesting_depth,
            "interpreter runtime bootstrapped"
        );
        Ok(Self {
            limits: Limits {
                max_call_depth: config.max_call_depth,
            },
            max_nesting: config.max_nesting_depth,
            output: None,
        })
    }

    /// Route `print` output of every later run to `sink`
    pub fn redirect_output(&mut self, sink: OutputSink) {
        self.output = Some(sink);
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Compile `source` and prepare it to run under `hook`
    ///
    /// Nothing executes until the first `Execution::resume`. A source that
    /// does not parse or compile fails here with a `SyntaxError` fault.
    pub fn run(&self, source: &str, hook: Box<dyn LineHook>) -> Result<Execution, RuntimeFault> {
        let program = parse_program_with_limit(source, self.max_nesting).map_err(syntax_fault)?;
        let module = compile_program(&program)?;
        debug!(instructions = module.instrs.len(), "program compiled");

        let mut vm = Vm::new(module, self.limits);
        if let Some(sink) = &self.output {
            vm.redirect_output(sink.clone());
        }
        vm.install_line_hook(hook);
        Ok(Execution { vm })
    }
}

fn syntax_fault(err: ParseError) -> RuntimeFault {
    let line = err.line();
    let message = match err {
        ParseError::Syntax { .. } => "invalid syntax".to_string(),
        ParseError::Build { message, .. } => message,
        ParseError::TooDeep { .. } => "too many nested parentheses".to_string(),
    };
    RuntimeFault::new(FaultKind::SyntaxError, message).at_line(line)
}

/* ===================== Execution ===================== */

/// One program run, suspended between `resume` calls
#[derive(Debug)]
pub struct Execution {
    vm: Vm,
}

impl Execution {
    /// Run to the next line pause or to termination
    pub fn resume(&mut self) -> RunOutcome {
        resume(&mut self.vm)
    }

    /// The frame the hook last paused in
    pub fn frame_view(&self) -> Option<FrameView<'_>> {
        self.vm.frame_view()
    }

    pub fn paused_line(&self) -> Option<Line> {
        self.vm.paused_line()
    }

    pub fn is_traced(&self) -> bool {
        self.vm.has_line_hook()
    }

    pub fn is_terminated(&self) -> bool {
        self.vm.is_terminated()
    }
}

/* ===================== Loading ===================== */

/// Source of bootstrapped runtimes for a session
pub trait RuntimeLoader: Send + Sync {
    fn load(&self) -> Result<ScriptRuntime, LoadError>;
}

/// Loader that bootstraps from an interpreter config section
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLoader {
    config: InterpreterConfig,
}

impl ConfiguredLoader {
    pub fn new(config: InterpreterConfig) -> Self {
        Self { config }
    }
}

impl RuntimeLoader for ConfiguredLoader {
    fn load(&self) -> Result<ScriptRuntime, LoadError> {
        ScriptRuntime::bootstrap(&self.config)
    }
}
