//! Interpreter for the debugger's scripting language
//!
//! - `parser`: source text → line-annotated AST
//! - `executor`: AST → bytecode, and the resumable VM that runs it
//! - `runtime`: the capability surface the session drives

pub mod executor;
pub mod parser;
pub mod runtime;

pub use executor::{FaultKind, FrameView, LineHook, OutputSink, RunOutcome, RuntimeFault, TraceCaptureError, Val};
pub use parser::{parse_program, ParseError};
pub use runtime::{ConfiguredLoader, Execution, LoadError, RuntimeLoader, ScriptRuntime};
