//! Resumable bytecode executor
//!
//! Source is compiled to one flat instruction list per code object and run
//! by a VM whose call frames and operand stacks live on the heap. A line
//! hook installed on the VM can suspend execution at every statement
//! boundary; resuming continues from the saved program counter with the
//! whole call stack intact.

pub mod compiler;
pub mod errors;
pub mod exec_loop;
pub mod hook;
pub mod operators;
pub mod stdlib;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

pub use compiler::compile_program;
pub use errors::{FaultKind, FaultResult, RuntimeFault};
pub use exec_loop::{resume, run_until_done, step, RunOutcome};
pub use hook::{FrameView, LineHook, OutputSink, TraceCaptureError};
pub use stdlib::Builtin;
pub use types::{CodeObject, Line, Val};
pub use vm::{CallFrame, Control, Limits, Step, Vm};
