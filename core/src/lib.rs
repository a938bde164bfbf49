//! steptrace: a line-stepping debugger for a small scripting language
//!
//! A traced interpreter session runs in its own tokio task and pauses
//! before every source line; the execution controller decides, per pause,
//! whether to stop (step mode, breakpoints) or continue.

pub mod cli;
pub mod config;
pub mod controller;
pub mod init;
pub mod interpreter;
pub mod protocol;
pub mod session;

pub use config::DebuggerConfig;
pub use controller::{ExecutionController, UiSurface};
pub use init::{initialize, InitBuilder, InitOptions};
pub use protocol::{Command, Event};
pub use session::{spawn_worker, WorkerHandle};
