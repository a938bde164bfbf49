//! Command line front end
//!
//! `steptrace debug` runs the interactive terminal debugger, `steptrace run`
//! drives a program headlessly and `steptrace config` prints the effective
//! configuration.

pub mod terminal;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info};

use crate::config::DebuggerConfig;
use crate::controller::{
    drive, run_host, worker_spawner, Breakpoints, ControllerState, Directive, ExecutionController, UserAction,
};
use crate::init::{self, InitOptions};
use crate::interpreter::ConfiguredLoader;
use crate::session::SessionOptions;
use terminal::{parse_command, TerminalCommand, TerminalSurface, HELP};

#[derive(Parser)]
#[command(name = "steptrace")]
#[command(about = "steptrace - line-stepping debugger for a small scripting language", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `steptrace_core=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Debug a script interactively (commands on stdin)
    Debug {
        /// Script to debug
        file: PathBuf,

        /// Initial breakpoint line (repeatable)
        #[arg(short = 'b', long = "break")]
        breakpoints: Vec<u32>,
    },

    /// Run a script to completion without prompting
    Run {
        /// Script to run
        file: PathBuf,

        /// Breakpoint line to report (repeatable)
        #[arg(short = 'b', long = "break")]
        breakpoints: Vec<u32>,

        /// Print the variables at every executed line
        #[arg(long)]
        trace: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load configuration before any command so config errors show first
    let config = init::initialize(InitOptions {
        config_path: cli.config,
        log_level: cli.log_level,
    })?;

    match cli.command {
        Commands::Debug { file, breakpoints } => debug_script(config, &file, breakpoints).await,
        Commands::Run {
            file,
            breakpoints,
            trace,
        } => run_script(config, &file, breakpoints, trace).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read script {}", path.display()))
}

fn controller_for<W: std::io::Write>(
    config: &DebuggerConfig,
    surface: TerminalSurface<W>,
    breakpoints: Vec<u32>,
) -> ExecutionController<TerminalSurface<W>> {
    let loader = Arc::new(ConfiguredLoader::new(config.interpreter.clone()));
    let spawner = worker_spawner(loader, SessionOptions::from_config(config));
    let breakpoints: Breakpoints = breakpoints.into_iter().filter(|line| *line > 0).collect();
    ExecutionController::with_breakpoints(surface, spawner, breakpoints)
}

/* ===================== debug ===================== */

async fn debug_script(config: &DebuggerConfig, file: &Path, breakpoints: Vec<u32>) -> Result<()> {
    let source = read_source(file)?;
    info!(file = %file.display(), "starting interactive debugger");

    let surface = TerminalSurface::new(source, std::io::stdout());
    let controller = controller_for(config, surface, breakpoints);

    println!("{}", HELP);
    let (tx, rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(read_actions(tx));

    let controller = run_host(controller, rx).await;
    reader.abort();
    debug!(state = ?controller.state(), "debugger closed");
    Ok(())
}

/// Forward stdin commands to the host loop until quit or end of input
async fn read_actions(actions: UnboundedSender<UserAction>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line) {
            Ok(TerminalCommand::Action(action)) => {
                let quit = action == UserAction::Quit;
                if actions.send(action).is_err() || quit {
                    return;
                }
            }
            Ok(TerminalCommand::Help) => println!("{}", HELP),
            Ok(TerminalCommand::Empty) => {}
            Err(message) => println!("{} ({})", message, HELP),
        }
    }
    let _ = actions.send(UserAction::Quit);
}

/* ===================== run ===================== */

/// Headless policy: start once in Run mode, resume through every pause
pub fn run_to_completion(state: &ControllerState) -> Directive {
    match state {
        ControllerState::Loading | ControllerState::AwaitingPause { .. } => Directive::Wait,
        ControllerState::Idle | ControllerState::Paused { .. } => Directive::Run,
        ControllerState::Finished
        | ControllerState::Errored
        | ControllerState::LoadFailed
        | ControllerState::Crashed => Directive::Stop,
    }
}

async fn run_script(config: &DebuggerConfig, file: &Path, breakpoints: Vec<u32>, trace: bool) -> Result<()> {
    let source = read_source(file)?;
    info!(file = %file.display(), trace, "running script");

    let surface = TerminalSurface::headless(source, std::io::stdout(), trace);
    let mut controller = controller_for(config, surface, breakpoints);

    match drive(&mut controller, run_to_completion).await {
        ControllerState::Finished => Ok(()),
        ControllerState::Errored => bail!("{} stopped with an error", file.display()),
        ControllerState::LoadFailed => bail!("interpreter failed to load"),
        state => bail!("debugger stopped unexpectedly in state {:?}", state),
    }
}
