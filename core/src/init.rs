//! Process initialization for steptrace
//!
//! Front ends call this once before creating a controller. It installs the
//! stderr log subscriber and loads the effective configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use steptrace_core::init::InitBuilder;
//!
//! let config = InitBuilder::new()
//!     .config_path("steptrace.toml")
//!     .log_level("debug")
//!     .init()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::DebuggerConfig;

/// Filter used when neither `--log-level` nor `RUST_LOG` is given
pub const DEFAULT_LOG_FILTER: &str = "steptrace_core=info,steptrace=info";

/// Global initialization state
static INIT_STATE: OnceLock<InitState> = OnceLock::new();

#[derive(Debug)]
struct InitState {
    config: DebuggerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Config file path (overrides default search)
    pub config_path: Option<PathBuf>,

    /// Log filter directive (overrides `RUST_LOG`)
    pub log_level: Option<String>,
}

pub struct InitBuilder {
    options: InitOptions,
}

impl InitBuilder {
    pub fn new() -> Self {
        Self {
            options: InitOptions::default(),
        }
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.options.log_level = Some(level.into());
        self
    }

    pub fn init(self) -> Result<&'static DebuggerConfig> {
        initialize(self.options)
    }
}

impl Default for InitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Install logging and load configuration
///
/// Calling this more than once is safe; later calls return the
/// configuration loaded by the first.
pub fn initialize(options: InitOptions) -> Result<&'static DebuggerConfig> {
    if let Some(state) = INIT_STATE.get() {
        return Ok(&state.config);
    }

    init_logging(options.log_level.as_deref())?;

    let config = DebuggerConfig::builder()
        .config_path(options.config_path)
        .build()
        .context("Failed to load configuration")?;
    info!(
        max_call_depth = config.interpreter.max_call_depth,
        bootstrap_delay_ms = config.session.bootstrap_delay_ms,
        "configuration loaded"
    );

    let state = INIT_STATE.get_or_init(|| InitState { config });
    Ok(&state.config)
}

/// Build the log filter: explicit level, else `RUST_LOG`, else the default
pub fn log_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level '{}': {}", level, e)),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = log_filter(level)?;
    // Another subscriber (e.g. a test harness) may already be installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}

pub fn is_initialized() -> bool {
    INIT_STATE.get().is_some()
}

/// Configuration loaded by `initialize`, if it has run
pub fn config() -> Option<&'static DebuggerConfig> {
    INIT_STATE.get().map(|state| &state.config)
}
