//! Configuration for steptrace
//!
//! Sources, lowest priority first:
//! 1. Compiled defaults
//! 2. TOML file (explicit path, else `STEPTRACE_CONFIG_PATH`, else
//!    `steptrace.toml` in the working directory if present)
//! 3. Environment variables `STEPTRACE_<SECTION>__<KEY>` (a `.env` file
//!    is loaded first)
//! 4. Builder overrides

use crate::interpreter::parser::DEFAULT_MAX_NESTING;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "STEPTRACE_CONFIG_PATH";

/// Config file looked up in the working directory (extension implied)
const DEFAULT_CONFIG_FILE: &str = "steptrace";

const ENV_PREFIX: &str = "STEPTRACE";

/// Deepest nesting a worker thread's stack can parse safely
const MAX_NESTING_CEILING: usize = 32;

/* ===================== Errors ===================== */

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/* ===================== Sections ===================== */

/// Complete debugger configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    pub interpreter: InterpreterConfig,
    pub session: SessionConfig,
}

/// Limits applied by the interpreter runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Call frames allowed before a RecursionError
    pub max_call_depth: usize,

    /// Bindings a single variable snapshot may hold
    pub max_snapshot_vars: usize,

    /// Display strings longer than this are truncated with `...`
    pub max_value_len: usize,

    /// Brackets and prefix operators allowed to nest in one expression
    pub max_nesting_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
            max_snapshot_vars: 512,
            max_value_len: 240,
            max_nesting_depth: DEFAULT_MAX_NESTING,
        }
    }
}

impl InterpreterConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_call_depth == 0 {
            return Err("interpreter.max_call_depth must be at least 1".into());
        }
        if self.max_snapshot_vars == 0 {
            return Err("interpreter.max_snapshot_vars must be at least 1".into());
        }
        if self.max_value_len < 4 {
            return Err("interpreter.max_value_len must be at least 4".into());
        }
        if !(1..=MAX_NESTING_CEILING).contains(&self.max_nesting_depth) {
            return Err(format!(
                "interpreter.max_nesting_depth must be between 1 and {}",
                MAX_NESTING_CEILING
            ));
        }
        Ok(())
    }
}

/// Session worker behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Artificial delay before the runtime reports ready
    pub bootstrap_delay_ms: u64,
}

impl SessionConfig {
    pub fn bootstrap_delay(&self) -> Duration {
        Duration::from_millis(self.bootstrap_delay_ms)
    }
}

impl DebuggerConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interpreter.validate().map_err(ConfigError::Invalid)
    }

    /// Effective configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/* ===================== Builder ===================== */

/// Builder for loading a `DebuggerConfig`
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    use_env: bool,
    overrides: Vec<(String, String)>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            config_path: None,
            use_env: true,
            overrides: Vec::new(),
        }
    }
}

impl ConfigBuilder {
    /// Read this TOML file (required to exist)
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Skip `.env`, `STEPTRACE_*` variables and the default file lookup
    pub fn ignore_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Override a single dotted key, e.g. `interpreter.max_call_depth`
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<DebuggerConfig, ConfigError> {
        if self.use_env {
            // A missing .env is normal
            if let Ok(path) = dotenvy::dotenv() {
                tracing::debug!(path = %path.display(), "loaded .env");
            }
        }

        let mut builder =
            Config::builder().add_source(Config::try_from(&DebuggerConfig::default())?);

        let path = self.config_path.or_else(|| {
            self.use_env
                .then(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
                .flatten()
        });
        match &path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "reading config file");
                builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
            }
            None if self.use_env => {
                builder = builder.add_source(
                    File::with_name(DEFAULT_CONFIG_FILE)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
            None => {}
        }

        if self.use_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        let config: DebuggerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebuggerConfig::builder().ignore_env().build().unwrap();

        assert_eq!(config, DebuggerConfig::default());
        assert_eq!(config.interpreter.max_call_depth, 200);
        assert_eq!(config.interpreter.max_snapshot_vars, 512);
        assert_eq!(config.interpreter.max_value_len, 240);
        assert_eq!(config.interpreter.max_nesting_depth, 20);
        assert_eq!(config.session.bootstrap_delay(), Duration::ZERO);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = DebuggerConfig::builder()
            .ignore_env()
            .set("interpreter.max_call_depth", "25")
            .set("session.bootstrap_delay_ms", "150")
            .build()
            .unwrap();

        assert_eq!(config.interpreter.max_call_depth, 25);
        assert_eq!(config.session.bootstrap_delay(), Duration::from_millis(150));
    }

    #[test]
    fn test_zero_call_depth_is_rejected() {
        let err = DebuggerConfig::builder()
            .ignore_env()
            .set("interpreter.max_call_depth", "0")
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)), "got {:?}", err);
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        for value in ["0", "33"] {
            let err = DebuggerConfig::builder()
                .ignore_env()
                .set("interpreter.max_nesting_depth", value)
                .build()
                .unwrap_err();
            assert!(err.to_string().contains("max_nesting_depth"), "got {}", err);
        }

        let config = DebuggerConfig::builder()
            .ignore_env()
            .set("interpreter.max_nesting_depth", "32")
            .build()
            .unwrap();
        assert_eq!(config.interpreter.max_nesting_depth, 32);
    }

    #[test]
    fn test_toml_file_is_read() {
        let path = std::env::temp_dir().join(format!("steptrace-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[interpreter]\nmax_value_len = 16\n").unwrap();

        let config = DebuggerConfig::builder()
            .ignore_env()
            .config_path(Some(path.clone()))
            .build();
        std::fs::remove_file(&path).ok();

        let config = config.unwrap();
        assert_eq!(config.interpreter.max_value_len, 16);
        assert_eq!(config.interpreter.max_call_depth, 200);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let err = DebuggerConfig::builder()
            .ignore_env()
            .config_path(Some(PathBuf::from("/nonexistent/steptrace.toml")))
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_render_as_toml() {
        let rendered = DebuggerConfig::default().to_toml().unwrap();

        assert!(rendered.contains("[interpreter]"));
        assert!(rendered.contains("max_call_depth = 200"));
        assert!(rendered.contains("[session]"));
    }
}
