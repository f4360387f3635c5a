//! Logging setup for hosts embedding the core
//!
//! The library itself only emits `tracing` events under the `softphone_core`
//! target. Hosts that do not install their own subscriber can call
//! [`setup_logging`], which keeps the core at its own level and everything
//! else quieter. `RUST_LOG`, when set, replaces both.

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Target of every event emitted by this crate
pub const CORE_TARGET: &str = "softphone_core";

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level of the core's own events
    pub core_level: Level,
    /// Level of every other target
    pub default_level: Level,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Include file and line information
    pub file_info: bool,
    /// Include thread names; engine notifications arrive on engine threads
    pub thread_names: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            core_level: Level::INFO,
            default_level: Level::WARN,
            json: false,
            file_info: false,
            thread_names: false,
        }
    }
}

impl LoggingConfig {
    pub fn new(core_level: Level) -> Self {
        LoggingConfig { core_level, ..Default::default() }
    }

    pub fn with_default_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_thread_names(mut self) -> Self {
        self.thread_names = true;
        self
    }

    /// Filter directives used when `RUST_LOG` is not set
    pub fn directives(&self) -> String {
        format!(
            "{},{CORE_TARGET}={}",
            self.default_level.to_string().to_ascii_lowercase(),
            self.core_level.to_string().to_ascii_lowercase()
        )
    }
}

/// Install a global fmt subscriber for `config`
///
/// Fails if a global subscriber is already installed.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.directives())
            .with_context(|| format!("invalid filter directives: {}", config.directives()))?,
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_thread_names(config.thread_names)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        subscriber.with_writer(std::io::stdout).json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::info!(version = crate::VERSION, "softphone core logging ready");
    Ok(())
}

/// Parse a log level such as `"debug"` or `"WARN"`
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid log level: {level}"))
}
