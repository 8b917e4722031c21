//! # Logger
//!
//! Installs the process-wide `tracing` subscriber for trellis binaries.
//! Console output goes to stderr so command output on stdout stays clean; an
//! optional rolling file layer writes through a non-blocking worker.
//!
//! The filter starts from the configured level and honors `RUST_LOG`, unless an
//! explicit directive string (e.g., `"trellis_apps=debug,info"`) is configured.
//!
//! ## Example
//!
//! ```rust
//! # use trellis_logger::{LevelFilter, Logger};
//! let _logger = Logger::builder("manage").console(true).level(LevelFilter::DEBUG).init().unwrap();
//! tracing::debug!("visible");
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use trellis_domain::settings::LoggingSettings;

const LOG_FILE_SUFFIX: &str = "log";

/// Configures and installs the global subscriber.
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    console: bool,
    level: LevelFilter,
    directive: Option<String>,
    directory: Option<PathBuf>,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl LoggerBuilder {
    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Explicit filter directives. Replaces `RUST_LOG`; invalid directives fail [`LoggerBuilder::init`].
    #[must_use]
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = Some(directive.into());
        self
    }

    /// Enables file output into `directory`, created when missing.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Writes file output as JSON lines.
    #[must_use]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    /// Installs the global subscriber.
    ///
    /// # Returns
    /// A [`Logger`] handle holding the file worker guard. Keep it alive until
    /// shutdown, dropping it flushes and stops file output.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`,
    ///   bad directives or no enabled output.
    /// * [`LoggerError::Appender`] if the log directory can't be used.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already set.
    pub fn init(self) -> Result<Logger, LoggerError> {
        self.validate()?;
        let filter = self.env_filter()?;

        let mut layers = Vec::new();
        if self.console {
            layers.push(layer().compact().with_writer(std::io::stderr).with_ansi(true).boxed());
        }

        let guard = match &self.directory {
            Some(directory) => {
                fs::create_dir_all(directory).map_err(|e| LoggerError::Internal {
                    message: e.to_string().into(),
                    context: Some(format!("Failed to create {}", directory.display()).into()),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(self.rotation.clone())
                    .filename_prefix(&self.name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(self.max_files)
                    .build(directory)
                    .context("Failed to open log file")?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file = layer().with_writer(writer).with_ansi(false);
                layers.push(if self.json { file.json().boxed() } else { file.boxed() });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled. Enable the console or set a directory.".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Logger name cannot be empty".into(),
                context: None,
            });
        }
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        Ok(())
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.directive {
            Some(directive) => builder.parse(directive).map_err(|e| {
                LoggerError::InvalidConfiguration {
                    message: format!("Invalid filter '{directive}': {e}").into(),
                    context: None,
                }
            }),
            None => Ok(builder.from_env_lossy()),
        }
    }
}

/// Handle to the installed logging system.
#[must_use = "Dropping this handle stops file output."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a builder. `name` prefixes rolling log files (e.g., `manage.2026-10-18.log`).
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        let defaults = LoggingSettings::default();
        LoggerBuilder {
            name: name.into(),
            console: defaults.console,
            level: LevelFilter::INFO,
            directive: defaults.filter,
            directory: defaults.directory,
            rotation: Rotation::DAILY,
            max_files: defaults.max_files,
            json: defaults.json,
        }
    }

    /// Builder preset from the `logging` settings section.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &LoggingSettings,
    ) -> Result<LoggerBuilder, LoggerError> {
        let level = LevelFilter::from_str(&settings.level).map_err(|_| {
            LoggerError::InvalidConfiguration {
                message: format!("Unknown log level '{}'", settings.level).into(),
                context: Some("logging.level".into()),
            }
        })?;

        let mut builder = Self::builder(name)
            .console(settings.console)
            .level(level)
            .max_files(settings.max_files)
            .json(settings.json);
        if let Some(directive) = &settings.filter {
            builder = builder.directive(directive.clone());
        }
        if let Some(directory) = &settings.directory {
            builder = builder.directory(directory.clone());
        }
        Ok(builder)
    }

    /// Whether file output is active.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Logging shutting down, flushing file output");
        }
    }
}
