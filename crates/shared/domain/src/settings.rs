use crate::constants::DEFAULT_AUTH_USER_MODEL;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Process-wide framework settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsInner {
    /// Application identifiers in installation order.
    pub installed_apps: Vec<String>,
    pub secret_key: String,
    pub debug: bool,
    /// `app_label.ModelName` of the active user model.
    pub auth_user_model: String,
    pub logging: LoggingSettings,
}

/// Thin Arc-wrapped settings for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(flatten, default)]
    inner: Arc<SettingsInner>,
}

impl Settings {
    pub fn new(inner: SettingsInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

impl Deref for Settings {
    type Target = SettingsInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Settings {
    fn deref_mut(&mut self) -> &mut SettingsInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub console: bool,
    /// Default level directive (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Directory for rolling log files; no file output when absent.
    pub directory: Option<PathBuf>,
    pub json: bool,
    /// Explicit `EnvFilter` directives, e.g. `trellis_apps=debug`.
    pub filter: Option<String>,
    pub max_files: usize,
}

// --- Default ---

impl Default for SettingsInner {
    fn default() -> Self {
        Self {
            installed_apps: Vec::new(),
            secret_key: String::new(),
            debug: false,
            auth_user_model: DEFAULT_AUTH_USER_MODEL.to_owned(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            console: true,
            level: "info".to_owned(),
            directory: None,
            json: false,
            filter: None,
            max_files: 10,
        }
    }
}
