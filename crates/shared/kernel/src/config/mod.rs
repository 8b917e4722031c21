use config::{Config, Environment, File};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trellis_domain::constants::{DEFAULT_SETTINGS_FILE, SETTINGS_ENV_PREFIX, SETTINGS_ENV_VAR};
use trellis_domain::settings::Settings;

/// Errors raised while resolving settings.
#[trellis_derive::trellis_error]
pub enum SettingsError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Improperly configured{}: {message}", format_context(.context))]
    ImproperlyConfigured { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Loads [`Settings`] by layering a settings file and environment overrides over the defaults.
///
/// This function implements a layered configuration strategy:
/// 1. **Defaults**: every field falls back to its `serde` default.
/// 2. **Settings File**: `path` when given, otherwise the file named by `TRELLIS_SETTINGS`,
///    otherwise `settings.{toml,json,...}` in the working directory. Only the implicit
///    working-directory file may be absent.
/// 3. **Environment Overrides**: variables prefixed with `TRELLIS__`, nested with `__`
///    (e.g., `TRELLIS__LOGGING__LEVEL=debug`). `TRELLIS__INSTALLED_APPS` is a comma-separated list.
///
/// # Errors
/// * [`SettingsError::Config`] if an explicit settings file is missing or any layer fails to
///   deserialize.
/// * [`SettingsError::ImproperlyConfigured`] if the resolved settings fail validation.
pub fn load_settings(path: Option<impl AsRef<Path>>) -> Result<Settings, SettingsError> {
    let (source, required) = match path {
        Some(p) => (p.as_ref().to_path_buf(), true),
        None => std::env::var_os(SETTINGS_ENV_VAR).map_or_else(
            || (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
            |p| (PathBuf::from(p), true),
        ),
    };

    info!("Loading settings from {}", source.display());

    let builder = Config::builder()
        .add_source(File::from(source.as_path()).required(required))
        .add_source(
            Environment::with_prefix(SETTINGS_ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("installed_apps"),
        );

    let settings = builder
        .build()
        .context("Failed to build settings")?
        .try_deserialize::<Settings>()
        .context("Failed to deserialize settings")?;

    validate_settings(&settings)?;
    debug!(apps = settings.installed_apps.len(), "Settings resolved");

    Ok(settings)
}

/// Checks the invariants every entry point relies on.
///
/// # Errors
/// Returns [`SettingsError::ImproperlyConfigured`] for an empty secret key or a blank
/// installed-app entry.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.secret_key.trim().is_empty() {
        return Err(SettingsError::ImproperlyConfigured {
            message: "The SECRET_KEY setting must not be empty.".into(),
            context: None,
        });
    }

    if let Some(position) = settings.installed_apps.iter().position(|app| app.trim().is_empty()) {
        return Err(SettingsError::ImproperlyConfigured {
            message: format!("The INSTALLED_APPS setting has a blank entry at position {position}.")
                .into(),
            context: None,
        });
    }

    Ok(())
}
