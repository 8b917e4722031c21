//! Facade crate for the trellis registry and its bundled apps.
//! Re-exports the registry, settings and domain primitives and wires the bundled
//! apps into a module resolver.
//! Keep this crate thin: it composes other crates, it doesn't implement registry logic.
//!
//! ## Usage
//! ```rust
//! # use trellis::{ModuleRegistry, Settings, setup};
//! # use trellis::kernel::domain::settings::SettingsInner;
//! let settings = Settings::new(SettingsInner {
//!     installed_apps: vec!["trellis.contrib.contenttypes".to_owned(), "trellis.contrib.auth".to_owned()],
//!     ..SettingsInner::default()
//! });
//! let apps = setup(&settings, ModuleRegistry::new()).unwrap();
//! assert!(apps.get_model("auth.User", None).is_ok());
//! ```

use std::borrow::Cow;
use std::path::Path;
use tracing::info;

pub use trellis_apps as apps;
pub use trellis_apps::{
    AppConfig, AppConfigClass, Apps, AppsError, Model, ModelClass, ModelFilter, ModelKey,
    ModelOptions, ModelRef, Module, ModuleRegistry, autodiscover_modules,
};
pub use trellis_domain as domain;
pub use trellis_kernel as kernel;
pub use trellis_kernel::Settings;
pub use trellis_kernel::config::{SettingsError, load_settings};

/// Bundled apps, gated by Cargo features.
pub mod contrib {
    #[cfg(feature = "admin")]
    pub use trellis_admin as admin;
    #[cfg(feature = "auth")]
    pub use trellis_auth as auth;
    #[cfg(feature = "contenttypes")]
    pub use trellis_contenttypes as contenttypes;

    /// Build-time enabled bundled apps (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "contenttypes")]
        "contenttypes",
        #[cfg(feature = "auth")]
        "auth",
        #[cfg(feature = "admin")]
        "admin",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Errors raised while bootstrapping a process.
#[trellis_derive::trellis_error]
pub enum SetupError {
    #[error("Settings error{}: {source}", format_context(.context))]
    Settings { source: SettingsError, context: Option<Cow<'static, str>> },

    #[error("App registry error{}: {source}", format_context(.context))]
    Apps { source: AppsError, context: Option<Cow<'static, str>> },
}

/// Adds every enabled bundled app to `modules`.
pub fn install_contrib(modules: &mut ModuleRegistry, settings: &Settings) {
    #[cfg(feature = "contenttypes")]
    contrib::contenttypes::install(modules, settings);
    #[cfg(feature = "auth")]
    contrib::auth::install(modules, settings);
    #[cfg(feature = "admin")]
    contrib::admin::install(modules, settings);
    #[cfg(not(feature = "contenttypes"))]
    let _ = (modules, settings);
}

/// Builds the process registry: bundled apps plus the project's `modules`,
/// populated from `settings.installed_apps`.
///
/// Project modules win over bundled ones registered under the same path.
///
/// # Errors
/// Returns [`SetupError::Apps`] if population fails.
pub fn setup(settings: &Settings, modules: ModuleRegistry) -> Result<Apps, SetupError> {
    let mut resolver = ModuleRegistry::new();
    install_contrib(&mut resolver, settings);
    resolver.extend(modules);

    let apps = Apps::new(resolver);
    apps.populate(&settings.installed_apps).context("Failed to populate the app registry")?;
    info!(apps = settings.installed_apps.len(), "Registry bootstrapped");
    Ok(apps)
}

/// Loads settings (see [`load_settings`]) and runs [`setup`] with them.
///
/// # Errors
/// * [`SetupError::Settings`] if settings can't be loaded or validated.
/// * [`SetupError::Apps`] if population fails.
pub fn bootstrap(
    path: Option<&Path>,
    modules: ModuleRegistry,
) -> Result<(Settings, Apps), SetupError> {
    let settings = load_settings(path).context("Failed to load settings")?;
    let apps = setup(&settings, modules)?;
    Ok((settings, apps))
}
