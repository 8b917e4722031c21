//! Admin feature slice.
//!
//! Owns the `LogEntry` change log. `AdminConfig` imports every installed app's
//! `admin` submodule once the registry is ready, `SimpleAdminConfig` leaves that
//! to the project.

use std::sync::Arc;
use tracing::{debug, info};
use trellis_apps::{
    AppConfigClass, Apps, AppsError, ModelClass, ModelKey, ModelOptions, Module, ModuleRegistry,
    autodiscover_modules,
};
use trellis_kernel::Settings;
use trellis_kernel::domain::constants::AUTH_USER_MODEL;

pub const APP_NAME: &str = "trellis.contrib.admin";
pub const APP_LABEL: &str = "admin";
pub const CONFIG_CLASS: &str = "AdminConfig";
pub const SIMPLE_CONFIG_CLASS: &str = "SimpleAdminConfig";

/// Submodule name looked up in every installed app.
pub const DISCOVERY_MODULE: &str = "admin";

/// Registers the `trellis.contrib.admin` package, its `apps` and `models` modules.
pub fn install(modules: &mut ModuleRegistry, settings: &Settings) {
    let apps_module = format!("{APP_NAME}.apps");
    let user_model: Arc<str> = Arc::from(settings.auth_user_model.as_str());

    modules
        .register(
            Module::new(APP_NAME)
                .path(concat!(env!("CARGO_MANIFEST_DIR"), "/src"))
                .default_app_config(format!("{apps_module}.{CONFIG_CLASS}")),
        )
        .register(
            Module::new(apps_module)
                .app_config(CONFIG_CLASS, config_class())
                .app_config(SIMPLE_CONFIG_CLASS, simple_config_class()),
        )
        .register(
            Module::new(format!("{APP_NAME}.models"))
                .body(move |apps| register_models(apps, &user_model)),
        );

    debug!(app = APP_NAME, "Admin slice installed");
}

/// Admin without automatic discovery of `admin` submodules.
#[must_use]
pub fn simple_config_class() -> AppConfigClass {
    AppConfigClass::new().name(APP_NAME).label(APP_LABEL).verbose_name("Administration")
}

/// The default admin descriptor class.
#[must_use]
pub fn config_class() -> AppConfigClass {
    simple_config_class().on_ready(|_, apps| {
        let discovered = autodiscover_modules(apps, &[DISCOVERY_MODULE])?;
        info!(modules = discovered.len(), "Admin modules discovered");
        Ok(())
    })
}

fn register_models(apps: &Apps, user_model: &str) -> Result<(), AppsError> {
    let user = ModelKey::parse(user_model).ok_or_else(|| AppsError::ImproperlyConfigured {
        message: format!("{AUTH_USER_MODEL} must be of the form 'app_label.model_name'").into(),
        context: None,
    })?;

    let log_entry = Arc::new(ModelClass::new(ModelOptions::new(
        APP_LABEL,
        "LogEntry",
        format!("{APP_NAME}.models"),
    )));

    let target = Arc::clone(&log_entry);
    apps.lazy_model_operation([user, ModelKey::new("contenttypes", "ContentType")], move |models| {
        if let [user, content_type] = models.as_slice() {
            target.relate("user", user.as_ref());
            target.relate("content_type", content_type.as_ref());
        }
    });

    apps.register_model(APP_LABEL, log_entry)
}
