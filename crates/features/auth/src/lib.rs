//! Authentication feature slice.
//!
//! Provides `Permission`, `Group` and the swappable `User` model. Projects that
//! bring their own user model point `auth_user_model` at it; `auth.User` is then
//! registered as swapped and its implicit through tables are left out.

mod models;

pub use models::register_models;

use std::sync::Arc;
use tracing::{debug, info};
use trellis_apps::{AppConfigClass, Apps, AppsError, Module, ModuleRegistry, ModelRef};
use trellis_kernel::Settings;
use trellis_kernel::domain::constants::AUTH_USER_MODEL;

pub const APP_NAME: &str = "trellis.contrib.auth";
pub const APP_LABEL: &str = "auth";
pub const CONFIG_CLASS: &str = "AuthConfig";

/// Registers the `trellis.contrib.auth` package, its `apps` and `models` modules.
pub fn install(modules: &mut ModuleRegistry, settings: &Settings) {
    let user_model: Arc<str> = Arc::from(settings.auth_user_model.as_str());
    let apps_module = format!("{APP_NAME}.apps");

    let models_user = Arc::clone(&user_model);
    modules
        .register(
            Module::new(APP_NAME)
                .path(concat!(env!("CARGO_MANIFEST_DIR"), "/src"))
                .default_app_config(format!("{apps_module}.{CONFIG_CLASS}")),
        )
        .register(Module::new(apps_module).app_config(CONFIG_CLASS, config_class(user_model)))
        .register(
            Module::new(format!("{APP_NAME}.models"))
                .body(move |apps| register_models(apps, &models_user)),
        );

    debug!(app = APP_NAME, user_model = %settings.auth_user_model, "Auth slice installed");
}

/// The `AuthConfig` descriptor class. Its `ready` hook checks that the
/// configured user model is installed.
#[must_use]
pub fn config_class(user_model: Arc<str>) -> AppConfigClass {
    AppConfigClass::new()
        .name(APP_NAME)
        .label(APP_LABEL)
        .verbose_name("Authentication and Authorization")
        .on_ready(move |_, apps| {
            let user = get_user_model(apps, &user_model)?;
            info!(user_model = %user.opts().label(), "Auth ready");
            Ok(())
        })
}

/// Resolves the user model named by `auth_user_model`.
///
/// Works as soon as app descriptors are loaded; the owning app's models are
/// imported on demand.
///
/// # Errors
/// Returns [`AppsError::ImproperlyConfigured`] if the reference is malformed or
/// names a model that isn't installed.
pub fn get_user_model(apps: &Apps, reference: &str) -> Result<ModelRef, AppsError> {
    match apps.get_model_with(reference, None, false) {
        Err(AppsError::InvalidReference { .. }) => Err(AppsError::ImproperlyConfigured {
            message: format!("{AUTH_USER_MODEL} must be of the form 'app_label.model_name'").into(),
            context: None,
        }),
        Err(err) if err.is_not_found() => Err(AppsError::ImproperlyConfigured {
            message: format!(
                "{AUTH_USER_MODEL} refers to model '{reference}' that has not been installed"
            )
            .into(),
            context: None,
        }),
        result => result,
    }
}
