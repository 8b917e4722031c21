//! Content types feature slice.
//!
//! Ships the `ContentType` model every other slice points its generic relations at.

use tracing::debug;
use trellis_apps::{AppConfigClass, ModelClass, ModelOptions, Module, ModuleRegistry};
use trellis_kernel::Settings;

pub const APP_NAME: &str = "trellis.contrib.contenttypes";
pub const APP_LABEL: &str = "contenttypes";
pub const CONFIG_CLASS: &str = "ContentTypesConfig";

/// Registers the `trellis.contrib.contenttypes` package, its `apps` and `models` modules.
pub fn install(modules: &mut ModuleRegistry, _settings: &Settings) {
    let apps_module = format!("{APP_NAME}.apps");
    let models_module = format!("{APP_NAME}.models");

    modules
        .register(
            Module::new(APP_NAME)
                .path(concat!(env!("CARGO_MANIFEST_DIR"), "/src"))
                .default_app_config(format!("{apps_module}.{CONFIG_CLASS}")),
        )
        .register(Module::new(apps_module).app_config(CONFIG_CLASS, config_class()))
        .register(Module::new(models_module.clone()).body(move |apps| {
            apps.register_model(
                APP_LABEL,
                ModelClass::shared(ModelOptions::new(APP_LABEL, "ContentType", &models_module)),
            )
        }));

    debug!(app = APP_NAME, "Content types slice installed");
}

#[must_use]
pub fn config_class() -> AppConfigClass {
    AppConfigClass::new().name(APP_NAME).label(APP_LABEL).verbose_name("Content Types")
}
