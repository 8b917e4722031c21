//! Per-app submodule discovery.

use crate::error::AppsError;
use crate::registry::Apps;
use tracing::debug;

/// Imports `<app>.<name>` for every installed app that ships such a submodule.
///
/// Apps are visited in installation order and `names` in the given order for
/// each app. Returns the dotted paths that were imported.
///
/// # Errors
/// * [`AppsError::NotReady`] before descriptors are loaded.
/// * Whatever an imported module body returns.
pub fn autodiscover_modules(apps: &Apps, names: &[&str]) -> Result<Vec<String>, AppsError> {
    let modules = apps.modules();
    let mut imported = Vec::new();

    for config in apps.get_app_configs()? {
        for name in names {
            if !modules.has_submodule(config.module(), name) {
                continue;
            }
            let path = format!("{}.{name}", config.name());
            modules.import(&path, apps)?;
            debug!(module = %path, "Autodiscovered module");
            imported.push(path);
        }
    }

    Ok(imported)
}
