//! Application descriptors.

use crate::error::AppsError;
use crate::model::ModelRef;
use crate::module::{Module, Symbol};
use crate::registry::{Apps, AppsInner, ModelMap};
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use trellis_domain::constants::MODELS_MODULE_NAME;
use trellis_domain::filter::ModelFilter;

/// Startup code run once the registry is fully populated.
pub type ReadyHook = Arc<dyn Fn(&AppConfig, &Apps) -> Result<(), AppsError> + Send + Sync>;

/// A descriptor class: the overridable parts of an [`AppConfig`].
///
/// Every field left unset is derived from the app module when the descriptor
/// is built.
#[derive(Clone, Default)]
pub struct AppConfigClass {
    name: Option<String>,
    label: Option<String>,
    verbose_name: Option<String>,
    path: Option<PathBuf>,
    ready: Option<ReadyHook>,
}

impl AppConfigClass {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full dotted path of the application module. Required when the class is
    /// referenced directly from installed apps.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn on_ready<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AppConfig, &Apps) -> Result<(), AppsError> + Send + Sync + 'static,
    {
        self.ready = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn app_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for AppConfigClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfigClass")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("verbose_name", &self.verbose_name)
            .field("path", &self.path)
            .field("ready", &self.ready.is_some())
            .finish()
    }
}

/// One item of the installed-apps list.
#[derive(Debug, Clone)]
pub enum AppEntry {
    /// Dotted path of an app module or of a descriptor class.
    Name(String),
    /// An already constructed descriptor.
    Config(Arc<AppConfig>),
}

impl From<&str> for AppEntry {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for AppEntry {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for AppEntry {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<AppConfig> for AppEntry {
    fn from(config: AppConfig) -> Self {
        Self::Config(Arc::new(config))
    }
}

impl From<Arc<AppConfig>> for AppEntry {
    fn from(config: Arc<AppConfig>) -> Self {
        Self::Config(config)
    }
}

/// Metadata for one installed application.
pub struct AppConfig {
    name: String,
    label: String,
    verbose_name: String,
    path: PathBuf,
    module: Arc<Module>,
    models_module: RwLock<Option<Arc<Module>>>,
    // `None` until the model-binding phase: not safe to read before then.
    models: RwLock<Option<ModelMap>>,
    apps: RwLock<Weak<AppsInner>>,
    ready: Option<ReadyHook>,
}

impl AppConfig {
    /// Builds a descriptor for `name` backed by `module`, applying the
    /// overrides of `class`.
    ///
    /// # Errors
    /// Returns [`AppsError::ImproperlyConfigured`] when no path is given and the
    /// module has zero or several filesystem locations.
    pub fn new(
        name: impl Into<String>,
        module: Arc<Module>,
        class: &AppConfigClass,
    ) -> Result<Self, AppsError> {
        let name = name.into();
        let label = class
            .label
            .clone()
            .unwrap_or_else(|| name.rsplit('.').next().unwrap_or(&name).to_owned());
        let verbose_name = class.verbose_name.clone().unwrap_or_else(|| title_case(&label));
        let path = match &class.path {
            Some(path) => path.clone(),
            None => path_from_module(&module)?,
        };

        Ok(Self {
            name,
            label,
            verbose_name,
            path,
            module,
            models_module: RwLock::new(None),
            models: RwLock::new(None),
            apps: RwLock::new(Weak::new()),
            ready: class.ready.clone(),
        })
    }

    /// Builds a descriptor from one installed-apps string.
    ///
    /// `entry` is either an app module path (optionally pointing at a descriptor
    /// class through its default-config override) or the path of a descriptor
    /// class itself.
    ///
    /// # Errors
    /// * [`AppsError::Import`] if `entry` resolves to nothing.
    /// * [`AppsError::ImproperlyConfigured`] for a symbol that isn't a descriptor
    ///   class, a class without `name`, an unimportable `name` or an ambiguous path.
    pub fn create(entry: &str, apps: &Apps) -> Result<Self, AppsError> {
        let modules = apps.modules();

        let mut import_error = None;
        let class_path = match modules.import(entry, apps) {
            Ok(module) => match module.default_app_config_path() {
                Some(path) => path.to_owned(),
                None => return Self::new(entry, module, &AppConfigClass::default()),
            },
            Err(err) if err.is_import() => {
                if !entry.contains('.') {
                    return Err(err);
                }
                import_error = Some(err);
                entry.to_owned()
            },
            Err(err) => return Err(err),
        };

        let (mod_path, cls_name) = class_path.rsplit_once('.').unwrap_or(("", &class_path));

        let symbol = match modules.import(mod_path, apps) {
            Ok(module) => module.get_symbol(cls_name).cloned(),
            Err(err) => return Err(import_error.unwrap_or(err)),
        };
        let symbol = match (symbol, import_error) {
            (Some(symbol), _) => symbol,
            // The entry wasn't a module either; the first error says more.
            (None, Some(err)) => return Err(err),
            (None, None) => {
                return Err(AppsError::improperly_configured(format!(
                    "Module '{mod_path}' has no attribute '{cls_name}'."
                )));
            },
        };

        let Symbol::AppConfig(class) = symbol else {
            return Err(AppsError::improperly_configured(format!(
                "'{class_path}' isn't a subclass of AppConfig."
            )));
        };

        let Some(app_name) = class.name.clone() else {
            return Err(AppsError::improperly_configured(format!(
                "'{class_path}' must supply a name attribute."
            )));
        };

        let app_module = modules.import(&app_name, apps).map_err(|_| {
            AppsError::improperly_configured(format!(
                "Cannot import '{app_name}'. Check that '{mod_path}.{cls_name}.name' is correct."
            ))
        })?;

        debug!(entry, app = %app_name, "Resolved app config class");
        Self::new(app_name, app_module, &class)
    }

    /// Full dotted path, e.g. `trellis.contrib.admin`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short unique identifier, e.g. `admin`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn verbose_name(&self) -> &str {
        &self.verbose_name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// The imported `<name>.models` module, if the app has one and it was imported.
    #[must_use]
    pub fn models_module(&self) -> Option<Arc<Module>> {
        self.models_module.read().clone()
    }

    /// Whether the model mapping has been bound.
    #[must_use]
    pub fn models_loaded(&self) -> bool {
        self.models.read().is_some()
    }

    /// The registry this descriptor belongs to.
    ///
    /// # Errors
    /// Returns [`AppsError::NotReady`] before the descriptor is installed in a live registry.
    pub fn apps(&self) -> Result<Apps, AppsError> {
        self.apps.read().upgrade().map(Apps::from_inner).ok_or_else(|| {
            AppsError::not_ready(format!("App '{}' isn't bound to a registry.", self.label))
        })
    }

    /// Returns the model with the given case-insensitive name.
    ///
    /// # Errors
    /// * [`AppsError::NotReady`] if the registry hasn't reached the required phase or
    ///   this app's models aren't bound yet.
    /// * [`AppsError::NotFound`] if the app has no such model.
    pub fn get_model(&self, model_name: &str, require_ready: bool) -> Result<ModelRef, AppsError> {
        let apps = self.apps()?;
        if require_ready {
            apps.check_models_ready()?;
        } else {
            apps.check_apps_ready()?;
        }

        let models = self.models.read().clone().ok_or_else(|| {
            AppsError::not_ready(format!("Models for app '{}' aren't loaded yet.", self.label))
        })?;
        let model = models.read().get(&model_name.to_lowercase()).cloned();
        model.ok_or_else(|| {
            AppsError::not_found(format!(
                "App '{}' doesn't have a '{model_name}' model.",
                self.label
            ))
        })
    }

    /// Returns this app's models in registration order.
    ///
    /// # Errors
    /// Returns [`AppsError::NotReady`] before models are loaded.
    pub fn get_models(&self, filter: ModelFilter) -> Result<Vec<ModelRef>, AppsError> {
        self.apps()?.check_models_ready()?;
        Ok(self.filtered_models(filter))
    }

    pub(crate) fn filtered_models(&self, filter: ModelFilter) -> Vec<ModelRef> {
        let Some(models) = self.models.read().clone() else {
            return Vec::new();
        };
        let models = models.read();
        models
            .values()
            .filter(|model| filter.auto_created() || !model.opts().auto_created)
            .filter(|model| filter.swapped() || !model.opts().is_swapped())
            .cloned()
            .collect()
    }

    pub(crate) fn bind(&self, apps: &Apps) {
        *self.apps.write() = apps.downgrade();
    }

    /// Binds the model mapping to the registry and imports `<name>.models`.
    pub(crate) fn import_models(&self, apps: &Apps) -> Result<(), AppsError> {
        *self.models.write() = Some(apps.app_models(&self.label));

        let modules = apps.modules();
        if modules.has_submodule(&self.module, MODELS_MODULE_NAME) {
            let module =
                modules.import(&format!("{}.{MODELS_MODULE_NAME}", self.name), apps)?;
            *self.models_module.write() = Some(module);
        }
        Ok(())
    }

    pub(crate) fn run_ready(&self, apps: &Apps) -> Result<(), AppsError> {
        if let Some(hook) = &self.ready {
            info!(app = %self.label, "Running ready hook");
            hook(self, apps)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("verbose_name", &self.verbose_name)
            .field("path", &self.path)
            .field("models_loaded", &self.models_loaded())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<AppConfig: {}>", self.label)
    }
}

/// Derives the single filesystem location of an app module.
fn path_from_module(module: &Module) -> Result<PathBuf, AppsError> {
    let mut paths = module.paths().to_vec();
    if paths.len() != 1 {
        if let Some(parent) = module.file_path().and_then(Path::parent) {
            paths = vec![parent.to_path_buf()];
        } else {
            let mut seen = Vec::with_capacity(paths.len());
            for path in paths {
                if !seen.contains(&path) {
                    seen.push(path);
                }
            }
            paths = seen;
        }
    }

    match paths.as_slice() {
        [path] => Ok(path.clone()),
        [] => Err(AppsError::improperly_configured(format!(
            "The app module {module} has no filesystem location, you must configure this app \
             with an AppConfig subclass with a 'path' class attribute."
        ))),
        many => Err(AppsError::improperly_configured(format!(
            "The app module {module} has multiple filesystem locations ({many:?}); you must \
             configure this app with an AppConfig subclass with a 'path' class attribute."
        ))),
    }
}

/// Capitalizes the first letter of every alphabetic run, lowercasing the rest.
fn title_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut boundary = true;
    for ch in label.chars() {
        if ch.is_alphabetic() {
            if boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(ch);
            boundary = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_matches_label_conventions() {
        assert_eq!(title_case("auth"), "Auth");
        assert_eq!(title_case("content_types"), "Content_Types");
        assert_eq!(title_case("oAuth2client"), "Oauth2Client");
    }

    #[test]
    fn path_prefers_single_location_then_file_parent() {
        let package = Module::new("blog").path("/srv/blog");
        assert_eq!(path_from_module(&package).unwrap(), PathBuf::from("/srv/blog"));

        let plain = Module::new("blog").file("/srv/blog.rs");
        assert_eq!(path_from_module(&plain).unwrap(), PathBuf::from("/srv"));

        let duplicated = Module::new("blog").path("/srv/blog").path("/srv/blog");
        assert_eq!(path_from_module(&duplicated).unwrap(), PathBuf::from("/srv/blog"));
    }

    #[test]
    fn path_rejects_zero_or_many_locations() {
        let err = path_from_module(&Module::new("ghost")).unwrap_err();
        assert!(err.to_string().contains("has no filesystem location"));

        let split = Module::new("split").path("/a/split").path("/b/split");
        let err = path_from_module(&split).unwrap_err();
        assert!(err.to_string().contains("multiple filesystem locations"));
    }

    #[test]
    fn new_derives_label_and_verbose_name() {
        let module = Arc::new(Module::new("shop.catalog").path("/srv/catalog"));
        let config = AppConfig::new("shop.catalog", module, &AppConfigClass::new()).unwrap();
        assert_eq!(config.label(), "catalog");
        assert_eq!(config.verbose_name(), "Catalog");
        assert!(!config.models_loaded());
        assert!(config.apps().is_err());
        assert_eq!(config.to_string(), "<AppConfig: catalog>");
    }

    #[test]
    fn new_applies_overrides() {
        let module = Arc::new(Module::new("shop.catalog"));
        let class = AppConfigClass::new()
            .label("products")
            .verbose_name("Product catalog")
            .path("/opt/catalog");
        let config = AppConfig::new("shop.catalog", module, &class).unwrap();
        assert_eq!(config.label(), "products");
        assert_eq!(config.verbose_name(), "Product catalog");
        assert_eq!(config.path(), Path::new("/opt/catalog"));
    }
}
