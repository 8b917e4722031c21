//! The application registry.
//!
//! [`Apps`] is built once at process start, populated from the installed-apps
//! list and then shared by reference (it is a cheap `Arc` clone) with every
//! component that needs app or model lookups.

use crate::config::{AppConfig, AppEntry};
use crate::error::AppsError;
use crate::model::ModelRef;
use crate::module::ModuleRegistry;
use crate::pending::PendingOperation;
use fxhash::FxHashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use trellis_domain::filter::ModelFilter;
use trellis_domain::model::{ModelKey, ModelOptions};

/// Lowercased model name to model, for one app label.
pub(crate) type ModelMap = Arc<RwLock<IndexMap<String, ModelRef>>>;

type AppConfigs = IndexMap<String, Arc<AppConfig>>;

#[derive(Default)]
struct State {
    app_configs: AppConfigs,
    stored_app_configs: Vec<AppConfigs>,
}

/// `generation` moves on every [`Apps::clear_cache`]; results computed under an
/// older generation are returned but not stored.
#[derive(Default)]
struct Memo {
    generation: u64,
    models: FxHashMap<ModelFilter, Arc<[ModelRef]>>,
    swappable: FxHashMap<String, Option<String>>,
}

pub(crate) struct AppsInner {
    modules: ModuleRegistry,
    state: RwLock<State>,
    all_models: RwLock<FxHashMap<String, ModelMap>>,
    pending: Mutex<FxHashMap<ModelKey, Vec<PendingOperation>>>,
    memo: Mutex<Memo>,
    populate_lock: ReentrantMutex<()>,
    loading: AtomicBool,
    apps_ready: AtomicBool,
    models_ready: AtomicBool,
    ready: AtomicBool,
}

/// Registry of installed applications and their models.
#[derive(Clone)]
pub struct Apps {
    inner: Arc<AppsInner>,
}

impl Apps {
    /// Creates an empty, unpopulated registry resolving app paths against `modules`.
    #[must_use]
    pub fn new(modules: ModuleRegistry) -> Self {
        Self {
            inner: Arc::new(AppsInner {
                modules,
                state: RwLock::new(State::default()),
                all_models: RwLock::new(FxHashMap::default()),
                pending: Mutex::new(FxHashMap::default()),
                memo: Mutex::new(Memo::default()),
                populate_lock: ReentrantMutex::new(()),
                loading: AtomicBool::new(false),
                apps_ready: AtomicBool::new(false),
                models_ready: AtomicBool::new(false),
                ready: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a registry and populates it right away.
    ///
    /// # Errors
    /// Any error from [`Apps::populate`].
    pub fn with_installed<I, E>(modules: ModuleRegistry, installed: I) -> Result<Self, AppsError>
    where
        I: IntoIterator<Item = E>,
        E: Into<AppEntry>,
    {
        let apps = Self::new(modules);
        apps.populate(installed)?;
        Ok(apps)
    }

    pub(crate) const fn from_inner(inner: Arc<AppsInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<AppsInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn pending_table(&self) -> &Mutex<FxHashMap<ModelKey, Vec<PendingOperation>>> {
        &self.inner.pending
    }

    #[must_use]
    pub fn modules(&self) -> &ModuleRegistry {
        &self.inner.modules
    }

    #[must_use]
    pub fn apps_ready(&self) -> bool {
        self.inner.apps_ready.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn models_ready(&self) -> bool {
        self.inner.models_ready.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    /// Loads application descriptors and models, then runs every `ready` hook.
    ///
    /// Idempotent once the registry is ready. Concurrent first calls are
    /// serialized; the losers return as soon as the winner finishes.
    ///
    /// On failure the registry is left unpopulated. Models registered by the
    /// imports that did run stay registered.
    ///
    /// # Errors
    /// * [`AppsError::Reentrant`] if called from inside a running population.
    /// * [`AppsError::ImproperlyConfigured`] for unresolvable entries or duplicate
    ///   labels and names.
    /// * Whatever a module body or `ready` hook returns.
    pub fn populate<I, E>(&self, installed: I) -> Result<(), AppsError>
    where
        I: IntoIterator<Item = E>,
        E: Into<AppEntry>,
    {
        if self.ready() {
            return Ok(());
        }

        let _guard = self.inner.populate_lock.lock();
        if self.ready() {
            return Ok(());
        }
        if self.inner.loading.swap(true, Ordering::AcqRel) {
            return Err(AppsError::Reentrant { context: None });
        }

        let entries: Vec<AppEntry> = installed.into_iter().map(Into::into).collect();
        info!(apps = entries.len(), "Populating app registry");

        let result = self.run_phases(entries);
        if let Err(err) = &result {
            warn!(error = %err, "App registry population failed, resetting");
            self.reset();
        }
        self.inner.loading.store(false, Ordering::Release);
        result
    }

    fn run_phases(&self, entries: Vec<AppEntry>) -> Result<(), AppsError> {
        // Phase 1: descriptors.
        let mut configs = Vec::with_capacity(entries.len());
        for entry in entries {
            let config = match entry {
                AppEntry::Config(config) => config,
                AppEntry::Name(name) => Arc::new(AppConfig::create(&name, self)?),
            };
            debug!(app = %config.label(), name = %config.name(), "Loaded app config");
            configs.push(config);
        }
        check_unique(&configs)?;

        for config in &configs {
            config.bind(self);
        }
        self.inner.state.write().app_configs =
            configs.iter().map(|c| (c.label().to_owned(), Arc::clone(c))).collect();
        self.inner.apps_ready.store(true, Ordering::Release);
        info!(apps = configs.len(), "Apps ready");

        // Phase 2: models.
        for config in &configs {
            config.import_models(self)?;
        }
        self.clear_cache();
        self.inner.models_ready.store(true, Ordering::Release);
        info!("Models ready");

        // Phase 3: startup hooks.
        for config in &configs {
            config.run_ready(self)?;
        }
        self.inner.ready.store(true, Ordering::Release);
        info!("App registry ready");

        Ok(())
    }

    fn reset(&self) {
        self.inner.state.write().app_configs.clear();
        self.set_flags(false);
        self.clear_cache();
    }

    fn set_flags(&self, value: bool) {
        self.inner.apps_ready.store(value, Ordering::Release);
        self.inner.models_ready.store(value, Ordering::Release);
        self.inner.ready.store(value, Ordering::Release);
    }

    /// # Errors
    /// Returns [`AppsError::NotReady`] until descriptors are loaded.
    pub fn check_apps_ready(&self) -> Result<(), AppsError> {
        if self.apps_ready() {
            Ok(())
        } else {
            Err(AppsError::not_ready("Apps aren't loaded yet."))
        }
    }

    /// # Errors
    /// Returns [`AppsError::NotReady`] until models are loaded.
    pub fn check_models_ready(&self) -> Result<(), AppsError> {
        if self.models_ready() {
            Ok(())
        } else {
            Err(AppsError::not_ready("Models aren't loaded yet."))
        }
    }

    fn configs(&self) -> Vec<Arc<AppConfig>> {
        self.inner.state.read().app_configs.values().cloned().collect()
    }

    /// Installed descriptors in installation order.
    ///
    /// # Errors
    /// Returns [`AppsError::NotReady`] before phase 1 completes.
    pub fn get_app_configs(&self) -> Result<Vec<Arc<AppConfig>>, AppsError> {
        self.check_apps_ready()?;
        Ok(self.configs())
    }

    /// # Errors
    /// * [`AppsError::NotReady`] before phase 1 completes.
    /// * [`AppsError::NotFound`] if no installed app has this label.
    pub fn get_app_config(&self, app_label: &str) -> Result<Arc<AppConfig>, AppsError> {
        self.check_apps_ready()?;
        let state = self.inner.state.read();
        if let Some(config) = state.app_configs.get(app_label) {
            return Ok(Arc::clone(config));
        }

        let mut message = format!("No installed app with label '{app_label}'.");
        if let Some(config) = state.app_configs.values().find(|c| c.name() == app_label) {
            message.push_str(&format!(" Did you mean '{}'?", config.label()));
        }
        Err(AppsError::not_found(message))
    }

    /// Whether an app with this full name is installed.
    ///
    /// # Errors
    /// Returns [`AppsError::NotReady`] before phase 1 completes.
    pub fn is_installed(&self, app_name: &str) -> Result<bool, AppsError> {
        self.check_apps_ready()?;
        Ok(self.inner.state.read().app_configs.values().any(|c| c.name() == app_name))
    }

    /// The most specific installed app whose name is a dotted prefix of `object_path`.
    ///
    /// # Errors
    /// Returns [`AppsError::NotReady`] before phase 1 completes.
    pub fn get_containing_app_config(
        &self,
        object_path: &str,
    ) -> Result<Option<Arc<AppConfig>>, AppsError> {
        self.check_apps_ready()?;
        let state = self.inner.state.read();
        let containing = state
            .app_configs
            .values()
            .filter(|config| {
                object_path.strip_prefix(config.name()).is_some_and(|rest| {
                    rest.is_empty() || rest.starts_with('.')
                })
            })
            .max_by_key(|config| config.name().len())
            .cloned();
        Ok(containing)
    }

    /// Every installed model, app by app in installation order.
    ///
    /// Auto-created and swapped models are only listed when `filter` asks for them.
    ///
    /// # Errors
    /// Returns [`AppsError::NotReady`] before phase 2 completes.
    pub fn get_models(&self, filter: ModelFilter) -> Result<Arc<[ModelRef]>, AppsError> {
        self.check_models_ready()?;
        let generation = {
            let memo = self.inner.memo.lock();
            if let Some(models) = memo.models.get(&filter) {
                return Ok(Arc::clone(models));
            }
            memo.generation
        };

        let models: Arc<[ModelRef]> =
            self.configs().iter().flat_map(|config| config.filtered_models(filter)).collect();

        let mut memo = self.inner.memo.lock();
        if memo.generation == generation {
            memo.models.insert(filter, Arc::clone(&models));
        }
        Ok(models)
    }

    /// Looks a model up once the registry is fully loaded.
    ///
    /// With `model_name` set to `None`, `app_label` must be `"app_label.ModelName"`.
    /// Model names are case-insensitive.
    ///
    /// # Errors
    /// See [`Apps::get_model_with`].
    pub fn get_model(
        &self,
        app_label: &str,
        model_name: Option<&str>,
    ) -> Result<ModelRef, AppsError> {
        self.get_model_with(app_label, model_name, true)
    }

    /// Like [`Apps::get_model`]. With `require_ready` unset only descriptors must be
    /// loaded; the app's models module is imported on demand.
    ///
    /// # Errors
    /// * [`AppsError::NotReady`] before the required phase.
    /// * [`AppsError::InvalidReference`] for a dotted reference without exactly one dot.
    /// * [`AppsError::NotFound`] for an unknown app or model.
    pub fn get_model_with(
        &self,
        app_label: &str,
        model_name: Option<&str>,
        require_ready: bool,
    ) -> Result<ModelRef, AppsError> {
        if require_ready {
            self.check_models_ready()?;
        } else {
            self.check_apps_ready()?;
        }

        let (app_label, model_name) = match model_name {
            Some(model_name) => (app_label, model_name),
            None => app_label
                .split_once('.')
                .filter(|(_, model_name)| !model_name.contains('.'))
                .ok_or_else(|| AppsError::InvalidReference {
                    message: format!("'{app_label}' must be of the form 'app_label.ModelName'.")
                        .into(),
                    context: None,
                })?,
        };

        let config = self.get_app_config(app_label)?;
        if !require_ready && !config.models_loaded() {
            config.import_models(self)?;
        }
        config.get_model(model_name, require_ready)
    }

    /// Reads the raw registration table, regardless of install state.
    ///
    /// # Errors
    /// Returns [`AppsError::NotFound`] if nothing is registered under this key.
    pub fn get_registered_model(
        &self,
        app_label: &str,
        model_name: &str,
    ) -> Result<ModelRef, AppsError> {
        let key = ModelKey::new(app_label, model_name);
        self.registered(&key).ok_or_else(|| {
            AppsError::not_found(format!("Model '{app_label}.{model_name}' not registered."))
        })
    }

    pub(crate) fn registered(&self, key: &ModelKey) -> Option<ModelRef> {
        let models = self.inner.all_models.read().get(&key.app_label).cloned()?;
        let model = models.read().get(&key.model_name).cloned();
        model
    }

    /// Records `model` under `app_label`, then fires the deferred operations
    /// waiting for it.
    ///
    /// Registering the same class twice only warns and keeps the first entry.
    ///
    /// # Errors
    /// Returns [`AppsError::Conflict`] if another class already claimed the name.
    pub fn register_model(&self, app_label: &str, model: ModelRef) -> Result<(), AppsError> {
        let model_name = model.opts().model_name();
        let app_models = self.app_models(app_label);

        let registered = {
            let mut models = app_models.write();
            match models.get(&model_name) {
                Some(existing) if existing.opts().same_class(model.opts()) => {
                    warn!(
                        model = %format!("{app_label}.{model_name}"),
                        "Model was already registered. Reloading models is not advised as it \
                         can lead to inconsistencies, most notably with related models"
                    );
                    Arc::clone(existing)
                },
                Some(existing) => {
                    return Err(AppsError::Conflict {
                        message: format!(
                            "Conflicting '{model_name}' models in application '{app_label}': {} and {}.",
                            class_path(existing.opts()),
                            class_path(model.opts()),
                        )
                        .into(),
                        context: None,
                    });
                },
                None => {
                    models.insert(model_name.clone(), Arc::clone(&model));
                    debug!(app = %app_label, model = %model_name, "Registered model");
                    model
                },
            }
        };

        self.run_pending(&ModelKey::new(app_label, &model_name), &registered);
        self.clear_cache();
        Ok(())
    }

    /// The registration slice of `app_label`, created empty when missing.
    pub(crate) fn app_models(&self, app_label: &str) -> ModelMap {
        if let Some(models) = self.inner.all_models.read().get(app_label) {
            return Arc::clone(models);
        }
        Arc::clone(self.inner.all_models.write().entry(app_label.to_owned()).or_default())
    }

    /// Name of the setting that swaps models for `model_string`, if any.
    ///
    /// Matches either the model swapped to `model_string` or the swappable model
    /// whose label is `model_string`. The comparison is exact (`"auth.User"`, not
    /// `"auth.user"`).
    ///
    /// # Errors
    /// Returns [`AppsError::NotReady`] before phase 2 completes.
    pub fn get_swappable_settings_name(
        &self,
        model_string: &str,
    ) -> Result<Option<String>, AppsError> {
        let generation = {
            let memo = self.inner.memo.lock();
            if let Some(setting) = memo.swappable.get(model_string) {
                return Ok(setting.clone());
            }
            memo.generation
        };

        let setting = self.get_models(ModelFilter::INCLUDE_SWAPPED)?.iter().find_map(|model| {
            let opts = model.opts();
            let swapped_to_target = opts.swapped.as_deref() == Some(model_string);
            let is_target = opts.swappable.is_some() && opts.label() == model_string;
            (swapped_to_target || is_target).then(|| opts.swappable.clone()).flatten()
        });

        let mut memo = self.inner.memo.lock();
        if memo.generation == generation {
            memo.swappable.insert(model_string.to_owned(), setting.clone());
        }
        Ok(setting)
    }

    /// Drops memoized lookups and, once ready, expires every installed model's
    /// derived metadata.
    pub fn clear_cache(&self) {
        {
            let mut memo = self.inner.memo.lock();
            memo.generation = memo.generation.wrapping_add(1);
            memo.models.clear();
            memo.swappable.clear();
        }

        if self.ready() {
            for config in self.configs() {
                for model in config.filtered_models(ModelFilter::INCLUDE_AUTO_CREATED) {
                    model.expire_cache();
                }
            }
        }
    }

    /// Restricts the installed set to the apps named in `available`.
    ///
    /// Pair every call with [`Apps::unset_available_apps`].
    ///
    /// # Errors
    /// * [`AppsError::NotReady`] before phase 1 completes.
    /// * [`AppsError::ImproperlyConfigured`] if a name isn't installed.
    pub fn set_available_apps<I, S>(&self, available: I) -> Result<(), AppsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_apps_ready()?;
        let available: Vec<String> = available.into_iter().map(Into::into).collect();

        {
            let mut state = self.inner.state.write();
            let mut extra: Vec<&str> = available
                .iter()
                .map(String::as_str)
                .filter(|name| !state.app_configs.values().any(|c| c.name() == *name))
                .collect();
            if !extra.is_empty() {
                extra.sort_unstable();
                extra.dedup();
                return Err(AppsError::improperly_configured(format!(
                    "Available apps isn't a subset of installed apps, extra apps: {}",
                    extra.join(", ")
                )));
            }

            let narrowed = state
                .app_configs
                .iter()
                .filter(|(_, config)| available.iter().any(|name| name == config.name()))
                .map(|(label, config)| (label.clone(), Arc::clone(config)))
                .collect();
            let current = std::mem::replace(&mut state.app_configs, narrowed);
            state.stored_app_configs.push(current);
        }

        debug!(apps = available.len(), "Narrowed available apps");
        self.clear_cache();
        Ok(())
    }

    /// Cancels the last [`Apps::set_available_apps`].
    ///
    /// # Errors
    /// Returns [`AppsError::Unbalanced`] without a matching `set_available_apps`.
    pub fn unset_available_apps(&self) -> Result<(), AppsError> {
        self.restore("unset_available_apps() called without a matching set_available_apps().")?;
        self.clear_cache();
        Ok(())
    }

    /// Replaces the installed set and repopulates the registry from `installed`.
    ///
    /// Pair every call with [`Apps::unset_installed_apps`]. Models imported while
    /// the replacement set is active stay registered afterwards.
    ///
    /// # Errors
    /// * [`AppsError::NotReady`] unless the registry is ready.
    /// * Any error from [`Apps::populate`].
    pub fn set_installed_apps<I, E>(&self, installed: I) -> Result<(), AppsError>
    where
        I: IntoIterator<Item = E>,
        E: Into<AppEntry>,
    {
        if !self.ready() {
            return Err(AppsError::not_ready("App registry isn't ready yet."));
        }

        let _guard = self.inner.populate_lock.lock();
        {
            let mut state = self.inner.state.write();
            let current = std::mem::take(&mut state.app_configs);
            state.stored_app_configs.push(current);
        }
        self.set_flags(false);
        self.inner.loading.store(false, Ordering::Release);
        self.clear_cache();

        info!("Replacing installed apps");
        self.populate(installed)
    }

    /// Cancels the last [`Apps::set_installed_apps`].
    ///
    /// # Errors
    /// Returns [`AppsError::Unbalanced`] without a matching `set_installed_apps`.
    pub fn unset_installed_apps(&self) -> Result<(), AppsError> {
        let _guard = self.inner.populate_lock.lock();
        self.restore("unset_installed_apps() called without a matching set_installed_apps().")?;
        self.set_flags(true);
        self.clear_cache();
        info!("Restored installed apps");
        Ok(())
    }

    fn restore(&self, misuse: &'static str) -> Result<(), AppsError> {
        let mut state = self.inner.state.write();
        let previous = state.stored_app_configs.pop().ok_or_else(|| AppsError::unbalanced(misuse))?;
        state.app_configs = previous;
        Ok(())
    }
}

impl fmt::Debug for Apps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Apps")
            .field("apps", &state.app_configs.keys().collect::<Vec<_>>())
            .field("apps_ready", &self.apps_ready())
            .field("models_ready", &self.models_ready())
            .field("ready", &self.ready())
            .finish_non_exhaustive()
    }
}

fn class_path(opts: &ModelOptions) -> String {
    format!("{}.{}", opts.module, opts.object_name)
}

/// Collects every duplicated label and full name before failing.
fn check_unique(configs: &[Arc<AppConfig>]) -> Result<(), AppsError> {
    let mut labels: IndexMap<&str, Vec<&str>> = IndexMap::new();
    let mut names: IndexMap<&str, usize> = IndexMap::new();
    for config in configs {
        labels.entry(config.label()).or_default().push(config.name());
        *names.entry(config.name()).or_default() += 1;
    }

    let duplicate_labels: Vec<String> = labels
        .iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(label, names)| format!("'{label}' ({})", names.join(", ")))
        .collect();
    if !duplicate_labels.is_empty() {
        return Err(AppsError::improperly_configured(format!(
            "Application labels aren't unique, duplicates: {}",
            duplicate_labels.join("; ")
        )));
    }

    let duplicate_names: Vec<&str> =
        names.iter().filter(|(_, count)| **count > 1).map(|(name, _)| *name).collect();
    if !duplicate_names.is_empty() {
        return Err(AppsError::improperly_configured(format!(
            "Application names aren't unique, duplicates: {}",
            duplicate_names.join(", ")
        )));
    }

    Ok(())
}
