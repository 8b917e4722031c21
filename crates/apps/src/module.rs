//! Capability-based module resolution.
//!
//! Applications are named by dotted paths in settings. Instead of importing
//! code at runtime the host registers every module it ships in a
//! [`ModuleRegistry`]; the registry resolves paths against that table and runs
//! each module's body at most once, like a first import would.

use crate::config::AppConfigClass;
use crate::error::AppsError;
use crate::registry::Apps;
use fxhash::FxHashMap;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace, warn};

/// Code executed on first import, typically model registration.
pub type ModuleBody = Arc<dyn Fn(&Apps) -> Result<(), AppsError> + Send + Sync>;

/// A named attribute exposed by a module.
#[derive(Debug, Clone)]
pub enum Symbol {
    /// A descriptor class usable as an installed-apps entry.
    AppConfig(AppConfigClass),
    /// Anything else (functions, constants, unrelated types).
    Other { kind: &'static str },
}

/// One entry of the module table.
#[derive(Clone)]
pub struct Module {
    name: String,
    paths: Vec<PathBuf>,
    file: Option<PathBuf>,
    default_app_config: Option<String>,
    symbols: FxHashMap<String, Symbol>,
    body: Option<ModuleBody>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paths: Vec::new(),
            file: None,
            default_app_config: None,
            symbols: FxHashMap::default(),
            body: None,
        }
    }

    /// Adds a package location. Packages may span several directories.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Sets the source file of a plain (non-package) module.
    #[must_use]
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Points installed-apps resolution at `<module path>.<class name>`.
    #[must_use]
    pub fn default_app_config(mut self, path: impl Into<String>) -> Self {
        self.default_app_config = Some(path.into());
        self
    }

    #[must_use]
    pub fn app_config(mut self, name: impl Into<String>, class: AppConfigClass) -> Self {
        self.symbols.insert(name.into(), Symbol::AppConfig(class));
        self
    }

    #[must_use]
    pub fn symbol(mut self, name: impl Into<String>, symbol: Symbol) -> Self {
        self.symbols.insert(name.into(), symbol);
        self
    }

    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&Apps) -> Result<(), AppsError> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    #[must_use]
    pub fn default_app_config_path(&self) -> Option<&str> {
        self.default_app_config.as_deref()
    }

    #[must_use]
    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .field("file", &self.file)
            .field("default_app_config", &self.default_app_config)
            .field("symbols", &self.symbols.keys().collect::<Vec<_>>())
            .field("body", &self.body.is_some())
            .finish()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module '{}'>", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportState {
    /// The body is executing on this thread.
    Running(ThreadId),
    Done,
}

/// Table of every module the process can resolve by dotted path.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: FxHashMap<String, Arc<Module>>,
    imports: Mutex<FxHashMap<String, ImportState>>,
    import_finished: Condvar,
}

impl ModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `module`, replacing any module registered under the same path.
    pub fn register(&mut self, module: Module) -> &mut Self {
        let name = module.name.clone();
        if self.modules.insert(name.clone(), Arc::new(module)).is_some() {
            warn!(module = %name, "Module registered twice, keeping the latest definition");
        }
        self
    }

    /// Moves every module of `other` into this table, overriding same-named entries.
    pub fn extend(&mut self, other: Self) {
        for (name, module) in other.modules {
            if self.modules.insert(name.clone(), module).is_some() {
                debug!(module = %name, "Module overridden");
            }
        }
    }

    #[must_use]
    pub fn with(mut self, module: Module) -> Self {
        self.register(module);
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Whether `<module>.<submodule>` is known, without importing it.
    #[must_use]
    pub fn has_submodule(&self, module: &Module, submodule: &str) -> bool {
        self.contains(&format!("{}.{submodule}", module.name))
    }

    /// Whether the body of `name` already ran (or is running).
    #[must_use]
    pub fn is_imported(&self, name: &str) -> bool {
        self.imports.lock().contains_key(name)
    }

    /// Looks a module up without running anything.
    ///
    /// # Errors
    /// Returns [`AppsError::Import`] if the path is unknown.
    pub fn get(&self, name: &str) -> Result<Arc<Module>, AppsError> {
        self.modules.get(name).cloned().ok_or_else(|| AppsError::import(name.to_owned()))
    }

    /// Resolves `name`, running the bodies of its known parent packages and of
    /// the module itself on first import.
    ///
    /// A body that fails leaves its module un-imported so a later import retries it.
    ///
    /// # Errors
    /// Returns [`AppsError::Import`] for unknown paths, or whatever a body returns.
    pub fn import(&self, name: &str, apps: &Apps) -> Result<Arc<Module>, AppsError> {
        let module = self.get(name)?;

        let mut parent = name;
        let mut parents = Vec::new();
        while let Some((head, _)) = parent.rsplit_once('.') {
            parents.push(head);
            parent = head;
        }
        for parent in parents.into_iter().rev() {
            if let Some(parent) = self.modules.get(parent) {
                self.execute(parent, apps)?;
            }
        }

        self.execute(&module, apps)?;
        Ok(module)
    }

    /// Runs the body of `module` unless it already ran.
    ///
    /// Another thread importing the same module blocks until the body finishes.
    /// The importing thread itself sees the partially initialized module.
    fn execute(&self, module: &Module, apps: &Apps) -> Result<(), AppsError> {
        let current = thread::current().id();
        let body = {
            let mut imports = self.imports.lock();
            loop {
                match imports.get(&module.name).copied() {
                    None => break,
                    Some(ImportState::Done) => {
                        trace!(module = %module.name, "Module already imported");
                        return Ok(());
                    },
                    Some(ImportState::Running(owner)) if owner == current => {
                        trace!(module = %module.name, "Recursive import of a running module");
                        return Ok(());
                    },
                    Some(ImportState::Running(_)) => {
                        trace!(module = %module.name, "Waiting for a concurrent import");
                        self.import_finished.wait(&mut imports);
                    },
                }
            }

            let Some(body) = &module.body else {
                imports.insert(module.name.clone(), ImportState::Done);
                return Ok(());
            };
            imports.insert(module.name.clone(), ImportState::Running(current));
            Arc::clone(body)
        };

        debug!(module = %module.name, "Importing module");
        let result = body(apps);

        {
            let mut imports = self.imports.lock();
            if result.is_ok() {
                imports.insert(module.name.clone(), ImportState::Done);
            } else {
                imports.remove(&module.name);
            }
        }
        self.import_finished.notify_all();
        result
    }
}
