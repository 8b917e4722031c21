//! Application and model registry.
//! Build one [`Apps`] per process, populate it from the installed-apps list and pass it around.
//!
//! ## Bootstrap
//! ```rust
//! # use trellis_apps::{Apps, Module, ModuleRegistry, ModelClass};
//! # use trellis_domain::model::ModelOptions;
//! let modules = ModuleRegistry::new()
//!     .with(Module::new("blog").path("/srv/blog"))
//!     .with(Module::new("blog.models").body(|apps| {
//!         apps.register_model("blog", ModelClass::shared(ModelOptions::new("blog", "Post", "blog.models")))
//!     }));
//!
//! let apps = Apps::with_installed(modules, ["blog"]).unwrap();
//! let post = apps.get_model("blog.Post", None).unwrap();
//! assert_eq!(post.opts().label(), "blog.Post");
//! ```
//!
//! ## Deferred operations
//! Relations between models that load in any order are wired through
//! [`Apps::lazy_model_operation`]: the callback fires once every key is registered.

mod config;
mod discovery;
mod error;
mod model;
mod module;
mod pending;
mod registry;

pub use config::{AppConfig, AppConfigClass, AppEntry, ReadyHook};
pub use discovery::autodiscover_modules;
pub use error::{AppsError, AppsErrorExt};
pub use model::{Model, ModelClass, ModelRef, Relation};
pub use module::{Module, ModuleBody, ModuleRegistry, Symbol};
pub use registry::Apps;

pub use trellis_domain::filter::ModelFilter;
pub use trellis_domain::model::{ModelKey, ModelOptions};
