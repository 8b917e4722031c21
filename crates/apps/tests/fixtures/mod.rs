#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use trellis_apps::{AppConfigClass, Module, ModelClass, ModelOptions, ModelRef, ModuleRegistry};

/// A plain model definition living in `<app_label>.models`.
#[must_use]
pub fn model(app_label: &str, object_name: &str) -> ModelRef {
    ModelClass::shared(ModelOptions::new(app_label, object_name, format!("{app_label}.models")))
}

/// An app package with a single filesystem location.
#[must_use]
pub fn app_module(name: &str) -> Module {
    Module::new(name).path(format!("/srv/{}", name.replace('.', "/")))
}

/// A `<app>.models` module registering `models` under the last component of `app`.
#[must_use]
pub fn models_module(app: &str, models: &[&'static str]) -> Module {
    let label = app.rsplit('.').next().unwrap_or(app).to_owned();
    let models = models.to_vec();
    Module::new(format!("{app}.models")).body(move |apps| {
        for name in &models {
            apps.register_model(&label, model(&label, name))?;
        }
        Ok(())
    })
}

/// `blog` (Post, Comment) and `shop` (Product), both with models modules.
#[must_use]
pub fn blog_and_shop() -> ModuleRegistry {
    ModuleRegistry::new()
        .with(app_module("blog"))
        .with(models_module("blog", &["Post", "Comment"]))
        .with(app_module("shop"))
        .with(models_module("shop", &["Product"]))
}

/// Resolver with one bare app package per name.
#[must_use]
pub fn bare_apps(names: &[&str]) -> ModuleRegistry {
    names.iter().fold(ModuleRegistry::new(), |modules, name| modules.with(app_module(name)))
}

/// A descriptor class whose `ready` hook counts its invocations.
#[must_use]
pub fn counting_class(name: &str, counter: &Arc<AtomicUsize>) -> AppConfigClass {
    let counter = Arc::clone(counter);
    AppConfigClass::new().name(name).on_ready(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}
