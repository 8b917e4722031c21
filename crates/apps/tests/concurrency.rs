mod fixtures;

use fixtures::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use trellis_apps::{Apps, Model, ModelFilter, ModelOptions, ModelRef, Module, ModuleRegistry};

/// A model whose next `opts()` call, once armed, parks until the test lets it go.
#[derive(Debug)]
struct GatedModel {
    opts: ModelOptions,
    armed: AtomicBool,
    entered: Barrier,
    release: Barrier,
}

impl GatedModel {
    fn new(opts: ModelOptions) -> Self {
        Self { opts, armed: AtomicBool::new(false), entered: Barrier::new(2), release: Barrier::new(2) }
    }
}

impl Model for GatedModel {
    fn opts(&self) -> &ModelOptions {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            self.release.wait();
        }
        &self.opts
    }
}

#[test]
fn registration_during_a_listing_is_not_hidden_by_the_memo() {
    let post = Arc::new(GatedModel::new(ModelOptions::new("blog", "Post", "blog.models")));
    let registered = Arc::clone(&post);
    let modules = ModuleRegistry::new()
        .with(app_module("shop"))
        .with(app_module("blog"))
        .with(Module::new("blog.models").body(move |apps| {
            apps.register_model("blog", Arc::clone(&registered) as ModelRef)
        }));
    let apps = Apps::with_installed(modules, ["shop", "blog"]).unwrap();

    post.armed.store(true, Ordering::SeqCst);
    let reader = {
        let apps = apps.clone();
        thread::spawn(move || apps.get_models(ModelFilter::empty()).unwrap().len())
    };

    // The reader already walked `shop` and is parked on `blog.Post`.
    post.entered.wait();
    apps.register_model("shop", model("shop", "Product")).unwrap();
    post.release.wait();

    assert_eq!(reader.join().unwrap(), 1);
    let models = apps.get_models(ModelFilter::empty()).unwrap();
    let labels: Vec<String> = models.iter().map(|m| m.opts().label()).collect();
    assert_eq!(labels, ["shop.Product", "blog.Post"]);
}

#[test]
fn concurrent_import_waits_for_the_running_body() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let runs = Arc::new(AtomicUsize::new(0));

    let modules = {
        let (entered, release, runs) = (Arc::clone(&entered), Arc::clone(&release), Arc::clone(&runs));
        ModuleRegistry::new().with(app_module("blog")).with(Module::new("blog.models").body(
            move |apps| {
                runs.fetch_add(1, Ordering::SeqCst);
                entered.wait();
                release.wait();
                apps.register_model("blog", model("blog", "Post"))
            },
        ))
    };
    let apps = Apps::new(modules);

    let first = {
        let apps = apps.clone();
        thread::spawn(move || apps.modules().import("blog.models", &apps).is_ok())
    };
    entered.wait();

    let second = {
        let apps = apps.clone();
        thread::spawn(move || {
            let imported = apps.modules().import("blog.models", &apps).is_ok();
            imported && apps.get_registered_model("blog", "post").is_ok()
        })
    };
    // Give the second import time to reach the running body before it finishes.
    thread::sleep(Duration::from_millis(50));
    release.wait();

    assert!(first.join().unwrap());
    assert!(second.join().unwrap(), "second import returned before the body finished");
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn recursive_import_on_the_same_thread_does_not_block() {
    let modules = ModuleRegistry::new().with(app_module("blog")).with(
        Module::new("blog.models").body(|apps| {
            apps.modules().import("blog.models", apps)?;
            apps.modules().import("blog", apps)?;
            apps.register_model("blog", model("blog", "Post"))
        }),
    );
    let apps = Apps::new(modules);

    apps.modules().import("blog.models", &apps).unwrap();

    assert!(apps.get_registered_model("blog", "post").is_ok());
    assert!(apps.modules().is_imported("blog.models"));
}
