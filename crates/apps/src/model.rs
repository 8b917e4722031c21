//! Model definitions as the registry sees them.
//!
//! The ORM owns the real model classes; the registry only needs their
//! [`ModelOptions`] and a hook to drop derived metadata. [`ModelClass`] is a
//! ready-made implementation for callers that have no ORM of their own.

use crate::registry::Apps;
use parking_lot::RwLock;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use trellis_domain::model::{ModelKey, ModelOptions};

/// A model class registered with [`Apps`](crate::Apps).
pub trait Model: Debug + Send + Sync + 'static {
    /// Class-level metadata.
    fn opts(&self) -> &ModelOptions;

    /// Drops cached derived metadata (relation trees, field caches).
    fn expire_cache(&self) {}
}

/// Shared handle to a registered model.
pub type ModelRef = Arc<dyn Model>;

/// A forward relation wired once its target model became available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub field: String,
    pub target: ModelKey,
}

/// Standalone model definition.
#[derive(Debug)]
pub struct ModelClass {
    opts: ModelOptions,
    relations: RwLock<Vec<Relation>>,
    expirations: AtomicUsize,
}

impl ModelClass {
    pub fn new(opts: ModelOptions) -> Self {
        Self { opts, relations: RwLock::new(Vec::new()), expirations: AtomicUsize::new(0) }
    }

    /// Wraps the definition into a [`ModelRef`].
    pub fn shared(opts: ModelOptions) -> ModelRef {
        Arc::new(Self::new(opts))
    }

    /// Records `field` as pointing at `target`.
    pub fn relate(&self, field: impl Into<String>, target: &dyn Model) {
        self.relations.write().push(Relation { field: field.into(), target: target.opts().key() });
        self.expire_cache();
    }

    /// Records `field` as pointing at `target` once that model is registered.
    pub fn relate_lazily(self: &Arc<Self>, apps: &Apps, field: &str, target: impl Into<ModelKey>) {
        let this = Arc::clone(self);
        let field = field.to_owned();
        apps.lazy_model_operation([target], move |models| {
            for model in &models {
                this.relate(field.clone(), model.as_ref());
            }
        });
    }

    #[must_use]
    pub fn relations(&self) -> Vec<Relation> {
        self.relations.read().clone()
    }

    /// How many times derived metadata was expired.
    #[must_use]
    pub fn expirations(&self) -> usize {
        self.expirations.load(Ordering::Relaxed)
    }
}

impl Model for ModelClass {
    fn opts(&self) -> &ModelOptions {
        &self.opts
    }

    fn expire_cache(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relate_records_target_and_expires() {
        let post = ModelClass::new(ModelOptions::new("blog", "Post", "blog.models"));
        let author = ModelClass::new(ModelOptions::new("auth", "User", "auth.models"));

        post.relate("author", &author);

        assert_eq!(
            post.relations(),
            [Relation { field: "author".to_owned(), target: ModelKey::new("auth", "user") }]
        );
        assert_eq!(post.expirations(), 1);
        assert_eq!(author.expirations(), 0);
    }

    #[test]
    fn relate_lazily_waits_for_the_target() {
        let apps = Apps::new(crate::ModuleRegistry::new());
        let post = Arc::new(ModelClass::new(ModelOptions::new("blog", "Post", "blog.models")));

        post.relate_lazily(&apps, "author", ("auth", "User"));
        assert!(post.relations().is_empty());

        apps.register_model("auth", ModelClass::shared(ModelOptions::new("auth", "User", "auth.models")))
            .unwrap();
        assert_eq!(post.relations()[0].target, ModelKey::new("auth", "user"));
    }
}
