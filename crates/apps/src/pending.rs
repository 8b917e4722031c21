//! Operations deferred until a set of models is registered.
//!
//! An operation over keys `[k1, k2, ...]` resolves the keys left to right. The
//! first key that isn't registered yet parks the operation in the pending
//! table; registering that model resumes it with the remaining keys.

use crate::model::ModelRef;
use crate::registry::Apps;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use trellis_domain::model::ModelKey;

type Callback = Box<dyn FnOnce(Vec<ModelRef>) + Send>;

/// A partially applied operation: models resolved so far plus the keys still awaited.
pub(crate) struct PendingOperation {
    resolved: Vec<ModelRef>,
    remaining: VecDeque<ModelKey>,
    callback: Callback,
}

impl fmt::Debug for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation")
            .field("resolved", &self.resolved.len())
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl Apps {
    /// Runs `callback` with the models for `keys`, in key order, as soon as all
    /// of them are registered. Runs immediately when they already are, and
    /// with an empty list when `keys` is empty.
    ///
    /// The callback runs exactly once, on the thread that registers the last
    /// missing model.
    pub fn lazy_model_operation<K, F>(&self, keys: impl IntoIterator<Item = K>, callback: F)
    where
        K: Into<ModelKey>,
        F: FnOnce(Vec<ModelRef>) + Send + 'static,
    {
        let remaining: VecDeque<ModelKey> = keys.into_iter().map(Into::into).collect();
        self.advance(PendingOperation {
            resolved: Vec::with_capacity(remaining.len()),
            remaining,
            callback: Box::new(callback),
        });
    }

    /// Resumes every operation waiting for `model`, in scheduling order.
    pub fn do_pending_operations(&self, model: &ModelRef) {
        self.run_pending(&model.opts().key(), model);
    }

    pub(crate) fn run_pending(&self, key: &ModelKey, model: &ModelRef) {
        let Some(operations) = self.pending_table().lock().remove(key) else {
            return;
        };

        debug!(model = %key, operations = operations.len(), "Resuming deferred operations");
        for mut operation in operations {
            operation.resolved.push(Arc::clone(model));
            self.advance(operation);
        }
    }

    /// Keys that deferred operations are still waiting for, sorted.
    #[must_use]
    pub fn pending_model_keys(&self) -> Vec<ModelKey> {
        let mut keys: Vec<ModelKey> = self.pending_table().lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    fn advance(&self, mut operation: PendingOperation) {
        while let Some(key) = operation.remaining.pop_front() {
            // Holding the table lock across the lookup keeps a concurrent
            // registration from slipping between the check and the park.
            let mut pending = self.pending_table().lock();
            if let Some(model) = self.registered(&key) {
                drop(pending);
                operation.resolved.push(model);
            } else {
                trace!(model = %key, "Deferring operation until model is registered");
                pending.entry(key).or_default().push(operation);
                return;
            }
        }

        (operation.callback)(operation.resolved);
    }
}

#[cfg(test)]
mod tests {
    use crate::model::ModelClass;
    use crate::module::ModuleRegistry;
    use crate::registry::Apps;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use trellis_domain::model::{ModelKey, ModelOptions};

    fn model(app_label: &str, name: &str) -> crate::ModelRef {
        ModelClass::shared(ModelOptions::new(app_label, name, format!("{app_label}.models")))
    }

    #[test]
    fn empty_keys_run_immediately() {
        let apps = Apps::new(ModuleRegistry::new());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);

        apps.lazy_model_operation(Vec::<ModelKey>::new(), move |models| {
            sink.lock().push(models.len());
        });

        assert_eq!(*calls.lock(), [0]);
        assert!(apps.pending_model_keys().is_empty());
    }

    #[test]
    fn partially_resolved_operation_waits_for_the_rest() {
        let apps = Apps::new(ModuleRegistry::new());
        apps.register_model("a", model("a", "X")).unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        apps.lazy_model_operation([("a", "x"), ("b", "y")], move |models| {
            sink.lock().push(models.iter().map(|m| m.opts().label()).collect::<Vec<_>>());
        });

        assert!(calls.lock().is_empty());
        assert_eq!(apps.pending_model_keys(), [ModelKey::new("b", "y")]);

        apps.register_model("b", model("b", "Y")).unwrap();
        assert_eq!(*calls.lock(), [vec!["a.X".to_owned(), "b.Y".to_owned()]]);
        assert!(apps.pending_model_keys().is_empty());
    }
}
