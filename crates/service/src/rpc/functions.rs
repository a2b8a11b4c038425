use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::ServiceError;
use crate::storage::{ObjectPredicate, ObjectTransformer};

pub type SharedPredicate = Arc<ObjectPredicate>;
pub type SharedTransformer = Arc<ObjectTransformer>;

/// Named callables that remote callers refer to by string.
///
/// Positional JSON arguments cannot carry code, so `db.findObjects` and
/// `db.updateObjects` name a predicate or transformer registered here.
#[derive(Clone, Default)]
pub struct FunctionTable {
    predicates: BTreeMap<String, SharedPredicate>,
    transformers: BTreeMap<String, SharedTransformer>,
}

impl FunctionTable {
    pub fn new() -> Self { Self::default() }

    /// Table preloaded with `always` (predicate) and `identity` (transformer).
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table
            .register_predicate("always", |_, _| true)
            .register_transformer("identity", |v, _| v.clone());
        table
    }

    pub fn register_predicate<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Value, &str) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(f));
        self
    }

    pub fn register_transformer<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Value, &str) -> Value + Send + Sync + 'static,
    {
        self.transformers.insert(name.into(), Arc::new(f));
        self
    }

    /// Look up a predicate; an unknown name is a validation error.
    pub fn predicate(&self, name: &str) -> Result<SharedPredicate, ServiceError> {
        self.predicates
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::Validation(format!("{name:?} is not a registered predicate")))
    }

    /// Look up a transformer; an unknown name is a validation error.
    pub fn transformer(&self, name: &str) -> Result<SharedTransformer, ServiceError> {
        self.transformers
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::Validation(format!("{name:?} is not a registered transformer")))
    }

    pub fn predicate_names(&self) -> Vec<String> { self.predicates.keys().cloned().collect() }

    pub fn transformer_names(&self) -> Vec<String> { self.transformers.keys().cloned().collect() }
}
