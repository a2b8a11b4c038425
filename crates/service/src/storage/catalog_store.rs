//! Catalog-based object store.
//!
//! Every catalog is a JSON object persisted as one backend slot. Object level
//! operations are read-whole / mutate / write-whole cycles over that slot.
//!
//! Public operations never return errors: failures become the operation's
//! default value (`false`, `{}`, `[]`, `0`, or the caller's default) and are
//! reported to the configured [`DiagnosticSink`].
//!
//! Known hazard: the read-modify-write cycle is not atomic. Two writers
//! updating the same catalog concurrently race, and the later write replaces
//! the earlier one in full (lost update). Only the single backend write is
//! atomic.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ServiceError;
use crate::metrics::{BACKEND_READS_TOTAL, BACKEND_WRITES_TOTAL, REJECTED_WRITES_TOTAL, SOFT_FAILURES_TOTAL};
use crate::storage::backend::{NameListFormat, PropertyBackend};
use crate::storage::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::storage::namespace::NamespaceResolver;
use crate::storage::validation::{as_catalog, validate_catalog_name, validate_object_key, validate_size};
use crate::storage::Catalog;

/// Default bound on one serialized catalog: 10 MiB.
pub const DEFAULT_MAX_CATALOG_BYTES: usize = configs::DEFAULT_MAX_CATALOG_BYTES;

/// `predicate(value, key)` used by search and as update filter.
pub type ObjectPredicate = dyn Fn(&Value, &str) -> bool + Send + Sync;
/// `transformer(value, key)` producing the replacement value.
pub type ObjectTransformer = dyn Fn(&Value, &str) -> Value + Send + Sync;

/// Stable operation names, shared by diagnostics and the macro registry.
pub mod ops {
    pub const GET_OBJECT: &str = "db.getObject";
    pub const SET_OBJECT: &str = "db.setObject";
    pub const DELETE_OBJECT: &str = "db.deleteObject";
    pub const HAS_OBJECT: &str = "db.hasObject";
    pub const FIND_OBJECTS: &str = "db.findObjects";
    pub const UPDATE_OBJECTS: &str = "db.updateObjects";
    pub const GET_CATALOG: &str = "db.getCatalog";
    pub const SET_CATALOG: &str = "db.setCatalog";
    pub const DELETE_CATALOG: &str = "db.deleteCatalog";
    pub const BACKUP_CATALOG: &str = "db.backupCatalog";
    pub const MERGE_CATALOGS: &str = "db.mergeCatalogs";
    pub const GET_OBJECT_KEYS: &str = "db.getObjectKeys";
    pub const GET_OBJECT_VALUES: &str = "db.getObjectValues";
    pub const GET_OBJECT_COUNT: &str = "db.getObjectCount";
    pub const GET_CATALOG_NAMES: &str = "db.getCatalogNames";

    pub const ALL: [&str; 15] = [
        GET_OBJECT,
        SET_OBJECT,
        DELETE_OBJECT,
        HAS_OBJECT,
        FIND_OBJECTS,
        UPDATE_OBJECTS,
        GET_CATALOG,
        SET_CATALOG,
        DELETE_CATALOG,
        BACKUP_CATALOG,
        MERGE_CATALOGS,
        GET_OBJECT_KEYS,
        GET_OBJECT_VALUES,
        GET_OBJECT_COUNT,
        GET_CATALOG_NAMES,
    ];
}

pub struct CatalogStore {
    backend: Arc<dyn PropertyBackend>,
    namespaces: Arc<dyn NamespaceResolver>,
    sink: Arc<dyn DiagnosticSink>,
    max_catalog_bytes: usize,
}

impl CatalogStore {
    pub fn new(backend: Arc<dyn PropertyBackend>, namespaces: Arc<dyn NamespaceResolver>) -> Self {
        Self { backend, namespaces, sink: Arc::new(TracingSink), max_catalog_bytes: DEFAULT_MAX_CATALOG_BYTES }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_max_catalog_bytes(mut self, limit: usize) -> Self {
        self.max_catalog_bytes = limit;
        self
    }

    pub fn max_catalog_bytes(&self) -> usize { self.max_catalog_bytes }

    pub fn current_namespace(&self) -> String { self.namespaces.current_namespace() }

    /// Record a swallowed failure: count it and hand it to the sink.
    pub fn report(&self, op: &'static str, catalog: Option<&str>, err: &ServiceError) {
        SOFT_FAILURES_TOTAL.with_label_values(&[op, err.kind()]).inc();
        self.sink.emit(&Diagnostic::new(op, catalog, err));
    }

    fn soften<T>(&self, op: &'static str, catalog: &str, res: Result<T, ServiceError>, fallback: impl FnOnce() -> T) -> T {
        match res {
            Ok(v) => v,
            Err(e) => {
                self.report(op, Some(catalog), &e);
                fallback()
            }
        }
    }

    // ---- fallible core -------------------------------------------------

    /// Load a catalog. Missing, blank and corrupt slots read as `{}`; only
    /// validation and backend failures are errors. A corrupt slot is reported
    /// under `op`, the operation that read it.
    pub async fn load_catalog(&self, op: &'static str, name: &str) -> Result<Catalog, ServiceError> {
        validate_catalog_name(name)?;
        let namespace = self.namespaces.current_namespace();
        BACKEND_READS_TOTAL.inc();
        let raw = self.backend.read(name, &namespace).await?;
        let Some(raw) = raw else {
            return Ok(Catalog::new());
        };
        let text = raw.trim();
        if text.is_empty() || text == "{}" || text == "[]" {
            return Ok(Catalog::new());
        }
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => {
                debug!(catalog = name, %namespace, entries = map.len(), bytes = text.len(), "catalog loaded");
                Ok(map)
            }
            Ok(other) => {
                warn!(catalog = name, %namespace, "stored catalog is not an object; reading as empty");
                let err = ServiceError::Decode(format!(
                    "stored catalog is a {}, not an object",
                    crate::storage::validation::type_name(&other)
                ));
                self.report(op, Some(name), &err);
                Ok(Catalog::new())
            }
            Err(e) => {
                warn!(catalog = name, %namespace, error = %e, "stored catalog is corrupt; reading as empty");
                self.report(op, Some(name), &ServiceError::from(e));
                Ok(Catalog::new())
            }
        }
    }

    /// Serialize and write a whole catalog, enforcing the size bound.
    pub async fn store_catalog(&self, name: &str, catalog: &Catalog) -> Result<(), ServiceError> {
        validate_catalog_name(name)?;
        let data = serde_json::to_string(catalog)?;
        if let Err(e) = validate_size(data.len(), self.max_catalog_bytes) {
            REJECTED_WRITES_TOTAL.inc();
            warn!(catalog = name, bytes = data.len(), limit = self.max_catalog_bytes, "catalog write rejected");
            return Err(e);
        }
        let namespace = self.namespaces.current_namespace();
        self.backend.write(name, &data, &namespace).await?;
        BACKEND_WRITES_TOTAL.inc();
        debug!(catalog = name, %namespace, entries = catalog.len(), bytes = data.len(), "catalog stored");
        Ok(())
    }

    async fn try_get_object(&self, name: &str, key: &str) -> Result<Option<Value>, ServiceError> {
        validate_object_key(key)?;
        let mut catalog = self.load_catalog(ops::GET_OBJECT, name).await?;
        Ok(catalog.remove(key))
    }

    async fn try_has_object(&self, name: &str, key: &str) -> Result<bool, ServiceError> {
        validate_object_key(key)?;
        Ok(self.load_catalog(ops::HAS_OBJECT, name).await?.contains_key(key))
    }

    async fn try_set_catalog(&self, name: &str, data: &Value) -> Result<(), ServiceError> {
        validate_catalog_name(name)?;
        let catalog = as_catalog(data)?;
        self.store_catalog(name, catalog).await
    }

    async fn try_set_object(&self, name: &str, key: &str, data: Value) -> Result<(), ServiceError> {
        validate_catalog_name(name)?;
        validate_object_key(key)?;
        let mut catalog = self.load_catalog(ops::SET_OBJECT, name).await?;
        catalog.insert(key.to_string(), data);
        self.store_catalog(name, &catalog).await
    }

    async fn try_delete_object(&self, name: &str, key: &str) -> Result<(), ServiceError> {
        validate_catalog_name(name)?;
        validate_object_key(key)?;
        let mut catalog = self.load_catalog(ops::DELETE_OBJECT, name).await?;
        if catalog.remove(key).is_none() {
            return Ok(());
        }
        self.store_catalog(name, &catalog).await
    }

    async fn try_update_objects(
        &self,
        name: &str,
        transformer: &ObjectTransformer,
        filter: Option<&ObjectPredicate>,
    ) -> Result<usize, ServiceError> {
        let mut catalog = self.load_catalog(ops::UPDATE_OBJECTS, name).await?;
        let mut changed = 0usize;
        for (key, value) in catalog.iter_mut() {
            if let Some(filter) = filter {
                if !filter(value, key) {
                    continue;
                }
            }
            let next = transformer(value, key);
            if next != *value {
                *value = next;
                changed += 1;
            }
        }
        if changed > 0 {
            self.store_catalog(name, &catalog).await?;
        }
        Ok(changed)
    }

    async fn try_backup(&self, source: &str, backup: &str) -> Result<(), ServiceError> {
        validate_catalog_name(source)?;
        validate_catalog_name(backup)?;
        let snapshot = self.load_catalog(ops::BACKUP_CATALOG, source).await?;
        self.store_catalog(backup, &snapshot).await
    }

    async fn try_merge(&self, source: &str, target: &str, overwrite: bool) -> Result<usize, ServiceError> {
        validate_catalog_name(source)?;
        validate_catalog_name(target)?;
        let incoming = self.load_catalog(ops::MERGE_CATALOGS, source).await?;
        let mut merged = self.load_catalog(ops::MERGE_CATALOGS, target).await?;
        let mut copied = 0usize;
        for (key, value) in incoming {
            if overwrite || !merged.contains_key(&key) {
                merged.insert(key, value);
                copied += 1;
            }
        }
        self.store_catalog(target, &merged).await?;
        Ok(copied)
    }

    async fn try_catalog_names(&self) -> Result<Vec<String>, ServiceError> {
        let namespace = self.namespaces.current_namespace();
        let raw = self.backend.list_names(&namespace, NameListFormat::Json).await?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        let text = raw.trim();
        if text.is_empty() || text == "[]" {
            return Ok(Vec::new());
        }
        let listed: Vec<Value> = serde_json::from_str(text)?;
        Ok(listed
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect())
    }

    // ---- object-level operations --------------------------------------

    /// Owned copy of the object under `key`, or `default`.
    pub async fn get_object(&self, name: &str, key: &str, default: Value) -> Value {
        match self.try_get_object(name, key).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                self.report(ops::GET_OBJECT, Some(name), &e);
                default
            }
        }
    }

    pub async fn set_object(&self, name: &str, key: &str, data: Value) -> bool {
        let res = self.try_set_object(name, key, data).await;
        self.soften(ops::SET_OBJECT, name, res.map(|_| true), || false)
    }

    /// Remove `key`. An absent key is a successful no-op without a write.
    pub async fn delete_object(&self, name: &str, key: &str) -> bool {
        let res = self.try_delete_object(name, key).await;
        self.soften(ops::DELETE_OBJECT, name, res.map(|_| true), || false)
    }

    pub async fn has_object(&self, name: &str, key: &str) -> bool {
        let res = self.try_has_object(name, key).await;
        self.soften(ops::HAS_OBJECT, name, res, || false)
    }

    /// Entries for which `predicate(value, key)` holds.
    pub async fn find_objects(&self, name: &str, predicate: &ObjectPredicate) -> Catalog {
        let res = self
            .load_catalog(ops::FIND_OBJECTS, name)
            .await
            .map(|catalog| catalog.into_iter().filter(|(k, v)| predicate(v, k)).collect());
        self.soften(ops::FIND_OBJECTS, name, res, Catalog::new)
    }

    /// Replace every entry passing `filter` with `transformer(value, key)`.
    ///
    /// The catalog is written back once, and only if some value changed.
    pub async fn update_objects(
        &self,
        name: &str,
        transformer: &ObjectTransformer,
        filter: Option<&ObjectPredicate>,
    ) -> bool {
        let res = self.try_update_objects(name, transformer, filter).await;
        if let Ok(changed) = &res {
            debug!(catalog = name, changed, "objects updated");
        }
        self.soften(ops::UPDATE_OBJECTS, name, res.map(|_| true), || false)
    }

    // ---- catalog-level operations -------------------------------------

    pub async fn get_catalog(&self, name: &str) -> Catalog {
        let res = self.load_catalog(ops::GET_CATALOG, name).await;
        self.soften(ops::GET_CATALOG, name, res, Catalog::new)
    }

    /// Replace a whole catalog. `data` must be a JSON object.
    pub async fn set_catalog(&self, name: &str, data: &Value) -> bool {
        let res = self.try_set_catalog(name, data).await;
        self.soften(ops::SET_CATALOG, name, res.map(|_| true), || false)
    }

    /// Logical delete: the catalog is replaced by `{}`.
    pub async fn delete_catalog(&self, name: &str) -> bool {
        let res = self.store_catalog(name, &Catalog::new()).await;
        self.soften(ops::DELETE_CATALOG, name, res.map(|_| true), || false)
    }

    pub async fn get_object_keys(&self, name: &str) -> Vec<String> {
        let res = self.load_catalog(ops::GET_OBJECT_KEYS, name).await.map(|c| c.into_iter().map(|(k, _)| k).collect());
        self.soften(ops::GET_OBJECT_KEYS, name, res, Vec::new)
    }

    pub async fn get_object_values(&self, name: &str) -> Vec<Value> {
        let res = self.load_catalog(ops::GET_OBJECT_VALUES, name).await.map(|c| c.into_iter().map(|(_, v)| v).collect());
        self.soften(ops::GET_OBJECT_VALUES, name, res, Vec::new)
    }

    pub async fn get_object_count(&self, name: &str) -> usize {
        let res = self.load_catalog(ops::GET_OBJECT_COUNT, name).await.map(|c| c.len());
        self.soften(ops::GET_OBJECT_COUNT, name, res, || 0)
    }

    /// Names of the catalogs present in the caller's namespace.
    pub async fn get_catalog_names(&self) -> Vec<String> {
        match self.try_catalog_names().await {
            Ok(names) => names,
            Err(e) => {
                self.report(ops::GET_CATALOG_NAMES, None, &e);
                Vec::new()
            }
        }
    }

    // ---- backup & merge ------------------------------------------------

    /// Snapshot `source` into `backup`.
    pub async fn backup_catalog(&self, source: &str, backup: &str) -> bool {
        let res = self.try_backup(source, backup).await;
        self.soften(ops::BACKUP_CATALOG, source, res.map(|_| true), || false)
    }

    /// Copy keys of `source` into `target`, key by key.
    ///
    /// Keys already in `target` are kept unless `overwrite` is set; nested
    /// values are replaced as a whole, never merged.
    pub async fn merge_catalogs(&self, source: &str, target: &str, overwrite: bool) -> bool {
        let res = self.try_merge(source, target, overwrite).await;
        if let Ok(copied) = &res {
            debug!(source, target, copied, overwrite, "catalogs merged");
        }
        self.soften(ops::MERGE_CATALOGS, target, res.map(|_| true), || false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, NAMESPACE};
    use serde_json::json;

    #[tokio::test]
    async fn catalog_round_trip() {
        let (backend, _sink, store) = fixture();
        let data = json!({
            "1": {"name": "Thaldrin Ironforge", "hp": {"current": 45, "max": 52}},
            "2": [1, 2, 3],
            "3": "plain",
            "4": null
        });
        assert!(store.set_catalog("party", &data).await);
        assert_eq!(Value::Object(store.get_catalog("party").await), data);
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn missing_and_blank_catalogs_read_empty() {
        let (backend, sink, store) = fixture();
        assert!(store.get_catalog("nothing").await.is_empty());
        backend.put_raw("blank", "   ", NAMESPACE);
        backend.put_raw("list", "[]", NAMESPACE);
        assert!(store.get_catalog("blank").await.is_empty());
        assert!(store.get_catalog("list").await.is_empty());
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn corrupt_catalog_reads_empty_and_reports() {
        let (backend, sink, store) = fixture();
        backend.put_raw("broken", "{not json", NAMESPACE);
        backend.put_raw("scalar", "42", NAMESPACE);
        backend.put_raw("array", "[1,2]", NAMESPACE);

        assert!(store.get_catalog("broken").await.is_empty());
        assert!(store.get_catalog("scalar").await.is_empty());
        assert!(store.get_catalog("array").await.is_empty());
        let kinds: Vec<_> = sink.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec!["decode", "decode", "decode"]);

        // a corrupt catalog can be written over
        assert!(store.set_object("broken", "k", json!(1)).await);
        assert_eq!(store.get_catalog("broken").await, json!({"k": 1}).as_object().cloned().unwrap());
    }

    #[tokio::test]
    async fn corrupt_reads_are_reported_under_the_calling_operation() {
        let (backend, sink, store) = fixture();
        backend.put_raw("broken", "{not json", NAMESPACE);
        backend.put_raw("source", "42", NAMESPACE);

        assert!(store.set_object("broken", "k", json!(1)).await);
        assert!(store.merge_catalogs("source", "target", false).await);
        assert_eq!(store.get_object_count("source").await, 0);

        let seen: Vec<_> = sink.diagnostics().iter().map(|d| (d.operation, d.kind)).collect();
        assert_eq!(
            seen,
            vec![
                (ops::SET_OBJECT, "decode"),
                (ops::MERGE_CATALOGS, "decode"),
                (ops::GET_OBJECT_COUNT, "decode"),
            ]
        );
    }

    #[tokio::test]
    async fn deleting_absent_key_is_idempotent() {
        let (backend, _sink, store) = fixture();
        assert!(store.set_object("party", "a", json!(1)).await);
        let writes = backend.writes();

        assert!(store.delete_object("party", "missing").await);
        assert_eq!(backend.writes(), writes);
        assert_eq!(Value::Object(store.get_catalog("party").await), json!({"a": 1}));

        assert!(store.delete_object("party", "a").await);
        assert!(!store.has_object("party", "a").await);
        assert_eq!(backend.writes(), writes + 1);
    }

    #[tokio::test]
    async fn returned_objects_are_copies() {
        let (_backend, _sink, store) = fixture();
        assert!(store.set_object("party", "hero", json!({"hp": 10})).await);

        let mut first = store.get_object("party", "hero", Value::Null).await;
        first["hp"] = json!(0);
        first["extra"] = json!(true);

        assert_eq!(store.get_object("party", "hero", Value::Null).await, json!({"hp": 10}));
    }

    #[tokio::test]
    async fn get_object_falls_back_to_default() {
        let (_backend, sink, store) = fixture();
        assert_eq!(store.get_object("party", "nobody", json!("none")).await, json!("none"));
        assert_eq!(sink.count(), 0);

        assert_eq!(store.get_object("bad]name", "k", json!(7)).await, json!(7));
        assert_eq!(store.get_object("party", " ", json!(8)).await, json!(8));
        let ops: Vec<_> = sink.diagnostics().iter().map(|d| d.operation).collect();
        assert_eq!(ops, vec![ops::GET_OBJECT, ops::GET_OBJECT]);
    }

    #[tokio::test]
    async fn oversized_catalog_is_rejected_whole() {
        let (backend, sink, store) = fixture();
        assert!(store.set_catalog("big", &json!({"keep": "me"})).await);

        let blob = "x".repeat(11 * 1024 * 1024);
        assert!(!store.set_catalog("big", &json!({ "blob": blob.clone() })).await);
        assert!(!store.set_object("big", "blob", json!(blob)).await);

        assert_eq!(Value::Object(store.get_catalog("big").await), json!({"keep": "me"}));
        assert_eq!(backend.writes(), 1);
        assert!(sink.diagnostics().iter().all(|d| d.kind == "size_limit"));
    }

    #[tokio::test]
    async fn size_limit_is_configurable() {
        let (backend, _sink, store) = fixture();
        let store = store.with_max_catalog_bytes(16);
        assert!(store.set_object("tiny", "a", json!(1)).await);
        assert!(!store.set_object("tiny", "b", json!("far too long for the limit")).await);
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn merge_respects_overwrite_flag() {
        let (_backend, _sink, store) = fixture();
        let source = json!({"a": 1, "b": 2});
        let target = json!({"b": 3, "c": 4});

        assert!(store.set_catalog("src", &source).await);
        assert!(store.set_catalog("dst", &target).await);
        assert!(store.merge_catalogs("src", "dst", false).await);
        assert_eq!(Value::Object(store.get_catalog("dst").await), json!({"a": 1, "b": 3, "c": 4}));

        assert!(store.set_catalog("dst", &target).await);
        assert!(store.merge_catalogs("src", "dst", true).await);
        assert_eq!(Value::Object(store.get_catalog("dst").await), json!({"a": 1, "b": 2, "c": 4}));
    }

    #[tokio::test]
    async fn merge_replaces_nested_values_wholesale() {
        let (_backend, _sink, store) = fixture();
        assert!(store.set_catalog("src", &json!({"hero": {"hp": 5}})).await);
        assert!(store.set_catalog("dst", &json!({"hero": {"hp": 9, "ac": 18}})).await);
        assert!(store.merge_catalogs("src", "dst", true).await);
        assert_eq!(store.get_object("dst", "hero", Value::Null).await, json!({"hp": 5}));
    }

    #[tokio::test]
    async fn identity_update_does_not_write() {
        let (backend, _sink, store) = fixture();
        assert!(store.set_catalog("party", &json!({"a": {"hp": 1}, "b": {"hp": 2}})).await);
        let writes = backend.writes();

        assert!(store.update_objects("party", &|v, _| v.clone(), None).await);
        assert_eq!(backend.writes(), writes);
    }

    #[tokio::test]
    async fn update_applies_filter_and_writes_once() {
        let (backend, _sink, store) = fixture();
        assert!(store.set_catalog("party", &json!({"a": {"hp": 1}, "b": {"hp": 2}, "c": {"hp": 3}})).await);
        let writes = backend.writes();

        let double = |v: &Value, _: &str| json!({"hp": v["hp"].as_i64().unwrap_or(0) * 2});
        let skip_b = |_: &Value, k: &str| k != "b";
        assert!(store.update_objects("party", &double, Some(&skip_b)).await);

        assert_eq!(backend.writes(), writes + 1);
        assert_eq!(
            Value::Object(store.get_catalog("party").await),
            json!({"a": {"hp": 2}, "b": {"hp": 2}, "c": {"hp": 6}})
        );
    }

    #[tokio::test]
    async fn find_returns_matching_entries() {
        let (_backend, _sink, store) = fixture();
        assert!(store
            .set_catalog("locations", &json!({
                "1": {"name": "Silverhold City", "discovered": true},
                "3": {"name": "The Azure Tower", "discovered": false},
                "4": {"name": "Tavern", "discovered": true}
            }))
            .await);

        let found = store.find_objects("locations", &|v, _| v["discovered"] == json!(true)).await;
        let keys: Vec<_> = found.keys().cloned().collect();
        assert_eq!(keys, vec!["1".to_string(), "4".to_string()]);

        let by_key = store.find_objects("locations", &|_, k| k == "3").await;
        assert_eq!(by_key.len(), 1);
    }

    #[tokio::test]
    async fn bad_names_never_reach_backend() {
        let (backend, sink, store) = fixture();
        assert!(!store.set_object("bad[name]", "k", json!({})).await);
        assert!(!store.set_object("party", "", json!({})).await);
        assert!(!store.set_catalog("quote\"d", &json!({})).await);
        assert!(!store.delete_catalog("back\\slash").await);
        assert!(!store.backup_catalog("party", "it's").await);
        assert!(!store.merge_catalogs("{src}", "party", false).await);
        assert!(!store.has_object("", "k").await);

        assert_eq!(backend.reads(), 0);
        assert_eq!(backend.writes(), 0);
        assert!(sink.diagnostics().iter().all(|d| d.kind == "validation"));
        assert_eq!(sink.count(), 7);
    }

    #[tokio::test]
    async fn non_object_catalog_data_is_rejected() {
        let (backend, _sink, store) = fixture();
        assert!(!store.set_catalog("party", &Value::Null).await);
        assert!(!store.set_catalog("party", &json!([1, 2])).await);
        assert!(!store.set_catalog("party", &json!("x")).await);
        assert_eq!(backend.writes(), 0);
    }

    #[tokio::test]
    async fn backup_is_an_independent_snapshot() {
        let (_backend, _sink, store) = fixture();
        assert!(store.set_catalog("party", &json!({"a": 1})).await);
        assert!(store.backup_catalog("party", "party_backup").await);

        assert!(store.set_object("party", "x", json!(1)).await);
        assert!(store.delete_object("party", "a").await);

        assert_eq!(Value::Object(store.get_catalog("party_backup").await), json!({"a": 1}));
    }

    #[tokio::test]
    async fn delete_catalog_leaves_empty_mapping() {
        let (backend, _sink, store) = fixture();
        assert!(store.set_catalog("party", &json!({"a": 1})).await);
        assert!(store.delete_catalog("party").await);
        assert_eq!(backend.raw("party", NAMESPACE).as_deref(), Some("{}"));
        assert_eq!(store.get_object_count("party").await, 0);
    }

    #[tokio::test]
    async fn derived_views() {
        let (_backend, _sink, store) = fixture();
        assert!(store.set_catalog("party", &json!({"a": 1, "b": {"x": true}})).await);
        assert_eq!(store.get_object_keys("party").await, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.get_object_values("party").await, vec![json!(1), json!({"x": true})]);
        assert_eq!(store.get_object_count("party").await, 2);

        assert!(store.get_object_keys("bad]").await.is_empty());
        assert_eq!(store.get_object_count("bad]").await, 0);
    }

    #[tokio::test]
    async fn catalog_names_come_from_backend_listing() {
        let (backend, _sink, store) = fixture();
        assert!(store.get_catalog_names().await.is_empty());

        assert!(store.set_object("party", "a", json!(1)).await);
        assert!(store.set_object("locations", "b", json!(2)).await);
        backend.put_raw("elsewhere", "{}", "another-namespace");

        assert_eq!(store.get_catalog_names().await, vec!["locations".to_string(), "party".to_string()]);
    }

    #[tokio::test]
    async fn backend_failures_soft_fail() {
        let (backend, sink, store) = fixture();
        assert!(store.set_object("party", "a", json!(1)).await);

        backend.fail_writes(true);
        assert!(!store.set_object("party", "b", json!(2)).await);
        assert!(!store.delete_object("party", "a").await);
        assert!(!store.update_objects("party", &|_, _| json!(0), None).await);
        backend.fail_writes(false);

        backend.fail_reads(true);
        assert!(store.get_catalog("party").await.is_empty());
        assert_eq!(store.get_object("party", "a", json!("fallback")).await, json!("fallback"));
        assert!(!store.has_object("party", "a").await);
        assert!(store.find_objects("party", &|_, _| true).await.is_empty());
        assert!(store.get_catalog_names().await.is_empty());
        // a failed read never turns into an overwrite
        assert!(!store.set_object("party", "c", json!(3)).await);
        assert!(!store.merge_catalogs("party", "other", true).await);
        backend.fail_reads(false);

        assert_eq!(Value::Object(store.get_catalog("party").await), json!({"a": 1}));
        assert!(sink.diagnostics().iter().all(|d| d.kind == "backend"));
    }

    #[tokio::test]
    async fn namespaces_isolate_catalogs() {
        use crate::storage::backend::MemoryBackend;
        use crate::storage::namespace::FixedNamespace;

        let backend = Arc::new(MemoryBackend::new());
        let gm = CatalogStore::new(backend.clone(), Arc::new(FixedNamespace::new("gm")));
        let player = CatalogStore::new(backend.clone(), Arc::new(FixedNamespace::new("player")));

        assert!(gm.set_object("notes", "secret", json!("the butler")).await);
        assert!(!player.has_object("notes", "secret").await);
        assert_eq!(player.get_catalog_names().await, Vec::<String>::new());
        assert_eq!(gm.get_catalog_names().await, vec!["notes".to_string()]);
    }
}
