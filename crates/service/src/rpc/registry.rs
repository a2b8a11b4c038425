use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::errors::ServiceError;
use crate::rpc::functions::FunctionTable;
use crate::storage::validation::type_name;
use crate::storage::{ops, CatalogStore};

/// Binds the stable `db.*` operation names to a [`CatalogStore`].
///
/// Arguments are positional JSON values, in the order of the store method
/// parameters. A malformed argument list is handled like any other store
/// failure: the call returns the operation's default value and a diagnostic
/// is emitted. Only an unknown operation name is reported as an error.
#[derive(Clone)]
pub struct MacroRegistry {
    store: Arc<CatalogStore>,
    functions: Arc<FunctionTable>,
}

struct Args<'a> {
    op: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn get(&self, index: usize) -> Option<&'a Value> { self.values.get(index) }

    fn string(&self, index: usize, what: &str) -> Result<&'a str, ServiceError> {
        match self.get(index) {
            Some(Value::String(s)) => Ok(s.as_str()),
            None | Some(Value::Null) => Err(ServiceError::Validation(format!(
                "{}: missing argument {index} ({what})",
                self.op
            ))),
            Some(other) => Err(ServiceError::Validation(format!(
                "{}: argument {index} ({what}) must be a string, got {}",
                self.op,
                type_name(other)
            ))),
        }
    }

    fn optional_string(&self, index: usize, what: &str) -> Result<Option<&'a str>, ServiceError> {
        match self.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.string(index, what).map(Some),
        }
    }

    fn required(&self, index: usize, what: &str) -> Result<&'a Value, ServiceError> {
        self.get(index)
            .ok_or_else(|| ServiceError::Validation(format!("{}: missing argument {index} ({what})", self.op)))
    }

    fn flag(&self, index: usize, what: &str) -> Result<bool, ServiceError> {
        match self.get(index) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(ServiceError::Validation(format!(
                "{}: argument {index} ({what}) must be a boolean, got {}",
                self.op,
                type_name(other)
            ))),
        }
    }

    fn catalog_hint(&self) -> Option<&'a str> { self.get(0).and_then(Value::as_str) }
}

impl MacroRegistry {
    pub fn new(store: Arc<CatalogStore>, functions: FunctionTable) -> Self {
        Self { store, functions: Arc::new(functions) }
    }

    pub fn store(&self) -> &Arc<CatalogStore> { &self.store }

    pub fn functions(&self) -> &FunctionTable { &self.functions }

    /// Registered operation names, in a stable order.
    pub fn operations(&self) -> Vec<&'static str> { ops::ALL.to_vec() }

    /// Invoke `name` with positional `args`.
    pub async fn call(&self, name: &str, args: &[Value]) -> Result<Value, ServiceError> {
        let op = ops::ALL
            .iter()
            .copied()
            .find(|o| *o == name)
            .ok_or_else(|| ServiceError::NotFound(format!("operation {name} is not registered")))?;
        let args = Args { op, values: args };
        debug!(op, argc = args.values.len(), "macro call");
        match self.dispatch(&args).await {
            Ok(v) => Ok(v),
            Err(e) => {
                self.store.report(op, args.catalog_hint(), &e);
                Ok(failure_value(&args))
            }
        }
    }

    async fn dispatch(&self, args: &Args<'_>) -> Result<Value, ServiceError> {
        let store = &self.store;
        let value = match args.op {
            ops::GET_OBJECT => {
                let catalog = args.string(0, "catalogName")?;
                let key = args.string(1, "objectKey")?;
                let default = args.get(2).cloned().unwrap_or(Value::Null);
                store.get_object(catalog, key, default).await
            }
            ops::SET_OBJECT => {
                let catalog = args.string(0, "catalogName")?;
                let key = args.string(1, "objectKey")?;
                let data = args.required(2, "objectData")?.clone();
                Value::Bool(store.set_object(catalog, key, data).await)
            }
            ops::DELETE_OBJECT => {
                let catalog = args.string(0, "catalogName")?;
                let key = args.string(1, "objectKey")?;
                Value::Bool(store.delete_object(catalog, key).await)
            }
            ops::HAS_OBJECT => {
                let catalog = args.string(0, "catalogName")?;
                let key = args.string(1, "objectKey")?;
                Value::Bool(store.has_object(catalog, key).await)
            }
            ops::FIND_OBJECTS => {
                let catalog = args.string(0, "catalogName")?;
                let predicate = self.functions.predicate(args.string(1, "predicate")?)?;
                Value::Object(store.find_objects(catalog, &*predicate).await)
            }
            ops::UPDATE_OBJECTS => {
                let catalog = args.string(0, "catalogName")?;
                let transformer = self.functions.transformer(args.string(1, "transformer")?)?;
                let filter = match args.optional_string(2, "filter")? {
                    Some(name) => Some(self.functions.predicate(name)?),
                    None => None,
                };
                Value::Bool(store.update_objects(catalog, &*transformer, filter.as_deref()).await)
            }
            ops::GET_CATALOG => {
                let catalog = args.string(0, "catalogName")?;
                Value::Object(store.get_catalog(catalog).await)
            }
            ops::SET_CATALOG => {
                let catalog = args.string(0, "catalogName")?;
                let data = args.required(1, "catalogData")?;
                Value::Bool(store.set_catalog(catalog, data).await)
            }
            ops::DELETE_CATALOG => {
                let catalog = args.string(0, "catalogName")?;
                Value::Bool(store.delete_catalog(catalog).await)
            }
            ops::BACKUP_CATALOG => {
                let source = args.string(0, "sourceCatalog")?;
                let backup = args.string(1, "backupCatalog")?;
                Value::Bool(store.backup_catalog(source, backup).await)
            }
            ops::MERGE_CATALOGS => {
                let source = args.string(0, "sourceCatalog")?;
                let target = args.string(1, "targetCatalog")?;
                let overwrite = args.flag(2, "overwrite")?;
                Value::Bool(store.merge_catalogs(source, target, overwrite).await)
            }
            ops::GET_OBJECT_KEYS => {
                let catalog = args.string(0, "catalogName")?;
                json!(store.get_object_keys(catalog).await)
            }
            ops::GET_OBJECT_VALUES => {
                let catalog = args.string(0, "catalogName")?;
                Value::Array(store.get_object_values(catalog).await)
            }
            ops::GET_OBJECT_COUNT => {
                let catalog = args.string(0, "catalogName")?;
                json!(store.get_object_count(catalog).await)
            }
            ops::GET_CATALOG_NAMES => json!(store.get_catalog_names().await),
            other => return Err(ServiceError::NotFound(format!("operation {other} is not registered"))),
        };
        Ok(value)
    }
}

/// What an operation returns when its arguments cannot be used.
fn failure_value(args: &Args<'_>) -> Value {
    match args.op {
        ops::GET_OBJECT => args.get(2).cloned().unwrap_or(Value::Null),
        ops::FIND_OBJECTS | ops::GET_CATALOG => json!({}),
        ops::GET_OBJECT_KEYS | ops::GET_OBJECT_VALUES | ops::GET_CATALOG_NAMES => json!([]),
        ops::GET_OBJECT_COUNT => json!(0),
        _ => Value::Bool(false),
    }
}
