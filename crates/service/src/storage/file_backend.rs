use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::storage::backend::{encode_names, NameListFormat, PropertyBackend};
use crate::storage::json_map_store::JsonMapStore;

/// Slots of one namespace: `name -> raw text`.
type Slots = BTreeMap<String, String>;

/// File-backed property backend: every namespace and slot lives in one JSON file.
#[derive(Clone)]
pub struct JsonFileBackend {
    store: Arc<JsonMapStore<Slots>>,
}

impl JsonFileBackend {
    /// Open (or create) the backing file.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<Slots>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Namespaces present in the file.
    pub async fn namespaces(&self) -> Vec<String> {
        self.store.keys().await
    }
}

#[async_trait]
impl PropertyBackend for JsonFileBackend {
    async fn read(&self, name: &str, namespace: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.store.get(namespace).await.and_then(|slots| slots.get(name).cloned()))
    }

    async fn write(&self, name: &str, data: &str, namespace: &str) -> Result<(), ServiceError> {
        self.store
            .update_map(|m| {
                m.entry(namespace.to_string())
                    .or_default()
                    .insert(name.to_string(), data.to_string());
                Ok(())
            })
            .await
    }

    async fn list_names(&self, namespace: &str, format: NameListFormat) -> Result<Option<String>, ServiceError> {
        let names: Vec<String> = match self.store.get(namespace).await {
            Some(slots) if !slots.is_empty() => slots.into_keys().collect(),
            _ => return Ok(None),
        };
        encode_names(&names, format).map(Some)
    }
}
