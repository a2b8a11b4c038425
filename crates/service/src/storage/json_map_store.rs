use std::{collections::BTreeMap, io, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::{debug, error, info};

use crate::errors::ServiceError;

/// Generic JSON file-backed map store.
///
/// Keeps a `BTreeMap<String, V>` in memory and persists the whole map to one
/// JSON file on every mutation. Saves go through a sibling temp file and a
/// rename, so a reader of the file sees either the old or the new map.
pub struct JsonMapStore<V> {
    inner: RwLock<BTreeMap<String, V>>,
    file_path: PathBuf,
}

impl<V> JsonMapStore<V>
where
    V: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    ///
    /// An existing file that cannot be read or parsed is an error and is left
    /// untouched on disk.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| ServiceError::Backend(e.to_string()))?;
            }
        }

        let map: BTreeMap<String, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                error!(path = %file_path.display(), error = %e, "store file is not valid JSON; refusing to open");
                ServiceError::Backend(format!("{} is corrupt: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let empty: BTreeMap<String, V> = BTreeMap::new();
                write_atomic(&file_path, &serde_json::to_vec(&empty)?).await?;
                info!(path = %file_path.display(), "created empty store file");
                empty
            }
            Err(e) => {
                return Err(ServiceError::Backend(format!("cannot read {}: {e}", file_path.display())));
            }
        };

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path }))
    }

    /// Get value by key.
    pub async fn get(&self, key: &str) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// List all keys in order.
    pub async fn keys(&self) -> Vec<String> {
        let map = self.inner.read().await;
        map.keys().cloned().collect()
    }

    /// Apply a mutation to the map and persist while still holding the write lock.
    ///
    /// On a failed save the in-memory map is rolled back to its prior state.
    pub async fn update_map<F>(&self, f: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut BTreeMap<String, V>) -> Result<(), ServiceError>,
    {
        let mut map = self.inner.write().await;
        let before = map.clone();
        if let Err(e) = f(&mut map) {
            *map = before;
            return Err(e);
        }
        let data = match serde_json::to_vec(&*map) {
            Ok(data) => data,
            Err(e) => {
                *map = before;
                return Err(e.into());
            }
        };
        if let Err(e) = write_atomic(&self.file_path, &data).await {
            *map = before;
            return Err(e);
        }
        debug!(path = %self.file_path.display(), bytes = data.len(), "store file saved");
        Ok(())
    }
}

async fn write_atomic(path: &PathBuf, data: &[u8]) -> Result<(), ServiceError> {
    let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
    fs::write(&tmp, data).await.map_err(|e| ServiceError::Backend(e.to_string()))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(ServiceError::Backend(e.to_string()));
    }
    Ok(())
}
