//! Storage abstractions for the service layer
//!
//! A catalog is a JSON object persisted whole in one property-backend slot.
//! [`CatalogStore`] layers object CRUD, search, bulk update, backup and merge
//! on top of the narrow [`PropertyBackend`] interface.

use std::sync::Arc;

use configs::{BackendKind, StorageConfig};
use tracing::info;

use crate::errors::ServiceError;

pub mod backend;
pub mod catalog_store;
pub mod diagnostics;
pub mod file_backend;
pub mod json_map_store;
pub mod namespace;
pub mod validation;

pub use backend::{NameListFormat, PropertyBackend};
pub use catalog_store::{ops, CatalogStore, ObjectPredicate, ObjectTransformer, DEFAULT_MAX_CATALOG_BYTES};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use namespace::{with_namespace, FixedNamespace, NamespaceResolver, TaskNamespace};

/// A catalog's contents: string keys to arbitrary JSON values.
pub type Catalog = serde_json::Map<String, serde_json::Value>;

/// File name of the property file inside `data_dir`.
pub const PROPERTY_FILE: &str = "properties.json";

/// Build the store described by `cfg`.
///
/// The namespace resolver reads the per-task namespace bound with
/// [`with_namespace`] and falls back to `cfg.namespace`.
pub async fn build_store(cfg: &StorageConfig) -> Result<Arc<CatalogStore>, ServiceError> {
    let backend: Arc<dyn PropertyBackend> = match cfg.backend {
        BackendKind::Memory => Arc::new(backend::MemoryBackend::new()),
        BackendKind::File => {
            let path = std::path::Path::new(&cfg.data_dir).join(PROPERTY_FILE);
            let file = file_backend::JsonFileBackend::new(&path).await?;
            let namespaces = file.namespaces().await;
            let catalogs = file
                .list_names(&cfg.namespace, NameListFormat::Delimited)
                .await?
                .unwrap_or_default();
            info!(
                path = %path.display(),
                namespaces = namespaces.len(),
                default_namespace_catalogs = %catalogs,
                "property file opened"
            );
            file
        }
    };
    info!(
        backend = ?cfg.backend,
        data_dir = %cfg.data_dir,
        namespace = %cfg.namespace,
        max_catalog_bytes = cfg.max_catalog_bytes,
        "catalog store ready"
    );
    let store = CatalogStore::new(backend, Arc::new(TaskNamespace::new(cfg.namespace.clone())))
        .with_max_catalog_bytes(cfg.max_catalog_bytes);
    Ok(Arc::new(store))
}
