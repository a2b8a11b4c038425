#![cfg(test)]
use std::sync::Arc;

use crate::storage::backend::MemoryBackend;
use crate::storage::diagnostics::mock::RecordingSink;
use crate::storage::namespace::FixedNamespace;
use crate::storage::CatalogStore;

pub const NAMESPACE: &str = "test-namespace";

/// In-memory store wired to a recording sink, plus handles to both.
pub fn fixture() -> (Arc<MemoryBackend>, Arc<RecordingSink>, CatalogStore) {
    let backend = Arc::new(MemoryBackend::new());
    let sink = Arc::new(RecordingSink::new());
    let store = CatalogStore::new(backend.clone(), Arc::new(FixedNamespace::new(NAMESPACE)))
        .with_sink(sink.clone());
    (backend, sink, store)
}
