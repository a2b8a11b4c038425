use crate::errors::ServiceError;
use async_trait::async_trait;

/// Encoding requested from [`PropertyBackend::list_names`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameListFormat {
    /// JSON array of strings, e.g. `["party","locations"]`.
    Json,
    /// Comma separated names, e.g. `party,locations`.
    Delimited,
}

/// Host-provided slot store addressed by `(name, namespace)`.
///
/// Values are opaque UTF-8 strings replaced as a whole; there is no partial
/// write and no transaction spanning several calls. A single `write` is the
/// unit of atomicity.
#[async_trait]
pub trait PropertyBackend: Send + Sync {
    /// Raw slot contents, `None` when the slot was never written.
    async fn read(&self, name: &str, namespace: &str) -> Result<Option<String>, ServiceError>;
    async fn write(&self, name: &str, data: &str, namespace: &str) -> Result<(), ServiceError>;
    /// Names of the slots present in `namespace`, encoded per `format`.
    async fn list_names(&self, namespace: &str, format: NameListFormat) -> Result<Option<String>, ServiceError>;
}

/// Encode a name listing the way the host does for each format.
pub(crate) fn encode_names(names: &[String], format: NameListFormat) -> Result<String, ServiceError> {
    match format {
        NameListFormat::Json => Ok(serde_json::to_string(names)?),
        NameListFormat::Delimited => Ok(names.join(",")),
    }
}

pub use memory::MemoryBackend;

/// In-memory backend for tests and ephemeral deployments
mod memory {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::RwLock;

    #[derive(Default)]
    pub struct MemoryBackend {
        slots: RwLock<BTreeMap<(String, String), String>>, // key: (namespace, name)
        reads: AtomicUsize,
        writes: AtomicUsize,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl MemoryBackend {
        pub fn new() -> Self { Self::default() }

        /// Number of `read` calls served so far.
        pub fn reads(&self) -> usize { self.reads.load(Ordering::SeqCst) }

        /// Number of successful `write` calls so far.
        pub fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }

        /// Make every subsequent read fail with a backend error.
        pub fn fail_reads(&self, fail: bool) { self.fail_reads.store(fail, Ordering::SeqCst); }

        /// Make every subsequent write fail with a backend error.
        pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }

        /// Store raw text directly, bypassing the counters.
        pub fn put_raw(&self, name: &str, data: &str, namespace: &str) {
            if let Ok(mut slots) = self.slots.write() {
                slots.insert((namespace.to_string(), name.to_string()), data.to_string());
            }
        }

        /// Raw slot text, bypassing the counters.
        pub fn raw(&self, name: &str, namespace: &str) -> Option<String> {
            self.slots
                .read()
                .ok()
                .and_then(|slots| slots.get(&(namespace.to_string(), name.to_string())).cloned())
        }
    }

    fn poisoned() -> ServiceError { ServiceError::Backend("memory backend lock poisoned".into()) }

    #[async_trait]
    impl PropertyBackend for MemoryBackend {
        async fn read(&self, name: &str, namespace: &str) -> Result<Option<String>, ServiceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(ServiceError::Backend(format!("read of {name} refused")));
            }
            let slots = self.slots.read().map_err(|_| poisoned())?;
            Ok(slots.get(&(namespace.to_string(), name.to_string())).cloned())
        }

        async fn write(&self, name: &str, data: &str, namespace: &str) -> Result<(), ServiceError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ServiceError::Backend(format!("write of {name} refused")));
            }
            let mut slots = self.slots.write().map_err(|_| poisoned())?;
            slots.insert((namespace.to_string(), name.to_string()), data.to_string());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn list_names(&self, namespace: &str, format: NameListFormat) -> Result<Option<String>, ServiceError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(ServiceError::Backend("listing refused".into()));
            }
            let slots = self.slots.read().map_err(|_| poisoned())?;
            let names: Vec<String> = slots
                .keys()
                .filter(|(ns, _)| ns == namespace)
                .map(|(_, name)| name.clone())
                .collect();
            if names.is_empty() {
                return Ok(None);
            }
            encode_names(&names, format).map(Some)
        }
    }

}
