//! Namespace resolution.
//!
//! The store asks for the caller's namespace on every operation and hands the
//! answer straight to the backend; no validation is applied to it.

use std::future::Future;

tokio::task_local! {
    static CURRENT_NAMESPACE: String;
}

/// Produces the storage namespace for the current caller.
pub trait NamespaceResolver: Send + Sync {
    fn current_namespace(&self) -> String;
}

/// Always resolves to the same namespace.
#[derive(Debug, Clone)]
pub struct FixedNamespace(pub String);

impl FixedNamespace {
    pub fn new(namespace: impl Into<String>) -> Self { Self(namespace.into()) }
}

impl NamespaceResolver for FixedNamespace {
    fn current_namespace(&self) -> String { self.0.clone() }
}

/// Resolves to the namespace bound with [`with_namespace`] for the running
/// task, or to `fallback` outside such a scope.
#[derive(Debug, Clone)]
pub struct TaskNamespace {
    fallback: String,
}

impl TaskNamespace {
    pub fn new(fallback: impl Into<String>) -> Self { Self { fallback: fallback.into() } }
}

impl NamespaceResolver for TaskNamespace {
    fn current_namespace(&self) -> String {
        CURRENT_NAMESPACE
            .try_with(|ns| ns.clone())
            .unwrap_or_else(|_| self.fallback.clone())
    }
}

/// Run `fut` with `namespace` as the caller namespace seen by [`TaskNamespace`].
pub async fn with_namespace<F>(namespace: String, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT_NAMESPACE.scope(namespace, fut).await
}
