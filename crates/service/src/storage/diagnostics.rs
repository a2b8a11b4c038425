//! Side channel for soft failures.
//!
//! Every operation that swallows an error reports it here. Emission is fire
//! and forget: a sink can drop messages but can never change what the store
//! returns.

use tracing::error;

use crate::errors::ServiceError;

/// One swallowed failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Operation name as exposed to callers, e.g. `db.setObject`.
    pub operation: &'static str,
    /// Catalog the operation targeted, when known.
    pub catalog: Option<String>,
    pub kind: &'static str,
    pub message: String,
    /// Debug rendering of the underlying error.
    pub detail: String,
}

impl Diagnostic {
    pub fn new(operation: &'static str, catalog: Option<&str>, err: &ServiceError) -> Self {
        Self {
            operation,
            catalog: catalog.map(str::to_string),
            kind: err.kind(),
            message: err.to_string(),
            detail: format!("{err:?}"),
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Logs diagnostics through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, d: &Diagnostic) {
        error!(
            op = d.operation,
            catalog = d.catalog.as_deref().unwrap_or("-"),
            kind = d.kind,
            detail = %d.detail,
            "{}",
            d.message
        );
    }
}

/// Recording sink for tests
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingSink {
        seen: Mutex<Vec<Diagnostic>>,
    }

    impl RecordingSink {
        pub fn new() -> Self { Self::default() }

        pub fn diagnostics(&self) -> Vec<Diagnostic> {
            self.seen.lock().map(|v| v.clone()).unwrap_or_default()
        }

        pub fn count(&self) -> usize {
            self.seen.lock().map(|v| v.len()).unwrap_or_default()
        }

        pub fn clear(&self) {
            if let Ok(mut v) = self.seen.lock() {
                v.clear();
            }
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn emit(&self, diagnostic: &Diagnostic) {
            if let Ok(mut v) = self.seen.lock() {
                v.push(diagnostic.clone());
            }
        }
    }
}
