//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binary crates can prepare the
//! storage directory without depending directly on `common`.

use configs::{BackendKind, StorageConfig};

/// Ensure the data directory exists when the file backend is selected.
pub async fn ensure_env(cfg: &StorageConfig) -> anyhow::Result<()> {
    if cfg.backend == BackendKind::File {
        common::env::ensure_data_dir(&cfg.data_dir).await?;
    }
    Ok(())
}
