use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Default bound on one serialized catalog: 10 MiB.
pub const DEFAULT_MAX_CATALOG_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Which property backend the store is built on.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_max_catalog_bytes")]
    pub max_catalog_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: default_data_dir(),
            namespace: default_namespace(),
            max_catalog_bytes: default_max_catalog_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of the compact human format.
    #[serde(default)]
    pub json: bool,
}

fn default_data_dir() -> String { "data".to_string() }
fn default_namespace() -> String { "campaign-manager".to_string() }
fn default_max_catalog_bytes() -> usize { DEFAULT_MAX_CATALOG_BYTES }

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file when present, otherwise defaults filled from the environment.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize_from_env();
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    /// `STORAGE_NAMESPACE` and `STORAGE_DATA_DIR` override the file when set.
    pub fn normalize_from_env(&mut self) {
        if let Some(ns) = non_blank_env("STORAGE_NAMESPACE") {
            self.namespace = ns;
        }
        if let Some(dir) = non_blank_env("STORAGE_DATA_DIR") {
            self.data_dir = dir;
        }
        self.namespace = self.namespace.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(anyhow!("storage.namespace is empty; set it in config.toml or STORAGE_NAMESPACE"));
        }
        if self.backend == BackendKind::File && self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir is required for the file backend"));
        }
        if self.max_catalog_bytes == 0 {
            return Err(anyhow!("storage.max_catalog_bytes must be >= 1"));
        }
        Ok(())
    }
}
