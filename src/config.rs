use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Where the relation table mirror and the connection export live
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_table_file")]
    pub table_file: String,
    #[serde(default = "default_connections_file")]
    pub connections_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            table_file: default_table_file(),
            connections_file: default_connections_file(),
        }
    }
}

/// Document extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// Element id that arms the extractor; the element itself is never emitted.
    #[serde(default = "default_sentinel_id")]
    pub sentinel_id: String,
    /// `value` given to elements that carry no `value` attribute ("performs").
    #[serde(default = "default_value")]
    pub default_value: String,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            sentinel_id: default_sentinel_id(),
            default_value: default_value(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Raw relation-type token -> display token
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct VocabularyConfig {
    pub mappings: BTreeMap<String, String>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        let mut mappings = BTreeMap::new();
        mappings.insert("include".to_string(), "Включает".to_string());
        Self { mappings }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_table_file() -> String {
    "processed_data.csv".to_string()
}

fn default_connections_file() -> String {
    "connections.csv".to_string()
}

fn default_sentinel_id() -> String {
    "1".to_string()
}

fn default_value() -> String {
    "Выполняет".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["xml".to_string(), "txt".to_string()]
}

fn default_http_port() -> u16 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec![]
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RELINK_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("RELINK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.extract.sentinel_id.is_empty() {
            anyhow::bail!("extract.sentinel_id must not be empty");
        }

        if self.extract.allowed_extensions.is_empty() {
            anyhow::bail!("extract.allowed_extensions must list at least one extension");
        }

        if self.storage.table_file.trim().is_empty() {
            anyhow::bail!("storage.table_file must not be empty");
        }

        if self.storage.connections_file.trim().is_empty() {
            anyhow::bail!("storage.connections_file must not be empty");
        }

        if self.storage.table_file == self.storage.connections_file {
            anyhow::bail!("storage.table_file and storage.connections_file must differ");
        }

        if self.http_server.port == 0 {
            anyhow::bail!("http_server.port must be greater than 0");
        }

        Ok(())
    }

    /// Directory holding the table mirror and exports
    pub fn data_dir(&self) -> &Path {
        &self.storage.data_dir
    }

    /// Path of the relation table mirror
    pub fn table_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.table_file)
    }

    /// Path of the connection query export
    pub fn connections_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.connections_file)
    }

    /// Default configuration rooted at `data_dir`
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let mut config = Self::default();
        config.storage.data_dir = data_dir.as_ref().to_path_buf();
        config
    }
}
