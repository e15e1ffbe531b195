//! Server configuration
//!
//! Resolution priority per setting:
//! 1. Command-line argument / environment variable (clap)
//! 2. TOML config file (`--config`, else `<config_dir>/recmerge/config.toml`)
//! 3. Compiled default
//!
//! The result is an immutable [`WizardConfig`] handed to the router at startup.

use rand::Rng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_OPERATION_TTL_SECS: u64 = 3600;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Optional settings from the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secret_key: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub operation_ttl_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
    pub max_upload_bytes: Option<usize>,
}

impl TomlConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config file
    ///
    /// An explicit path must exist. Without one, the per-user default location
    /// is tried and a missing file yields `None`.
    pub fn load(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path).map(Some)
    }
}

/// `<config_dir>/recmerge/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recmerge").join("config.toml"))
}

/// Settings supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secret_key: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub operation_ttl_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
    pub max_upload_bytes: Option<usize>,
}

/// Resolved, immutable server configuration
#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub host: String,
    pub port: u16,
    /// Signs session cookies
    pub secret_key: String,
    /// Directory holding persisted operations
    pub store_dir: PathBuf,
    pub operation_ttl: Duration,
    pub sweep_interval: Duration,
    pub max_upload_bytes: usize,
    /// True when no secret was configured and one was generated for this process
    pub ephemeral_secret: bool,
}

impl WizardConfig {
    pub fn resolve(cli: ConfigOverrides, file: Option<TomlConfig>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let (secret_key, ephemeral_secret) = match cli.secret_key.or(file.secret_key) {
            Some(key) if key.trim().is_empty() => {
                return Err(ConfigError::Invalid("secret_key must not be empty".to_string()))
            }
            Some(key) => (key, false),
            None => (generate_secret(), true),
        };

        let operation_ttl_secs = cli
            .operation_ttl_secs
            .or(file.operation_ttl_secs)
            .unwrap_or(DEFAULT_OPERATION_TTL_SECS);
        if operation_ttl_secs == 0 {
            return Err(ConfigError::Invalid("operation_ttl_secs must be positive".to_string()));
        }

        let sweep_interval_secs = cli
            .sweep_interval_secs
            .or(file.sweep_interval_secs)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        if sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep_interval_secs must be positive".to_string()));
        }

        Ok(Self {
            host: cli.host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            secret_key,
            store_dir: cli
                .store_dir
                .or(file.store_dir)
                .unwrap_or_else(default_store_dir),
            operation_ttl: Duration::from_secs(operation_ttl_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            max_upload_bytes: cli
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            ephemeral_secret,
        })
    }

    /// Configuration for tests and embedding: fixed secret, given store directory
    pub fn for_store(store_dir: impl Into<PathBuf>, secret_key: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            secret_key: secret_key.into(),
            store_dir: store_dir.into(),
            operation_ttl: Duration::from_secs(DEFAULT_OPERATION_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ephemeral_secret: false,
        }
    }
}

fn default_store_dir() -> PathBuf {
    std::env::temp_dir().join("recmerge-operations")
}

fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| format!("{:02x}", rng.gen::<u8>()))
        .collect()
}
