//! Configuration structures and loading logic.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::similarity::{DetectionOptions, DEFAULT_THRESHOLD};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "similar-media.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub detection: DetectionConfig,
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Available object storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One directory per bucket under `storage.root`.
    #[default]
    Local,
    /// S3-like HTTP API at `storage.api_url`.
    Http,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Http => write!(f, "http"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "http" => Ok(StorageBackend::Http),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the local backend.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Base URL for the http backend.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Request timeout for the http backend.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: None,
            api_url: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Detection tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Hamming distance below which two images are similar (1-64).
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Objects downloaded and hashed at once.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Parent of the per-run scratch directories.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            temp_dir: None,
        }
    }
}

impl DetectionConfig {
    /// Options handed to the detector.
    pub fn options(&self) -> DetectionOptions {
        DetectionOptions {
            threshold: self.threshold,
            max_concurrent_downloads: self.max_concurrent_downloads,
            scratch_root: self.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
        }
    }
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", "similar-media")
        .map(|dirs| dirs.data_dir().join("similar-media.db"))
        .unwrap_or_else(|| PathBuf::from("similar-media.db"))
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

fn default_max_concurrent_downloads() -> usize {
    4
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one with `similar-media init-config`",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Effective root directory of the local storage backend.
    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
