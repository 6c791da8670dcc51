//! Object storage collaborators.
//!
//! Provides:
//! - The `ObjectStorage` trait consumed by the detector
//! - A directory-backed implementation (one sub-directory per bucket)
//! - An HTTP implementation for S3-like APIs
//! - Per-run scratch directories for temporary downloads

pub mod http;
pub mod local;
pub mod scratch;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StorageBackend};
use crate::error::{Error, Result};

pub use http::HttpStorage;
pub use local::LocalStorage;
pub use scratch::ScratchDir;

/// Remote object store holding album files.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// List every object key under `location`.
    async fn list_objects(&self, location: &str) -> Result<Vec<String>>;

    /// Materialize `key` as a local file inside `scratch` and return its path.
    async fn download_to_temp(
        &self,
        location: &str,
        key: &str,
        scratch: &ScratchDir,
    ) -> Result<PathBuf>;
}

/// Build the storage backend selected in `config`.
pub fn from_config(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    match config.storage.backend {
        StorageBackend::Local => Ok(Arc::new(LocalStorage::new(config.storage_root()))),
        StorageBackend::Http => {
            let api_url = config
                .storage
                .api_url
                .as_deref()
                .ok_or_else(|| Error::MissingConfig("storage.api_url".to_string()))?;
            Ok(Arc::new(HttpStorage::new(api_url, config.storage.timeout())?))
        }
    }
}

/// Human-readable description of where objects are read from.
pub fn describe(config: &Config) -> String {
    match config.storage.backend {
        StorageBackend::Local => config.storage_root().display().to_string(),
        StorageBackend::Http => config.storage.api_url.clone().unwrap_or_default(),
    }
}
