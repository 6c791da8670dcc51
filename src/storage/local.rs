//! Directory-backed object storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::storage::{ObjectStorage, ScratchDir};

/// Object storage where each bucket is a sub-directory of `root`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, location: &str) -> Result<PathBuf> {
        validate_component(location, "bucket")?;
        Ok(self.root.join(location.trim_end_matches('/')))
    }
}

/// Reject names that could escape the storage root.
fn validate_component(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Storage(format!("Empty {} name", what)));
    }
    let escapes = name
        .split('/')
        .any(|component| component == ".." || component == ".");
    if escapes || name.contains('\\') || name.contains('\0') || name.starts_with('/') {
        return Err(Error::Storage(format!("Invalid {} name: '{}'", what, name)));
    }
    Ok(())
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn list_objects(&self, location: &str) -> Result<Vec<String>> {
        let dir = self.bucket_dir(location)?;
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
            Error::Storage(format!("Cannot list bucket {}: {}", dir.display(), e))
        })?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("Cannot list bucket {}: {}", dir.display(), e)))?
        {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn download_to_temp(
        &self,
        location: &str,
        key: &str,
        scratch: &ScratchDir,
    ) -> Result<PathBuf> {
        validate_component(key, "object")?;
        let source = self.bucket_dir(location)?.join(key);
        let target = scratch.temp_path(key);

        tokio::fs::copy(&source, &target).await.map_err(|e| {
            Error::Storage(format!("Cannot download {}: {}", source.display(), e))
        })?;

        Ok(target)
    }
}
