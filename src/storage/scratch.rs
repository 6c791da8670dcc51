//! Per-run temporary directories.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::Result;

/// Prefix of every scratch directory name.
pub const SCRATCH_PREFIX: &str = "similar-media-";

/// A uniquely named directory holding one run's downloads.
///
/// Every path handed out by [`ScratchDir::temp_path`] is removed by
/// [`ScratchDir::close`], or on drop when `close` is never reached.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    files: Mutex<Vec<PathBuf>>,
    closed: bool,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `parent`.
    pub async fn create(parent: &Path) -> Result<Self> {
        let root = parent.join(format!("{}{}", SCRATCH_PREFIX, Uuid::new_v4()));
        tokio::fs::create_dir_all(&root).await?;
        tracing::debug!("Created scratch directory {}", root.display());

        Ok(Self {
            root,
            files: Mutex::new(Vec::new()),
            closed: false,
        })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Reserve a unique file path for `key` and track it for removal.
    pub fn temp_path(&self, key: &str) -> PathBuf {
        let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        let path = self
            .root
            .join(format!("{:05}_{}", files.len(), flatten_key(key)));
        files.push(path.clone());
        path
    }

    /// Paths handed out so far.
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Best-effort removal of one temporary file.
    pub fn remove_temp(path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove temporary file {}: {}", path.display(), e);
            }
        }
    }

    /// Remove every tracked file and the directory itself.
    pub fn close(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let files = std::mem::take(&mut *self.files.lock().unwrap_or_else(|e| e.into_inner()));
        for path in &files {
            Self::remove_temp(path);
        }

        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove scratch directory {}: {}",
                    self.root.display(),
                    e
                );
            }
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Turn an object key into a single path component, keeping its extension.
fn flatten_key(key: &str) -> String {
    let flat: String = key
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let flat = flat.trim_start_matches('.');
    if flat.is_empty() {
        "object".to_string()
    } else {
        flat.to_string()
    }
}
