//! Media item representation.

use serde::{Deserialize, Serialize};

use crate::model::{AlbumId, MediaId};

/// A stored image belonging to an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique media ID.
    pub id: MediaId,

    /// Owning album.
    pub album_id: AlbumId,

    /// Full storage path (`bucket/name`).
    pub path: String,

    /// Object key inside the album's bucket, also the display name.
    pub name: String,

    /// MIME type, if known.
    #[serde(default)]
    pub media_type: Option<String>,

    #[serde(default)]
    pub is_favorite: bool,

    #[serde(default)]
    pub is_private: bool,

    /// Size in bytes.
    #[serde(default)]
    pub file_size: u64,
}

impl MediaItem {
    /// Create an item for `name` stored in `bucket`.
    pub fn new(id: MediaId, album_id: AlbumId, bucket: &str, name: &str) -> Self {
        Self {
            id,
            album_id,
            path: storage_path(bucket, name),
            name: name.to_string(),
            media_type: None,
            is_favorite: false,
            is_private: false,
            file_size: 0,
        }
    }
}

/// Build the storage path of an object.
pub fn storage_path(bucket: &str, name: &str) -> String {
    format!("{}/{}", bucket.trim_end_matches('/'), name)
}
