//! Relational collaborators used by the detector.
//!
//! This module provides:
//! - Store traits for albums, media and similarity groups
//! - A SQLite implementation of all three

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{
    Album, AlbumId, GroupId, MediaId, MediaItem, OwnerId, SimilarityMembership,
};

pub use sqlite::SqliteStore;

/// Read access to albums.
#[async_trait]
pub trait AlbumStore: Send + Sync {
    /// Load an album, `None` when it does not exist.
    async fn get_album(&self, id: AlbumId) -> Result<Option<Album>>;
}

/// Read access to media records.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Find the media stored under `name` in `album`.
    async fn find_by_album_and_name(&self, album: AlbumId, name: &str)
        -> Result<Option<MediaItem>>;

    /// Load every existing media among `ids`. Unknown ids are ignored.
    async fn find_by_ids(&self, ids: &[MediaId]) -> Result<Vec<MediaItem>>;
}

/// Write access to similarity groups.
#[async_trait]
pub trait SimilarityStore: Send + Sync {
    /// Persist a new empty group and return its id.
    async fn create_group(&self, owner: OwnerId, created_at: DateTime<Utc>) -> Result<GroupId>;

    /// Insert all memberships in one batch.
    async fn insert_memberships(&self, memberships: &[SimilarityMembership]) -> Result<()>;
}
