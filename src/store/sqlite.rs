//! SQLite-backed stores.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::model::{
    Album, AlbumId, GroupId, GroupSummary, MediaId, MediaItem, OwnerId, SimilarityGroup,
    SimilarityMembership,
};
use crate::store::{AlbumStore, MediaStore, SimilarityStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL UNIQUE,
    bucket_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    album_id INTEGER NOT NULL REFERENCES albums(id),
    path TEXT NOT NULL,
    name TEXT NOT NULL,
    type TEXT,
    is_favorite INTEGER NOT NULL DEFAULT 0,
    is_private INTEGER NOT NULL DEFAULT 0,
    file_size INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS media_album_name ON media(album_id, name);
CREATE TABLE IF NOT EXISTS similar_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS similar_media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    similar_group_id INTEGER NOT NULL REFERENCES similar_groups(id),
    media_id INTEGER NOT NULL REFERENCES media(id),
    similarity_score INTEGER NOT NULL
);
";

const MEDIA_COLUMNS: &str =
    "id, album_id, path, name, type, is_favorite, is_private, file_size";

/// Album, media and similarity stores over one SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let connection = Connection::open(path).await?;
        Self::with_connection(connection).await
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().await?;
        Self::with_connection(connection).await
    }

    async fn with_connection(connection: Connection) -> Result<Self> {
        connection
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(Self { connection })
    }

    fn row_to_album(row: &Row) -> rusqlite::Result<Album> {
        Ok(Album {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            storage_location: row.get(3)?,
            description: row.get(4)?,
        })
    }

    fn row_to_media(row: &Row) -> rusqlite::Result<MediaItem> {
        Ok(MediaItem {
            id: row.get(0)?,
            album_id: row.get(1)?,
            path: row.get(2)?,
            name: row.get(3)?,
            media_type: row.get(4)?,
            is_favorite: row.get(5)?,
            is_private: row.get(6)?,
            file_size: row.get::<_, i64>(7)?.max(0) as u64,
        })
    }

    /// Insert an album; `album.id` is ignored and the new id returned.
    pub async fn insert_album(&self, album: &Album) -> Result<AlbumId> {
        let album = album.clone();
        let id = self
            .connection
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO albums (user_id, name, bucket_name, description) VALUES (?, ?, ?, ?)",
                    params![album.owner_id, album.name, album.storage_location, album.description],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Insert a media record; `item.id` is ignored and the new id returned.
    pub async fn insert_media(&self, item: &MediaItem) -> Result<MediaId> {
        let item = item.clone();
        let id = self
            .connection
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO media (album_id, path, name, type, is_favorite, is_private, file_size) VALUES (?, ?, ?, ?, ?, ?, ?)",
                    params![
                        item.album_id,
                        item.path,
                        item.name,
                        item.media_type,
                        item.is_favorite,
                        item.is_private,
                        item.file_size as i64
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Groups created for `owner`, newest first, with their membership counts.
    pub async fn list_groups(&self, owner: OwnerId) -> Result<Vec<GroupSummary>> {
        let groups = self
            .connection
            .call(move |conn| {
                let mut query = conn.prepare(
                    "SELECT g.id, g.user_id, g.created_at, COUNT(m.id)
                     FROM similar_groups g
                     LEFT JOIN similar_media m ON m.similar_group_id = g.id
                     WHERE g.user_id = ?
                     GROUP BY g.id
                     ORDER BY g.created_at DESC, g.id DESC",
                )?;
                let rows = query.query_map([owner], |row| {
                    Ok(GroupSummary {
                        group: SimilarityGroup {
                            id: row.get(0)?,
                            owner_id: row.get(1)?,
                            created_at: row.get::<_, DateTime<Utc>>(2)?,
                        },
                        members: row.get::<_, i64>(3)?.max(0) as usize,
                    })
                })?;
                let groups = rows.collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
                Ok(groups)
            })
            .await?;
        Ok(groups)
    }

    /// Memberships recorded for one group, in insertion order.
    pub async fn group_memberships(&self, group: GroupId) -> Result<Vec<SimilarityMembership>> {
        let memberships = self
            .connection
            .call(move |conn| {
                let mut query = conn.prepare(
                    "SELECT similar_group_id, media_id, similarity_score FROM similar_media
                     WHERE similar_group_id = ? ORDER BY id",
                )?;
                let rows = query.query_map([group], |row| {
                    Ok(SimilarityMembership {
                        group_id: row.get(0)?,
                        media_id: row.get(1)?,
                        score: row.get(2)?,
                    })
                })?;
                let memberships =
                    rows.collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
                Ok(memberships)
            })
            .await?;
        Ok(memberships)
    }
}

#[async_trait]
impl AlbumStore for SqliteStore {
    async fn get_album(&self, id: AlbumId) -> Result<Option<Album>> {
        let album = self
            .connection
            .call(move |conn| {
                let album = conn
                    .query_row(
                        "SELECT id, user_id, name, bucket_name, description FROM albums WHERE id = ?",
                        [id],
                        Self::row_to_album,
                    )
                    .optional()?;
                Ok(album)
            })
            .await?;
        Ok(album)
    }
}

#[async_trait]
impl MediaStore for SqliteStore {
    async fn find_by_album_and_name(
        &self,
        album: AlbumId,
        name: &str,
    ) -> Result<Option<MediaItem>> {
        let name = name.to_string();
        let item = self
            .connection
            .call(move |conn| {
                let item = conn
                    .query_row(
                        &format!(
                            "SELECT {} FROM media WHERE album_id = ? AND name = ? ORDER BY id LIMIT 1",
                            MEDIA_COLUMNS
                        ),
                        params![album, name],
                        Self::row_to_media,
                    )
                    .optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    async fn find_by_ids(&self, ids: &[MediaId]) -> Result<Vec<MediaItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        let items = self
            .connection
            .call(move |conn| {
                let placeholders = vec!["?"; ids.len()].join(", ");
                let mut query = conn.prepare(&format!(
                    "SELECT {} FROM media WHERE id IN ({}) ORDER BY id",
                    MEDIA_COLUMNS, placeholders
                ))?;
                let rows = query.query_map(params_from_iter(ids.iter()), Self::row_to_media)?;
                let items = rows.collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }
}

#[async_trait]
impl SimilarityStore for SqliteStore {
    async fn create_group(&self, owner: OwnerId, created_at: DateTime<Utc>) -> Result<GroupId> {
        let id = self
            .connection
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO similar_groups (user_id, created_at) VALUES (?, ?)",
                    params![owner, created_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    async fn insert_memberships(&self, memberships: &[SimilarityMembership]) -> Result<()> {
        if memberships.is_empty() {
            return Ok(());
        }
        let memberships = memberships.to_vec();
        self.connection
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut insert = tx.prepare(
                        "INSERT INTO similar_media (similar_group_id, media_id, similarity_score) VALUES (?, ?, ?)",
                    )?;
                    for membership in &memberships {
                        insert.execute(params![
                            membership.group_id,
                            membership.media_id,
                            membership.score
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (SqliteStore, AlbumId) {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let album = store
            .insert_album(&Album {
                id: 0,
                owner_id: 7,
                name: "holidays".into(),
                storage_location: "holidays-7".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        (store, album)
    }

    #[tokio::test]
    async fn test_album_lookup() {
        let (store, album_id) = seeded().await;
        let album = store.get_album(album_id).await.unwrap().unwrap();
        assert_eq!(album.owner_id, 7);
        assert_eq!(album.storage_location, "holidays-7");
        assert!(store.get_album(album_id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_media_lookup_is_scoped_to_album() {
        let (store, album_id) = seeded().await;
        let id = store
            .insert_media(&MediaItem::new(0, album_id, "holidays-7", "beach.jpg"))
            .await
            .unwrap();

        let found = store
            .find_by_album_and_name(album_id, "beach.jpg")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.path, "holidays-7/beach.jpg");

        assert!(store
            .find_by_album_and_name(album_id + 1, "beach.jpg")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_album_and_name(album_id, "missing.jpg")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_ids_ignores_unknown() {
        let (store, album_id) = seeded().await;
        let a = store
            .insert_media(&MediaItem::new(0, album_id, "holidays-7", "a.jpg"))
            .await
            .unwrap();
        let b = store
            .insert_media(&MediaItem::new(0, album_id, "holidays-7", "b.jpg"))
            .await
            .unwrap();

        let items = store.find_by_ids(&[b, a, 999]).await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(store.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_groups_and_memberships() {
        let (store, album_id) = seeded().await;
        let media = store
            .insert_media(&MediaItem::new(0, album_id, "holidays-7", "a.jpg"))
            .await
            .unwrap();

        let empty = store.create_group(7, Utc::now()).await.unwrap();
        let full = store.create_group(7, Utc::now()).await.unwrap();
        store
            .insert_memberships(&[
                SimilarityMembership {
                    group_id: full,
                    media_id: media,
                    score: 99,
                },
                SimilarityMembership {
                    group_id: full,
                    media_id: media,
                    score: 90,
                },
            ])
            .await
            .unwrap();

        let memberships = store.group_memberships(full).await.unwrap();
        assert_eq!(memberships.len(), 2);
        assert_eq!(memberships[0].score, 99);
        assert!(store.group_memberships(empty).await.unwrap().is_empty());

        let groups = store.list_groups(7).await.unwrap();
        assert_eq!(groups.len(), 2);
        let counts: Vec<_> = groups.iter().map(|g| (g.group.id, g.members)).collect();
        assert!(counts.contains(&(full, 2)));
        assert!(counts.contains(&(empty, 0)));
        assert!(store.list_groups(8).await.unwrap().is_empty());
    }
}
