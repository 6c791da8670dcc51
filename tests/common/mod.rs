//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use similar_media::error::{Error, Result};
use similar_media::model::{
    Album, AlbumId, GroupId, MediaId, MediaItem, OwnerId, SimilarityGroup, SimilarityMembership,
};
use similar_media::similarity::{hash_from_hex, hash_to_hex, DetectionOptions, ImageHasher};
use similar_media::storage::{ObjectStorage, ScratchDir};
use similar_media::store::{AlbumStore, MediaStore, SimilarityStore};
use similar_media::SimilarityDetector;

pub const OWNER: OwnerId = 7;
pub const ALBUM: AlbumId = 1;
pub const BUCKET: &str = "album-1";

/// In-memory album, media and similarity stores.
#[derive(Default)]
pub struct MemoryStore {
    pub albums: Vec<Album>,
    pub media: Vec<MediaItem>,
    pub groups: Mutex<Vec<SimilarityGroup>>,
    pub memberships: Mutex<Vec<SimilarityMembership>>,
    pub fail_create_group: bool,
    pub fail_insert_memberships: bool,
    pub name_lookups: AtomicUsize,
}

impl MemoryStore {
    /// Store with album [`ALBUM`] owned by [`OWNER`] and one media per name.
    pub fn with_media(names: &[&str]) -> Self {
        let media = names
            .iter()
            .enumerate()
            .map(|(i, name)| MediaItem::new(i as MediaId + 1, ALBUM, BUCKET, name))
            .collect();

        Self {
            albums: vec![Album {
                id: ALBUM,
                owner_id: OWNER,
                name: "holidays".into(),
                storage_location: BUCKET.into(),
                description: String::new(),
            }],
            media,
            ..Default::default()
        }
    }

    pub fn media_id(&self, name: &str) -> MediaId {
        self.media
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.id)
            .unwrap_or_else(|| panic!("no media named {}", name))
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().unwrap().len()
    }

    pub fn memberships(&self) -> Vec<SimilarityMembership> {
        self.memberships.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlbumStore for MemoryStore {
    async fn get_album(&self, id: AlbumId) -> Result<Option<Album>> {
        Ok(self.albums.iter().find(|a| a.id == id).cloned())
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn find_by_album_and_name(
        &self,
        album: AlbumId,
        name: &str,
    ) -> Result<Option<MediaItem>> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .media
            .iter()
            .find(|m| m.album_id == album && m.name == name)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[MediaId]) -> Result<Vec<MediaItem>> {
        Ok(self
            .media
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SimilarityStore for MemoryStore {
    async fn create_group(&self, owner: OwnerId, created_at: DateTime<Utc>) -> Result<GroupId> {
        if self.fail_create_group {
            return Err(Error::Persistence("database is locked".into()));
        }
        let mut groups = self.groups.lock().unwrap();
        let id = groups.len() as GroupId + 1;
        groups.push(SimilarityGroup {
            id,
            owner_id: owner,
            created_at,
        });
        Ok(id)
    }

    async fn insert_memberships(&self, memberships: &[SimilarityMembership]) -> Result<()> {
        if self.fail_insert_memberships {
            return Err(Error::Persistence("disk full".into()));
        }
        self.memberships
            .lock()
            .unwrap()
            .extend_from_slice(memberships);
        Ok(())
    }
}

/// Object storage serving in-memory bodies, with failure injection and counters.
#[derive(Default)]
pub struct FakeStorage {
    pub objects: HashMap<String, Vec<(String, Vec<u8>)>>,
    pub failing_downloads: HashSet<String>,
    pub fail_listing: bool,
    pub download_delay: Option<Duration>,
    pub list_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub downloaded: Mutex<Vec<PathBuf>>,
}

impl FakeStorage {
    /// Storage whose bucket [`BUCKET`] holds one file per `(key, hash)`; the
    /// body is the hash in hex, as read by [`HexHasher`].
    pub fn with_hashes(objects: &[(&str, u64)]) -> Self {
        let bodies = objects
            .iter()
            .map(|(key, hash)| (key.to_string(), hash_to_hex(*hash).into_bytes()))
            .collect();
        let mut storage = Self::default();
        storage.objects.insert(BUCKET.to_string(), bodies);
        storage
    }

    /// Add an object with an arbitrary body.
    pub fn add_raw(&mut self, key: &str, body: &[u8]) {
        self.objects
            .entry(BUCKET.to_string())
            .or_default()
            .push((key.to_string(), body.to_vec()));
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn downloaded(&self) -> Vec<PathBuf> {
        self.downloaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn list_objects(&self, location: &str) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(Error::Storage("connection refused".into()));
        }
        Ok(self
            .objects
            .get(location)
            .map(|objects| objects.iter().map(|(key, _)| key.clone()).collect())
            .unwrap_or_default())
    }

    async fn download_to_temp(
        &self,
        location: &str,
        key: &str,
        scratch: &ScratchDir,
    ) -> Result<PathBuf> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.download_delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.write_object(location, key, scratch);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl FakeStorage {
    fn write_object(&self, location: &str, key: &str, scratch: &ScratchDir) -> Result<PathBuf> {
        if self.failing_downloads.contains(key) {
            return Err(Error::Storage(format!("{} timed out", key)));
        }
        let body = self
            .objects
            .get(location)
            .and_then(|objects| objects.iter().find(|(k, _)| k == key))
            .map(|(_, body)| body.clone())
            .ok_or_else(|| Error::Storage(format!("{} not found", key)))?;

        let path = scratch.temp_path(key);
        std::fs::write(&path, body)?;
        self.downloaded.lock().unwrap().push(path.clone());
        Ok(path)
    }
}

/// Hasher reading the hash as hex text from the file body.
pub struct HexHasher;

impl ImageHasher for HexHasher {
    fn hash_file(&self, path: &Path) -> Result<u64> {
        let body = std::fs::read_to_string(path)
            .map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))?;
        hash_from_hex(&body).ok_or_else(|| Error::Decode(format!("{}: not a hash", path.display())))
    }
}

/// [`HexHasher`] that blocks its thread before answering.
pub struct SlowHasher {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl ImageHasher for SlowHasher {
    fn hash_file(&self, path: &Path) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        HexHasher.hash_file(path)
    }
}

/// Detector over the given fakes, with scratch directories under `scratch_root`.
pub fn detector(
    store: Arc<MemoryStore>,
    storage: Arc<FakeStorage>,
    scratch_root: &Path,
    max_concurrent_downloads: usize,
) -> SimilarityDetector {
    detector_with_hasher(
        store,
        storage,
        Arc::new(HexHasher),
        scratch_root,
        max_concurrent_downloads,
    )
}

/// Like [`detector`], with a custom hasher.
pub fn detector_with_hasher(
    store: Arc<MemoryStore>,
    storage: Arc<FakeStorage>,
    hasher: Arc<dyn ImageHasher>,
    scratch_root: &Path,
    max_concurrent_downloads: usize,
) -> SimilarityDetector {
    SimilarityDetector::new(
        store.clone(),
        store.clone(),
        storage,
        store,
        hasher,
        DetectionOptions {
            threshold: 20,
            max_concurrent_downloads,
            scratch_root: scratch_root.to_path_buf(),
        },
    )
}

/// Number of entries left in a directory.
pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Creates a temporary directory for test output.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}
