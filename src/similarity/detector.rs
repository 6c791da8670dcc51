//! Album-wide near-duplicate detection.
//!
//! A run verifies album ownership, lists the album's objects, records a new
//! similarity group, downloads and hashes every object into a per-run scratch
//! directory, compares all hash pairs and persists the memberships of the
//! pairs judged similar. Per-file failures skip that file; the scratch
//! directory is removed on every exit path.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::model::{
    Album, AlbumId, GroupId, MediaId, MediaItem, OwnerId, SimilarityMembership,
};
use crate::similarity::distance::{
    find_similar_pairs, similarity_score, DEFAULT_THRESHOLD,
};
use crate::similarity::hash::{hash_to_hex, ImageHasher};
use crate::storage::{ObjectStorage, ScratchDir};
use crate::store::{AlbumStore, MediaStore, SimilarityStore};

/// Default number of objects downloaded and hashed at once.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

/// Tunables for one detector.
#[derive(Debug, Clone)]
pub struct DetectionOptions {
    /// Pairs with a Hamming distance strictly below this are similar.
    pub threshold: u32,

    /// Upper bound on concurrent download + hash tasks.
    pub max_concurrent_downloads: usize,

    /// Directory under which each run creates its scratch directory.
    pub scratch_root: PathBuf,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            scratch_root: std::env::temp_dir(),
        }
    }
}

/// Why an object was left out of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Download,
    Decode,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Download => write!(f, "download failed"),
            SkipReason::Decode => write!(f, "not a readable image"),
        }
    }
}

/// An object that could not be hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedObject {
    pub key: String,
    pub reason: SkipReason,
    pub message: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub group_id: GroupId,
    pub album_id: AlbumId,

    /// Objects listed in storage.
    pub listed: usize,

    /// Objects successfully hashed.
    pub hashed: usize,

    pub skipped: Vec<SkippedObject>,

    /// Rows inserted for this run's group, two per similar pair.
    pub memberships: Vec<SimilarityMembership>,

    /// Distinct media referenced by `memberships`, ordered by id.
    pub media: Vec<MediaItem>,
}

struct HashedObject {
    key: String,
    path: PathBuf,
    hash: u64,
}

enum HashOutcome {
    Hashed(HashedObject),
    Skipped(SkippedObject),
}

/// Groups visually similar media of an album.
pub struct SimilarityDetector {
    albums: Arc<dyn AlbumStore>,
    media: Arc<dyn MediaStore>,
    storage: Arc<dyn ObjectStorage>,
    similarity: Arc<dyn SimilarityStore>,
    hasher: Arc<dyn ImageHasher>,
    options: DetectionOptions,
}

impl SimilarityDetector {
    pub fn new(
        albums: Arc<dyn AlbumStore>,
        media: Arc<dyn MediaStore>,
        storage: Arc<dyn ObjectStorage>,
        similarity: Arc<dyn SimilarityStore>,
        hasher: Arc<dyn ImageHasher>,
        options: DetectionOptions,
    ) -> Self {
        Self {
            albums,
            media,
            storage,
            similarity,
            hasher,
            options,
        }
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Detect similar media in `album` on behalf of `owner` and return them.
    ///
    /// An empty list means no similar pair was found.
    pub async fn detect_similar_media(
        &self,
        owner: OwnerId,
        album: AlbumId,
    ) -> Result<Vec<MediaItem>> {
        let report = self.run(owner, album, &CancellationToken::new()).await?;
        Ok(report.media)
    }

    /// Run one detection, stopping early with [`Error::Cancelled`] when
    /// `cancel` fires.
    pub async fn run(
        &self,
        owner: OwnerId,
        album: AlbumId,
        cancel: &CancellationToken,
    ) -> Result<DetectionReport> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Detection for album {} cancelled", album);
                Err(Error::Cancelled)
            }
            result = self.execute(owner, album) => result,
        }
    }

    async fn execute(&self, owner: OwnerId, album_id: AlbumId) -> Result<DetectionReport> {
        tracing::info!(
            "Starting detection of similar media for owner {} in album {}",
            owner,
            album_id
        );

        let album = self
            .albums
            .get_album(album_id)
            .await?
            .ok_or(Error::NotFound(album_id))?;
        if !album.is_owned_by(owner) {
            return Err(Error::Forbidden {
                owner,
                album: album_id,
            });
        }

        let keys = self
            .storage
            .list_objects(&album.storage_location)
            .await
            .map_err(|e| storage_error("Failed to list album objects", e))?;
        if keys.len() < 2 {
            return Err(Error::InsufficientData { found: keys.len() });
        }
        tracing::info!("{} objects listed for album {}", keys.len(), album_id);

        let group_id = self
            .similarity
            .create_group(owner, Utc::now())
            .await
            .map_err(|e| persistence_error("Failed to create similarity group", e))?;

        let scratch = ScratchDir::create(&self.options.scratch_root).await?;
        let result = self.group_album(&album, group_id, keys, &scratch).await;
        scratch.close();

        result
    }

    async fn group_album(
        &self,
        album: &Album,
        group_id: GroupId,
        keys: Vec<String>,
        scratch: &ScratchDir,
    ) -> Result<DetectionReport> {
        let listed = keys.len();
        let location = album.storage_location.as_str();

        let outcomes: Vec<HashOutcome> = stream::iter(keys)
            .map(move |key| self.hash_object(location, key, scratch))
            .buffer_unordered(self.options.max_concurrent_downloads.max(1))
            .collect()
            .await;

        let mut hashed = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                HashOutcome::Hashed(object) => hashed.push(object),
                HashOutcome::Skipped(object) => skipped.push(object),
            }
        }

        if hashed.len() < 2 {
            return Err(Error::InsufficientData {
                found: hashed.len(),
            });
        }

        // Completion order is arbitrary; compare in key order.
        hashed.sort_by(|a, b| a.key.cmp(&b.key));
        let entries: Vec<(&str, u64)> = hashed.iter().map(|h| (h.key.as_str(), h.hash)).collect();
        let pairs = find_similar_pairs(&entries, self.options.threshold);

        let mut resolved: HashMap<String, Option<MediaId>> = HashMap::new();
        let mut memberships = Vec::with_capacity(pairs.len() * 2);

        for pair in &pairs {
            tracing::debug!(
                "Similar media found: {} and {} (distance: {})",
                pair.left,
                pair.right,
                pair.distance
            );

            let left = self.resolve_media(album.id, pair.left, &mut resolved).await;
            let right = self.resolve_media(album.id, pair.right, &mut resolved).await;
            let (Some(left), Some(right)) = (left, right) else {
                continue;
            };

            let score = similarity_score(pair.distance);
            for media_id in [left, right] {
                memberships.push(SimilarityMembership {
                    group_id,
                    media_id,
                    score,
                });
            }
        }

        if !memberships.is_empty() {
            self.similarity
                .insert_memberships(&memberships)
                .await
                .map_err(|e| persistence_error("Failed to save similarity data", e))?;
        }

        let ids: Vec<MediaId> = memberships
            .iter()
            .map(|m| m.media_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut media = if ids.is_empty() {
            Vec::new()
        } else {
            self.media.find_by_ids(&ids).await?
        };
        media.sort_by_key(|m| m.id);

        tracing::info!(
            "Similar media detection completed for album {}: {} media found",
            album.id,
            media.len()
        );

        Ok(DetectionReport {
            group_id,
            album_id: album.id,
            listed,
            hashed: hashed.len(),
            skipped,
            memberships,
            media,
        })
    }

    /// Download one object and hash it. Failures are reported, never raised.
    async fn hash_object(&self, location: &str, key: String, scratch: &ScratchDir) -> HashOutcome {
        let path = match self.storage.download_to_temp(location, &key, scratch).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Download error for {}: {}", key, e);
                return HashOutcome::Skipped(SkippedObject {
                    key,
                    reason: SkipReason::Download,
                    message: e.to_string(),
                });
            }
        };

        let hasher = Arc::clone(&self.hasher);
        let hash_path = path.clone();
        // Cancellation drops this future without waiting; a started blocking
        // hash runs to completion detached and its result is discarded.
        let hashed = tokio::task::spawn_blocking(move || hasher.hash_file(&hash_path)).await;

        let error = match hashed {
            Ok(Ok(hash)) => {
                tracing::debug!("{} -> {} ({})", key, hash_to_hex(hash), path.display());
                return HashOutcome::Hashed(HashedObject { key, path, hash });
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("hashing task failed: {}", e),
        };

        tracing::warn!("Error computing hash for {}: {}", key, error);
        HashOutcome::Skipped(SkippedObject {
            key,
            reason: SkipReason::Decode,
            message: error,
        })
    }

    /// Look up the media stored under `key`, memoised per run.
    ///
    /// Storage and database may drift; a key without a record resolves to `None`.
    async fn resolve_media(
        &self,
        album: AlbumId,
        key: &str,
        resolved: &mut HashMap<String, Option<MediaId>>,
    ) -> Option<MediaId> {
        if let Some(id) = resolved.get(key) {
            return *id;
        }

        let id = match self.media.find_by_album_and_name(album, key).await {
            Ok(Some(item)) => Some(item.id),
            Ok(None) => {
                tracing::debug!("No media record for {} in album {}", key, album);
                None
            }
            Err(e) => {
                tracing::debug!("Media lookup for {} failed: {}", key, e);
                None
            }
        };

        resolved.insert(key.to_string(), id);
        id
    }
}

fn storage_error(context: &str, err: Error) -> Error {
    match err {
        Error::Storage(message) => Error::Storage(format!("{}: {}", context, message)),
        other => Error::Storage(format!("{}: {}", context, other)),
    }
}

fn persistence_error(context: &str, err: Error) -> Error {
    match err {
        Error::Persistence(message) => Error::Persistence(format!("{}: {}", context, message)),
        other => Error::Persistence(format!("{}: {}", context, other)),
    }
}
