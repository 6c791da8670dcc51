//! Similar Media - near-duplicate photo detection for gallery albums
//!
//! This library finds visually similar images inside an album and records them
//! as similarity groups.
//!
//! # Features
//!
//! - DCT perceptual hashing of images into 64-bit values
//! - Hamming distance comparison against a tunable threshold
//! - Ownership-checked, album-wide detection with bounded concurrency
//! - Per-run scratch directories removed on every exit path
//! - SQLite stores and local or S3-like HTTP object storage
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use similar_media::{storage, Config, PerceptualHasher, SimilarityDetector, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("similar-media.toml"))?;
//!     let store = Arc::new(SqliteStore::open(&config.database.path).await?);
//!     let detector = SimilarityDetector::new(
//!         store.clone(),
//!         store.clone(),
//!         storage::from_config(&config)?,
//!         store,
//!         Arc::new(PerceptualHasher::new()),
//!         config.detection.options(),
//!     );
//!
//!     let similar = detector.detect_similar_media(1, 42).await?;
//!     println!("{} similar media", similar.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod similarity;
pub mod storage;
pub mod store;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use model::{Album, MediaItem, SimilarityGroup, SimilarityMembership};
pub use similarity::{
    hamming_distance, is_similar, DetectionOptions, DetectionReport, ImageHasher,
    PerceptualHasher, SimilarityDetector,
};
pub use storage::{HttpStorage, LocalStorage, ObjectStorage, ScratchDir};
pub use store::{AlbumStore, MediaStore, SimilarityStore, SqliteStore};
