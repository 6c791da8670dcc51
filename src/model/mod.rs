//! Gallery records read and written by the detector.

pub mod album;
pub mod group;
pub mod item;

pub use album::Album;
pub use group::{GroupSummary, SimilarityGroup, SimilarityMembership};
pub use item::MediaItem;

/// Identity of the user owning albums and similarity groups.
pub type OwnerId = i64;

/// Album primary key.
pub type AlbumId = i64;

/// Media primary key.
pub type MediaId = i64;

/// Similarity group primary key.
pub type GroupId = i64;
