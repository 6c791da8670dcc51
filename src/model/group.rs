//! Similarity groups and their memberships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{GroupId, MediaId, OwnerId};

/// One detection run over one album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityGroup {
    pub id: GroupId,
    pub owner_id: OwnerId,
    pub created_at: DateTime<Utc>,
}

/// Association of one media item with one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityMembership {
    pub group_id: GroupId,
    pub media_id: MediaId,

    /// `100 - distance`; informational only.
    pub score: u32,
}

/// A group together with its number of memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: SimilarityGroup,
    pub members: usize,
}
