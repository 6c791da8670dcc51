//! Album representation.

use serde::{Deserialize, Serialize};

use crate::model::{AlbumId, OwnerId};

/// An album owned by one user, backed by one storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,

    /// Owning user.
    pub owner_id: OwnerId,

    pub name: String,

    /// Storage location (bucket name) holding the album's objects.
    pub storage_location: String,

    #[serde(default)]
    pub description: String,
}

impl Album {
    /// Check whether `owner` owns this album.
    pub fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner_id == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_owned_by() {
        let album = Album {
            id: 1,
            owner_id: 7,
            name: "holidays".into(),
            storage_location: "holidays-7".into(),
            description: String::new(),
        };
        assert!(album.is_owned_by(7));
        assert!(!album.is_owned_by(8));
    }
}
