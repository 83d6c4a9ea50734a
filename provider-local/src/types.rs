//! Album store manifest types
//!
//! On-disk JSON layout of a [`LocalAlbumStore`](crate::LocalAlbumStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRecord {
    /// Album id
    pub id: String,

    /// Album title
    pub title: String,

    /// Item ids in attachment order; the first is the album's seed item
    #[serde(default)]
    pub item_ids: Vec<String>,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// One uploaded item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Item id, also the object file name
    pub id: String,

    /// Title given at upload time
    pub title: String,

    /// Size in bytes
    pub size: u64,

    /// Upload time
    pub uploaded_at: DateTime<Utc>,
}

/// Contents of `albums.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumManifest {
    #[serde(default)]
    pub albums: Vec<AlbumRecord>,
}

impl AlbumManifest {
    pub fn find(&self, id: &str) -> Option<&AlbumRecord> {
        self.albums.iter().find(|album| album.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut AlbumRecord> {
        self.albums.iter_mut().find(|album| album.id == id)
    }
}

/// Contents of `items.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemManifest {
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl ItemManifest {
    pub fn find(&self, id: &str) -> Option<&ItemRecord> {
        self.items.iter().find(|item| item.id == id)
    }
}
