//! Catalog Abstractions
//!
//! Contracts for the two stores being reconciled: a source organised as
//! nested folders of media files, and a destination organised as named
//! collections of items. Both are consumed through narrow async traits so
//! the reconciliation core never depends on a concrete API, signing scheme
//! or wire format.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::Result;

/// Size of a catalog entry as reported by the backing store.
///
/// Some stores report an exact byte count, others only a human readable
/// string such as `"2.4 MB"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntrySize {
    Bytes(u64),
    Human(String),
}

impl Default for EntrySize {
    fn default() -> Self {
        Self::Bytes(0)
    }
}

/// One node in a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Catalog-side identifier (a path for folder stores, an opaque id otherwise)
    pub id: String,
    /// Name, unique within its parent listing
    pub name: String,
    /// Whether the entry groups other entries
    pub is_collection: bool,
    /// MIME type; only meaningful for leaf entries
    pub mime_type: String,
    /// Size; only meaningful for leaf entries
    pub size: EntrySize,
}

impl Entry {
    /// Create a collection entry
    pub fn collection(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_collection: true,
            mime_type: String::new(),
            size: EntrySize::default(),
        }
    }

    /// Create a leaf entry
    pub fn item(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: EntrySize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_collection: false,
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Result of listing one path in one catalog.
///
/// Names are unique: when a store returns two entries with the same name the
/// first one wins and the later ones are recorded in [`Listing::duplicates`].
/// Listings are point-in-time snapshots and are never cached across passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    entries: BTreeMap<String, Entry>,
    duplicates: Vec<String>,
}

impl Listing {
    /// An empty listing
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a listing from entries in the order the store returned them
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut listing = Self::new();
        for entry in entries {
            if listing.entries.contains_key(&entry.name) {
                listing.duplicates.push(entry.name);
            } else {
                listing.entries.insert(entry.name.clone(), entry);
            }
        }
        listing
    }

    /// Set of entry names
    pub fn names(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Metadata for a single name
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Iterate entries in name order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Names dropped because an earlier entry already used them
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the entries matching `predicate`
    pub fn filter<P>(self, mut predicate: P) -> Self
    where
        P: FnMut(&Entry) -> bool,
    {
        Self {
            entries: self
                .entries
                .into_iter()
                .filter(|(_, entry)| predicate(entry))
                .collect(),
            duplicates: self.duplicates,
        }
    }
}

/// Destination-side identifier for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionHandle(String);

impl CollectionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination-side identifier for an uploaded item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemHandle(String);

impl ItemHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Folder-organised source store.
///
/// # Errors
///
/// - `list` fails with [`BridgeError::RemoteUnavailable`](crate::BridgeError::RemoteUnavailable)
///   on transport errors and returns an empty listing for a path with no entries.
/// - `fetch` fails with `RemoteUnavailable` or [`BridgeError::NotFound`](crate::BridgeError::NotFound).
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// List entries directly under `path` (`""` is the catalog root)
    async fn list(&self, path: &str) -> Result<Listing>;

    /// Fetch the bytes of a single leaf entry
    async fn fetch(&self, path: &str) -> Result<Bytes>;
}

/// Collection-organised destination store.
///
/// # Errors
///
/// `upload` distinguishes [`BridgeError::TransientUpload`](crate::BridgeError::TransientUpload),
/// which callers may retry, from [`BridgeError::PermanentUpload`](crate::BridgeError::PermanentUpload).
#[async_trait]
pub trait DestinationCatalog: Send + Sync {
    /// List top-level collections; entry ids are collection handles
    async fn list_collections(&self) -> Result<Listing>;

    /// List items inside a collection
    async fn list_items(&self, collection: &CollectionHandle) -> Result<Listing>;

    /// Upload raw bytes as a new, unattached item
    async fn upload(&self, data: Bytes, name: &str) -> Result<ItemHandle>;

    /// Create a collection seeded with an already uploaded item
    async fn create_collection(&self, name: &str, seed: &ItemHandle) -> Result<CollectionHandle>;

    /// Attach an uploaded item to an existing collection
    async fn attach_item(&self, collection: &CollectionHandle, item: &ItemHandle) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(name: &str) -> Entry {
        Entry::item(name, name, "image/jpeg", EntrySize::Bytes(10))
    }

    #[test]
    fn test_listing_keeps_first_duplicate() {
        let mut second = jpeg("a.jpg");
        second.id = "other".to_string();

        let listing = Listing::from_entries(vec![jpeg("a.jpg"), jpeg("b.jpg"), second]);

        assert_eq!(listing.len(), 2);
        assert_eq!(listing.get("a.jpg").unwrap().id, "a.jpg");
        assert_eq!(listing.duplicates(), &["a.jpg".to_string()]);
    }

    #[test]
    fn test_listing_names_and_filter() {
        let listing = Listing::from_entries(vec![
            Entry::collection("Trips", "Trips"),
            jpeg("cover.jpg"),
        ]);

        let names: Vec<_> = listing.names().into_iter().collect();
        assert_eq!(names, vec!["Trips".to_string(), "cover.jpg".to_string()]);

        let folders = listing.filter(|e| e.is_collection);
        assert_eq!(folders.len(), 1);
        assert!(folders.get("Trips").is_some());
    }

    #[test]
    fn test_empty_listing() {
        let listing = Listing::from_entries(Vec::new());
        assert!(listing.is_empty());
        assert!(listing.names().is_empty());
    }

    #[test]
    fn test_handles_display() {
        assert_eq!(CollectionHandle::new("72157").to_string(), "72157");
        assert_eq!(ItemHandle::new("abc").as_str(), "abc");
    }
}
