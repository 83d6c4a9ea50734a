//! Directory-backed album store
//!
//! Implements `DestinationCatalog` on a local directory laid out as:
//!
//! ```text
//! <root>/
//!   albums.json      album ids, titles and ordered item ids
//!   items.json       item ids, titles and sizes
//!   objects/<id>     uploaded bytes
//! ```
//!
//! Manifests are re-read on every call and rewritten atomically (temp file +
//! rename) on every mutation.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{CollectionHandle, DestinationCatalog, Entry, EntrySize, ItemHandle, Listing};
use bytes::Bytes;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::LocalProviderError;
use crate::mime::guess_mime_type;
use crate::types::{AlbumManifest, AlbumRecord, ItemManifest, ItemRecord};

const ALBUMS_FILE: &str = "albums.json";
const ITEMS_FILE: &str = "items.json";
const OBJECTS_DIR: &str = "objects";

type LocalResult<T> = std::result::Result<T, LocalProviderError>;

/// Album store kept in a local directory.
///
/// # Example
///
/// ```ignore
/// use provider_local::LocalAlbumStore;
/// use bridge_traits::DestinationCatalog;
///
/// let store = LocalAlbumStore::open("/srv/albums", None).await?;
/// let item = store.upload(bytes, "a.jpg").await?;
/// let album = store.create_collection("Trips", &item).await?;
/// ```
pub struct LocalAlbumStore {
    root: PathBuf,
    quota_bytes: Option<u64>,
    /// Serialises manifest read-modify-write cycles
    lock: Mutex<()>,
}

impl LocalAlbumStore {
    /// Store rooted at `root` without touching the file system.
    ///
    /// A missing root lists as empty; directories appear on the first upload.
    /// Uploads larger than `quota_bytes` are rejected permanently.
    pub fn new(root: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Self {
        Self {
            root: root.into(),
            quota_bytes,
            lock: Mutex::new(()),
        }
    }

    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>, quota_bytes: Option<u64>) -> LocalResult<Self> {
        let store = Self::new(root, quota_bytes);
        tokio::fs::create_dir_all(store.root.join(OBJECTS_DIR)).await?;

        debug!(root = %store.root.display(), ?quota_bytes, "Opened album store");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, item_id: &str) -> PathBuf {
        self.root.join(OBJECTS_DIR).join(item_id)
    }

    async fn load_albums(&self) -> LocalResult<AlbumManifest> {
        load_manifest(&self.root.join(ALBUMS_FILE)).await
    }

    async fn load_items(&self) -> LocalResult<ItemManifest> {
        load_manifest(&self.root.join(ITEMS_FILE)).await
    }

    async fn save_albums(&self, manifest: &AlbumManifest) -> LocalResult<()> {
        save_manifest(&self.root.join(ALBUMS_FILE), manifest).await
    }

    async fn save_items(&self, manifest: &ItemManifest) -> LocalResult<()> {
        save_manifest(&self.root.join(ITEMS_FILE), manifest).await
    }

    async fn store_item(&self, data: Bytes, title: &str) -> LocalResult<ItemRecord> {
        if title.is_empty() {
            return Err(LocalProviderError::EmptyTitle);
        }

        let size = data.len() as u64;
        if let Some(quota) = self.quota_bytes {
            if size > quota {
                return Err(LocalProviderError::QuotaExceeded { size, quota });
            }
        }

        let record = ItemRecord {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            size,
            uploaded_at: Utc::now(),
        };

        tokio::fs::create_dir_all(self.root.join(OBJECTS_DIR)).await?;
        write_atomic(&self.object_path(&record.id), &data)
            .await
            .map_err(|source| LocalProviderError::ObjectWrite {
                item_id: record.id.clone(),
                source,
            })?;

        let _guard = self.lock.lock().await;
        let mut items = self.load_items().await?;
        items.items.push(record.clone());
        self.save_items(&items).await?;

        Ok(record)
    }

    async fn new_album(&self, title: &str, seed: &ItemHandle) -> LocalResult<AlbumRecord> {
        if title.is_empty() {
            return Err(LocalProviderError::EmptyTitle);
        }

        let _guard = self.lock.lock().await;
        let items = self.load_items().await?;
        if items.find(seed.as_str()).is_none() {
            return Err(LocalProviderError::ItemNotFound {
                item_id: seed.to_string(),
            });
        }

        let record = AlbumRecord {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            item_ids: vec![seed.to_string()],
            created_at: Utc::now(),
        };

        let mut albums = self.load_albums().await?;
        albums.albums.push(record.clone());
        self.save_albums(&albums).await?;

        Ok(record)
    }

    async fn add_to_album(&self, album_id: &str, item_id: &str) -> LocalResult<()> {
        let _guard = self.lock.lock().await;

        let items = self.load_items().await?;
        if items.find(item_id).is_none() {
            return Err(LocalProviderError::ItemNotFound {
                item_id: item_id.to_string(),
            });
        }

        let mut albums = self.load_albums().await?;
        let album = albums
            .find_mut(album_id)
            .ok_or_else(|| LocalProviderError::AlbumNotFound {
                album_id: album_id.to_string(),
            })?;

        if album.item_ids.iter().any(|id| id == item_id) {
            debug!(album = %album_id, item = %item_id, "Item already in album");
            return Ok(());
        }
        album.item_ids.push(item_id.to_string());

        self.save_albums(&albums).await
    }

    async fn album_listing(&self, album_id: &str) -> LocalResult<Listing> {
        let albums = self.load_albums().await?;
        let album = albums
            .find(album_id)
            .ok_or_else(|| LocalProviderError::AlbumNotFound {
                album_id: album_id.to_string(),
            })?;
        let items = self.load_items().await?;

        let mut entries = Vec::with_capacity(album.item_ids.len());
        for item_id in &album.item_ids {
            match items.find(item_id) {
                Some(item) => entries.push(Entry::item(
                    item.id.clone(),
                    item.title.clone(),
                    guess_mime_type(Path::new(&item.title)),
                    EntrySize::Bytes(item.size),
                )),
                None => warn!(album = %album_id, item = %item_id, "Album references unknown item"),
            }
        }

        Ok(Listing::from_entries(entries))
    }
}

#[async_trait]
impl DestinationCatalog for LocalAlbumStore {
    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Listing> {
        let albums = self.load_albums().await?;
        Ok(Listing::from_entries(albums.albums.into_iter().map(|album| {
            Entry::collection(album.id, album.title)
        })))
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn list_items(&self, collection: &CollectionHandle) -> Result<Listing> {
        Ok(self.album_listing(collection.as_str()).await?)
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn upload(&self, data: Bytes, name: &str) -> Result<ItemHandle> {
        let record = self.store_item(data, name).await?;
        debug!(item = %record.id, title = %record.title, "Stored item");
        Ok(ItemHandle::new(record.id))
    }

    #[instrument(skip(self), fields(seed = %seed))]
    async fn create_collection(&self, name: &str, seed: &ItemHandle) -> Result<CollectionHandle> {
        let record = self.new_album(name, seed).await?;
        info!(album = %record.id, title = %record.title, "Created album");
        Ok(CollectionHandle::new(record.id))
    }

    #[instrument(skip(self), fields(collection = %collection, item = %item))]
    async fn attach_item(&self, collection: &CollectionHandle, item: &ItemHandle) -> Result<()> {
        self.add_to_album(collection.as_str(), item.as_str()).await?;
        Ok(())
    }
}

async fn load_manifest<T>(path: &Path) -> LocalResult<T>
where
    T: DeserializeOwned + Default,
{
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&contents).map_err(|e| LocalProviderError::Manifest {
        file: manifest_name(path),
        message: e.to_string(),
    })
}

async fn save_manifest<T>(path: &Path, manifest: &T) -> LocalResult<()>
where
    T: Serialize,
{
    let contents =
        serde_json::to_vec_pretty(manifest).map_err(|e| LocalProviderError::Manifest {
            file: manifest_name(path),
            message: e.to_string(),
        })?;

    write_atomic(path, &contents).await?;
    Ok(())
}

fn manifest_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}
