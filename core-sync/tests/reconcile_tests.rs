//! Integration tests for full reconciliation passes
//!
//! These tests drive the reconciler against in-memory catalogs that record
//! every mutating call, covering:
//! - New collections seeded with their first item
//! - Item-level reconciliation of existing collections
//! - Idempotence of a second pass
//! - Fatal upload failures and what they leave behind
//! - Items that vanish between listing and fetch

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::{
    error::Result as BridgeResult, BridgeError, CollectionHandle, DestinationCatalog, Entry,
    EntrySize, FileSystemAccess, ItemHandle, Listing, SourceCatalog,
};
use bytes::Bytes;
use core_sync::{
    CollectionAction, MediaFilter, Reconciler, RetryPolicy, StagingArea, SyncError,
    TransferPipeline,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ============================================================================
// Fake Catalogs
// ============================================================================

struct SourceFile {
    mime_type: String,
    size: EntrySize,
    data: Option<Bytes>,
}

/// Folder tree held in memory: folder name → file name → file
#[derive(Default)]
struct FakeSource {
    folders: Mutex<BTreeMap<String, BTreeMap<String, SourceFile>>>,
}

impl FakeSource {
    async fn add_folder(&self, folder: &str) {
        self.folders
            .lock()
            .await
            .entry(folder.to_string())
            .or_default();
    }

    async fn add_image(&self, folder: &str, name: &str) {
        self.add_file(folder, name, "image/jpeg", EntrySize::Human("20 KB".to_string()))
            .await;
    }

    async fn add_file(&self, folder: &str, name: &str, mime_type: &str, size: EntrySize) {
        self.folders
            .lock()
            .await
            .entry(folder.to_string())
            .or_default()
            .insert(
                name.to_string(),
                SourceFile {
                    mime_type: mime_type.to_string(),
                    size,
                    data: Some(Bytes::from(format!("{}/{}", folder, name))),
                },
            );
    }

    /// Keep the file listed but make fetching it fail with `NotFound`
    async fn vanish(&self, folder: &str, name: &str) {
        if let Some(file) = self
            .folders
            .lock()
            .await
            .get_mut(folder)
            .and_then(|files| files.get_mut(name))
        {
            file.data = None;
        }
    }
}

#[async_trait]
impl SourceCatalog for FakeSource {
    async fn list(&self, path: &str) -> BridgeResult<Listing> {
        let folders = self.folders.lock().await;

        if path.is_empty() {
            return Ok(Listing::from_entries(
                folders.keys().map(|name| Entry::collection(name.clone(), name.clone())),
            ));
        }

        Ok(match folders.get(path) {
            Some(files) => Listing::from_entries(files.iter().map(|(name, file)| {
                Entry::item(
                    format!("{}/{}", path, name),
                    name.clone(),
                    file.mime_type.clone(),
                    file.size.clone(),
                )
            })),
            None => Listing::new(),
        })
    }

    async fn fetch(&self, path: &str) -> BridgeResult<Bytes> {
        let (folder, name) = path
            .split_once('/')
            .ok_or_else(|| BridgeError::InvalidArgument(path.to_string()))?;

        self.folders
            .lock()
            .await
            .get(folder)
            .and_then(|files| files.get(name))
            .and_then(|file| file.data.clone())
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadFailure {
    Transient,
    Permanent,
}

#[derive(Default)]
struct DestinationState {
    /// Album id → (title, ordered item ids)
    albums: BTreeMap<String, (String, Vec<String>)>,
    /// Item id → title
    items: HashMap<String, String>,
    /// Mutating calls in the order they were made
    calls: Vec<String>,
    upload_attempts: HashMap<String, u32>,
    failures: HashMap<String, UploadFailure>,
    next_id: u32,
}

impl DestinationState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn title(&self, item: &ItemHandle) -> String {
        self.items.get(item.as_str()).cloned().unwrap_or_default()
    }
}

#[derive(Default)]
struct FakeDestination {
    state: Mutex<DestinationState>,
}

impl FakeDestination {
    async fn add_album(&self, title: &str, items: &[&str]) -> String {
        let mut state = self.state.lock().await;
        let album = state.next_id("album");
        let mut ids = Vec::new();
        for item in items {
            let id = state.next_id("item");
            state.items.insert(id.clone(), item.to_string());
            ids.push(id);
        }
        state.albums.insert(album.clone(), (title.to_string(), ids));
        album
    }

    async fn fail_uploads(&self, name: &str, failure: UploadFailure) {
        self.state
            .lock()
            .await
            .failures
            .insert(name.to_string(), failure);
    }

    async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    async fn reset_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    async fn upload_attempts(&self, name: &str) -> u32 {
        self.state
            .lock()
            .await
            .upload_attempts
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Titles of the albums with a given title, with their item titles
    async fn album_contents(&self, title: &str) -> Vec<Vec<String>> {
        let state = self.state.lock().await;
        state
            .albums
            .values()
            .filter(|(album_title, _)| album_title == title)
            .map(|(_, ids)| {
                ids.iter()
                    .map(|id| state.items.get(id).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    async fn album_item_ids(&self, album: &str) -> Vec<String> {
        self.state
            .lock()
            .await
            .albums
            .get(album)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DestinationCatalog for FakeDestination {
    async fn list_collections(&self) -> BridgeResult<Listing> {
        let state = self.state.lock().await;
        Ok(Listing::from_entries(
            state
                .albums
                .iter()
                .map(|(id, (title, _))| Entry::collection(id.clone(), title.clone())),
        ))
    }

    async fn list_items(&self, collection: &CollectionHandle) -> BridgeResult<Listing> {
        let state = self.state.lock().await;
        let (_, ids) = state
            .albums
            .get(collection.as_str())
            .ok_or_else(|| BridgeError::NotFound(collection.to_string()))?;

        Ok(Listing::from_entries(ids.iter().map(|id| {
            Entry::item(
                id.clone(),
                state.items.get(id).cloned().unwrap_or_default(),
                "image/jpeg",
                EntrySize::Bytes(0),
            )
        })))
    }

    async fn upload(&self, _data: Bytes, name: &str) -> BridgeResult<ItemHandle> {
        let mut state = self.state.lock().await;
        *state.upload_attempts.entry(name.to_string()).or_default() += 1;

        match state.failures.get(name) {
            Some(UploadFailure::Transient) => {
                return Err(BridgeError::TransientUpload {
                    reason: "rate limited".to_string(),
                })
            }
            Some(UploadFailure::Permanent) => {
                return Err(BridgeError::PermanentUpload {
                    reason: "unsupported format".to_string(),
                })
            }
            None => {}
        }

        let id = state.next_id("item");
        state.items.insert(id.clone(), name.to_string());
        state.calls.push(format!("upload {}", name));
        Ok(ItemHandle::new(id))
    }

    async fn create_collection(
        &self,
        name: &str,
        seed: &ItemHandle,
    ) -> BridgeResult<CollectionHandle> {
        let mut state = self.state.lock().await;
        if !state.items.contains_key(seed.as_str()) {
            return Err(BridgeError::NotFound(seed.to_string()));
        }

        let album = state.next_id("album");
        state
            .albums
            .insert(album.clone(), (name.to_string(), vec![seed.as_str().to_string()]));
        let call = format!("create {} seed={}", name, state.title(seed));
        state.calls.push(call);
        Ok(CollectionHandle::new(album))
    }

    async fn attach_item(&self, collection: &CollectionHandle, item: &ItemHandle) -> BridgeResult<()> {
        let mut state = self.state.lock().await;
        let title = state.title(item);
        let (album_title, ids) = state
            .albums
            .get_mut(collection.as_str())
            .ok_or_else(|| BridgeError::NotFound(collection.to_string()))?;

        ids.push(item.as_str().to_string());
        let call = format!("attach {} {}", album_title, title);
        state.calls.push(call);
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    source: Arc<FakeSource>,
    destination: Arc<FakeDestination>,
    staging_root: std::path::PathBuf,
    _temp: tempfile::TempDir,
    reconciler: Reconciler,
}

async fn harness(source: FakeSource, destination: FakeDestination) -> Harness {
    let temp = tempfile::tempdir().unwrap();
    let source = Arc::new(source);
    let destination = Arc::new(destination);

    let fs: Arc<dyn FileSystemAccess> =
        Arc::new(TokioFileSystem::with_cache_directory(temp.path().to_path_buf()));
    let staging = StagingArea::open(fs, None, "ann").await.unwrap();
    let staging_root = staging.root().to_path_buf();

    let source_dyn: Arc<dyn SourceCatalog> = source.clone();
    let destination_dyn: Arc<dyn DestinationCatalog> = destination.clone();
    let pipeline = TransferPipeline::new(
        Arc::clone(&source_dyn),
        Arc::clone(&destination_dyn),
        staging,
        RetryPolicy::new(3, Duration::ZERO).unwrap(),
    );
    let reconciler = Reconciler::new(
        source_dyn,
        destination_dyn,
        pipeline,
        MediaFilter::default(),
    );

    Harness {
        source,
        destination,
        staging_root,
        _temp: temp,
        reconciler,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sorted(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_creates_missing_collection_and_fills_existing_one() {
    let source = FakeSource::default();
    source.add_image("A", "p").await;
    source.add_image("A", "q").await;
    source.add_image("B", "x").await;
    source.add_image("B", "y").await;

    let destination = FakeDestination::default();
    let album_b = destination.add_album("B", &["x"]).await;
    let x_before = destination.album_item_ids(&album_b).await;

    let h = harness(source, destination).await;
    let report = h.reconciler.reconcile_root().await.unwrap();

    assert_eq!(
        h.destination.calls().await,
        strings(&[
            "upload p",
            "upload q",
            "create A seed=p",
            "attach A q",
            "upload y",
            "attach B y",
        ])
    );

    let albums_a = h.destination.album_contents("A").await;
    assert_eq!(albums_a.len(), 1);
    assert_eq!(sorted(albums_a[0].clone()), strings(&["p", "q"]));

    let albums_b = h.destination.album_contents("B").await;
    assert_eq!(albums_b, vec![strings(&["x", "y"])]);
    assert_eq!(h.destination.album_item_ids(&album_b).await[0], x_before[0]);

    assert_eq!(report.collection("A").unwrap().action, CollectionAction::Created);
    let b = report.collection("B").unwrap();
    assert_eq!(b.action, CollectionAction::Updated);
    assert_eq!(b.items_already_present, 1);
    assert_eq!(report.items_uploaded(), 3);
    assert_eq!(report.items_attached(), 3);
}

#[tokio::test]
async fn test_second_pass_transfers_nothing() {
    let source = FakeSource::default();
    source.add_image("A", "p").await;
    source.add_image("A", "q").await;
    source.add_image("B", "x").await;
    source.add_image("B", "y").await;

    let destination = FakeDestination::default();
    destination.add_album("B", &["x"]).await;

    let h = harness(source, destination).await;
    h.reconciler.reconcile_root().await.unwrap();
    h.destination.reset_calls().await;

    let report = h.reconciler.reconcile_root().await.unwrap();

    assert!(h.destination.calls().await.is_empty());
    assert!(report.is_noop());
    assert_eq!(report.collection("A").unwrap().action, CollectionAction::Unchanged);
    assert_eq!(report.collection("B").unwrap().action, CollectionAction::Unchanged);
    assert_eq!(report.items_already_present(), 4);
}

#[tokio::test]
async fn test_empty_and_ineligible_folders_create_no_collection() {
    let source = FakeSource::default();
    source.add_folder("Empty").await;
    source
        .add_file("Docs", "readme", "text/plain", EntrySize::Bytes(12))
        .await;
    source
        .add_file(
            "Docs",
            "poster",
            "image/png",
            EntrySize::Human("11 MB".to_string()),
        )
        .await;

    let h = harness(source, FakeDestination::default()).await;
    let report = h.reconciler.reconcile_root().await.unwrap();

    assert!(h.destination.calls().await.is_empty());
    assert!(h.destination.album_contents("Empty").await.is_empty());
    assert!(h.destination.album_contents("Docs").await.is_empty());
    assert_eq!(report.collections.len(), 2);
    assert!(report
        .collections
        .iter()
        .all(|c| c.action == CollectionAction::SkippedEmpty));
}

#[tokio::test]
async fn test_ineligible_items_are_left_behind() {
    let source = FakeSource::default();
    source.add_image("A", "p").await;
    source
        .add_file("A", "notes", "text/plain", EntrySize::Bytes(5))
        .await;
    source
        .add_file("A", "scan", "image/x-ms-bmp", EntrySize::Bytes(10_485_761))
        .await;

    let h = harness(source, FakeDestination::default()).await;
    h.reconciler.reconcile_root().await.unwrap();

    assert_eq!(
        h.destination.calls().await,
        strings(&["upload p", "create A seed=p"])
    );
}

#[tokio::test]
async fn test_fatal_upload_keeps_earlier_attachments() {
    let source = FakeSource::default();
    source.add_image("B", "x").await;
    source.add_image("B", "y").await;
    source.add_image("B", "z").await;

    let destination = FakeDestination::default();
    destination.add_album("B", &["x"]).await;
    destination.fail_uploads("z", UploadFailure::Transient).await;

    let h = harness(source, destination).await;
    let err = h.reconciler.reconcile_root().await.unwrap_err();

    match err {
        SyncError::Fatal {
            operation,
            attempts,
            ..
        } => {
            assert_eq!(operation, "upload z");
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.destination.upload_attempts("z").await, 3);

    // y was uploaded but never attached; nothing is rolled back
    assert_eq!(h.destination.calls().await, strings(&["upload y"]));
    assert_eq!(h.destination.album_contents("B").await, vec![strings(&["x"])]);

    // Staging is cleaned up on the failure path too
    assert!(!h.staging_root.join("B").exists());

    // A rerun picks up where the failed pass stopped
    h.destination.clear_failures().await;
    h.destination.reset_calls().await;
    let report = h.reconciler.reconcile_root().await.unwrap();

    assert_eq!(
        h.destination.calls().await,
        strings(&["upload y", "upload z", "attach B y", "attach B z"])
    );
    assert_eq!(report.collection("B").unwrap().items_attached, 2);
}

#[tokio::test]
async fn test_permanent_rejection_stops_after_one_attempt() {
    let source = FakeSource::default();
    source.add_image("A", "p").await;

    let destination = FakeDestination::default();
    destination.fail_uploads("p", UploadFailure::Permanent).await;

    let h = harness(source, destination).await;
    let err = h.reconciler.reconcile_root().await.unwrap_err();

    assert!(matches!(err, SyncError::Fatal { attempts: 1, .. }));
    assert_eq!(h.destination.upload_attempts("p").await, 1);
    assert!(h.destination.album_contents("A").await.is_empty());
}

#[tokio::test]
async fn test_vanished_item_is_skipped_and_reported() {
    let source = FakeSource::default();
    source.add_image("A", "p").await;
    source.add_image("A", "q").await;
    source.vanish("A", "p").await;

    let h = harness(source, FakeDestination::default()).await;
    let report = h.reconciler.reconcile_root().await.unwrap();

    assert_eq!(
        h.destination.calls().await,
        strings(&["upload q", "create A seed=q"])
    );
    let a = report.collection("A").unwrap();
    assert_eq!(a.items_skipped, strings(&["p"]));
    assert_eq!(report.items_skipped(), 1);
}

#[tokio::test]
async fn test_reconcile_single_collection() {
    let source = FakeSource::default();
    source.add_image("A", "p").await;
    source.add_image("B", "y").await;

    let h = harness(source, FakeDestination::default()).await;
    let report = h.reconciler.reconcile_collection("B").await.unwrap();

    assert_eq!(report.collections.len(), 1);
    assert_eq!(
        h.destination.calls().await,
        strings(&["upload y", "create B seed=y"])
    );

    h.source.add_image("B", "z").await;
    h.destination.reset_calls().await;
    h.reconciler.reconcile_collection("B").await.unwrap();

    assert_eq!(
        h.destination.calls().await,
        strings(&["upload z", "attach B z"])
    );
}
