//! # Staging Area
//!
//! Local, process-private storage for source bytes between fetch and upload.
//!
//! The area is rooted at `<base>/<identity>` so two destination identities
//! never share files. Each collection transfer gets a fresh sub-directory:
//! [`StagingArea::prepare`] wipes whatever a previous run left behind and the
//! returned [`CollectionStage`] removes its directory again on
//! [`CollectionStage::release`], or on drop if release was never reached.

use bridge_traits::FileSystemAccess;
use bytes::Bytes;
use core_runtime::logging::{redact_if_sensitive, strip_path};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Sub-directory of the cache directory used when no base is configured
const STAGING_DIR_NAME: &str = "staging";

/// Staging root for one destination identity.
pub struct StagingArea {
    fs: Arc<dyn FileSystemAccess>,
    root: PathBuf,
}

impl StagingArea {
    /// Open (and create) the staging root for `identity`.
    ///
    /// `base` defaults to `<cache dir>/staging` of the file system bridge.
    pub async fn open(
        fs: Arc<dyn FileSystemAccess>,
        base: Option<PathBuf>,
        identity: &str,
    ) -> Result<Self> {
        let base = match base {
            Some(base) => base,
            None => fs.get_cache_directory().await?.join(STAGING_DIR_NAME),
        };
        let root = base.join(path_component(identity)?);
        fs.create_dir_all(&root).await?;

        debug!(
            identity = %redact_if_sensitive("identity", identity),
            "Staging area ready"
        );
        Ok(Self { fs, root })
    }

    /// Root directory of this staging area
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wipe and recreate the staging directory for one collection.
    pub async fn prepare(&self, collection: &str) -> Result<CollectionStage> {
        let dir = self.root.join(path_component(collection)?);

        if self.fs.exists(&dir).await? {
            debug!(collection = %collection, "Purging stale staging directory");
            self.fs.delete_dir_all(&dir).await?;
        }
        self.fs.create_dir_all(&dir).await?;

        Ok(CollectionStage {
            fs: Arc::clone(&self.fs),
            dir,
            released: false,
        })
    }
}

/// A staged copy of one source item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedItem {
    pub name: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Exclusive staging directory for one collection transfer.
pub struct CollectionStage {
    fs: Arc<dyn FileSystemAccess>,
    dir: PathBuf,
    released: bool,
}

impl CollectionStage {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an item's bytes into the stage
    pub async fn stage(&self, name: &str, data: Bytes) -> Result<StagedItem> {
        let path = self.dir.join(path_component(name)?);
        let size = data.len();
        self.fs.write_file(&path, data).await?;

        debug!(
            file = %strip_path(&path.to_string_lossy()),
            size,
            "Staged item"
        );
        Ok(StagedItem {
            name: name.to_string(),
            path,
            size,
        })
    }

    /// Read a staged item back for upload
    pub async fn load(&self, item: &StagedItem) -> Result<Bytes> {
        Ok(self.fs.read_file(&item.path).await?)
    }

    /// Drop a staged item once it is no longer needed
    pub async fn discard(&self, item: StagedItem) -> Result<()> {
        self.fs.delete_file(&item.path).await?;
        Ok(())
    }

    /// Remove the collection's staging directory
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        if self.fs.exists(&self.dir).await? {
            self.fs.delete_dir_all(&self.dir).await?;
        }
        Ok(())
    }
}

/// Only reached when the stage was never released: the owning future was
/// cancelled or a panic unwound through it. Normal passes clean up through
/// [`CollectionStage::release`] and the file-system bridge.
impl Drop for CollectionStage {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Blocking remove outside the bridge; no async context in drop.
        if let Err(err) = std::fs::remove_dir_all(&self.dir) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %err, "Failed to remove staging directory");
            }
        }
    }
}

/// Turn a catalog name into a single safe path component.
fn path_component(name: &str) -> Result<String> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(SyncError::Staging(format!(
            "'{}' cannot be used as a staging path component",
            name
        )));
    }

    Ok(name.replace(['/', '\\', '\0'], "_"))
}
