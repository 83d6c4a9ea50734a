//! Folder tree source catalog
//!
//! Implements `SourceCatalog` over a local directory.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::{Entry, EntrySize, Listing, SourceCatalog};
use bytes::Bytes;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument, warn};

use crate::error::LocalProviderError;
use crate::mime::guess_mime_type;

/// Source catalog backed by a local directory.
///
/// Paths are `/`-separated and relative to the root; the empty path (or
/// `"/"`) lists the root itself. Entry ids are the entry's path relative to
/// the root, so they can be passed straight back to [`SourceCatalog::fetch`].
///
/// # Example
///
/// ```ignore
/// use provider_local::LocalSourceCatalog;
/// use bridge_traits::SourceCatalog;
///
/// let source = LocalSourceCatalog::new("/home/ann/Photos");
/// let folders = source.list("").await?;
/// let bytes = source.fetch("Trips/a.jpg").await?;
/// ```
#[derive(Debug, Clone)]
pub struct LocalSourceCatalog {
    root: PathBuf,
}

impl LocalSourceCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a catalog path onto the file system without leaving the root
    fn resolve(&self, path: &str) -> std::result::Result<PathBuf, LocalProviderError> {
        let mut resolved = self.root.clone();

        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(LocalProviderError::OutsideRoot(path.to_string())),
            }
        }

        Ok(resolved)
    }

    async fn ensure_root(&self) -> std::result::Result<(), LocalProviderError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(LocalProviderError::RootMissing {
                path: self.root.display().to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(LocalProviderError::RootMissing {
                path: self.root.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_listing(&self, path: &str) -> std::result::Result<Listing, LocalProviderError> {
        self.ensure_root().await?;
        let dir = self.resolve(path)?;

        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path, "Path does not exist, returning empty listing");
                return Ok(Listing::new());
            }
            Err(e) => {
                if tokio::fs::metadata(&dir).await.map(|m| m.is_file()).unwrap_or(false) {
                    debug!(path = %path, "Path is a file, returning empty listing");
                    return Ok(Listing::new());
                }
                return Err(e.into());
            }
        };

        let prefix = path.trim_matches('/');
        let mut entries = Vec::new();

        while let Some(dir_entry) = read_dir.next_entry().await? {
            let name = match dir_entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(name = ?raw, "Skipping entry with non UTF-8 name");
                    continue;
                }
            };

            let id = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };

            // Follows symlinks so linked folders list like real ones
            let meta = match tokio::fs::metadata(dir_entry.path()).await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(entry = %id, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if meta.is_dir() {
                entries.push(Entry::collection(id, name));
            } else {
                let mime_type = guess_mime_type(Path::new(&name));
                entries.push(Entry::item(id, name, mime_type, EntrySize::Bytes(meta.len())));
            }
        }

        Ok(Listing::from_entries(entries))
    }

    async fn read_file(&self, path: &str) -> std::result::Result<Bytes, LocalProviderError> {
        let file = self.resolve(path)?;

        match tokio::fs::read(&file).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(LocalProviderError::FileNotFound {
                    path: path.to_string(),
                })
            }
            Err(e) => {
                if tokio::fs::metadata(&file).await.map(|m| m.is_dir()).unwrap_or(false) {
                    return Err(LocalProviderError::NotAFile(path.to_string()));
                }
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl SourceCatalog for LocalSourceCatalog {
    #[instrument(skip(self))]
    async fn list(&self, path: &str) -> Result<Listing> {
        let listing = self.read_listing(path).await?;
        debug!(path = %path, entries = listing.len(), "Listed source path");
        Ok(listing)
    }

    #[instrument(skip(self))]
    async fn fetch(&self, path: &str) -> Result<Bytes> {
        let data = self.read_file(path).await?;
        debug!(path = %path, size = data.len(), "Fetched source file");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("Trips")).unwrap();
        fs::create_dir_all(temp.path().join("Empty")).unwrap();
        fs::write(temp.path().join("Trips").join("a.jpg"), b"jpeg").unwrap();
        fs::write(temp.path().join("Trips").join("notes.txt"), b"hello world").unwrap();
        fs::write(temp.path().join("loose.png"), b"png").unwrap();
        temp
    }

    #[tokio::test]
    async fn test_list_root() {
        let temp = tree();
        let source = LocalSourceCatalog::new(temp.path());

        let listing = source.list("").await.unwrap();

        assert_eq!(listing.len(), 3);
        assert!(listing.get("Trips").unwrap().is_collection);
        assert!(listing.get("Empty").unwrap().is_collection);
        let loose = listing.get("loose.png").unwrap();
        assert!(!loose.is_collection);
        assert_eq!(loose.id, "loose.png");
    }

    #[tokio::test]
    async fn test_list_collection() {
        let temp = tree();
        let source = LocalSourceCatalog::new(temp.path());

        let listing = source.list("Trips").await.unwrap();

        let image = listing.get("a.jpg").unwrap();
        assert_eq!(image.id, "Trips/a.jpg");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.size, EntrySize::Bytes(4));

        let notes = listing.get("notes.txt").unwrap();
        assert_eq!(notes.mime_type, "text/plain");
        assert_eq!(notes.size, EntrySize::Bytes(11));

        assert_eq!(source.list("/Trips/").await.unwrap(), listing);
    }

    #[tokio::test]
    async fn test_empty_and_missing_paths_list_empty() {
        let temp = tree();
        let source = LocalSourceCatalog::new(temp.path());

        assert!(source.list("Empty").await.unwrap().is_empty());
        assert!(source.list("Nowhere").await.unwrap().is_empty());
        assert!(source.list("loose.png").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let source = LocalSourceCatalog::new(temp.path().join("gone"));

        let err = source.list("").await.unwrap_err();
        assert!(matches!(err, BridgeError::RemoteUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch() {
        let temp = tree();
        let source = LocalSourceCatalog::new(temp.path());

        let data = source.fetch("Trips/a.jpg").await.unwrap();
        assert_eq!(data, Bytes::from_static(b"jpeg"));

        let err = source.fetch("Trips/b.jpg").await.unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(ref p) if p == "Trips/b.jpg"));

        let err = source.fetch("Trips").await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_paths_cannot_escape_root() {
        let temp = tree();
        let source = LocalSourceCatalog::new(temp.path().join("Trips"));

        let err = source.list("../Empty").await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));

        let err = source.fetch("../loose.png").await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
    }
}
