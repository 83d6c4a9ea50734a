//! Error types for the local provider

use bridge_traits::error::BridgeError;
use std::io;
use thiserror::Error;

/// Local provider errors
#[derive(Error, Debug)]
pub enum LocalProviderError {
    /// The configured root directory does not exist
    #[error("Root directory not available: {path}")]
    RootMissing { path: String },

    /// Path leaves the catalog root
    #[error("Path escapes the catalog root: {0}")]
    OutsideRoot(String),

    /// Path names a directory where a file was expected
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// Source file vanished
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Album id unknown to the store
    #[error("Album not found: {album_id}")]
    AlbumNotFound { album_id: String },

    /// Item id unknown to the store
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// Upload larger than the store accepts
    #[error("Item of {size} bytes exceeds the store quota of {quota} bytes")]
    QuotaExceeded { size: u64, quota: u64 },

    /// Upload or album without a title
    #[error("Title must not be empty")]
    EmptyTitle,

    /// Writing an uploaded object failed
    #[error("Failed to store object {item_id}: {source}")]
    ObjectWrite {
        item_id: String,
        #[source]
        source: io::Error,
    },

    /// A manifest could not be parsed or encoded
    #[error("Manifest error in {file}: {message}")]
    Manifest { file: String, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for local provider operations
pub type Result<T> = std::result::Result<T, LocalProviderError>;

impl From<LocalProviderError> for BridgeError {
    fn from(error: LocalProviderError) -> Self {
        match error {
            LocalProviderError::RootMissing { path } => {
                BridgeError::RemoteUnavailable(format!("root directory missing: {}", path))
            }
            LocalProviderError::OutsideRoot(path) => {
                BridgeError::InvalidArgument(format!("path escapes root: {}", path))
            }
            LocalProviderError::NotAFile(path) => {
                BridgeError::InvalidArgument(format!("not a file: {}", path))
            }
            LocalProviderError::FileNotFound { path } => BridgeError::NotFound(path),
            LocalProviderError::AlbumNotFound { album_id } => {
                BridgeError::NotFound(format!("album {}", album_id))
            }
            LocalProviderError::ItemNotFound { item_id } => {
                BridgeError::NotFound(format!("item {}", item_id))
            }
            err @ LocalProviderError::QuotaExceeded { .. } => BridgeError::PermanentUpload {
                reason: err.to_string(),
            },
            LocalProviderError::EmptyTitle => {
                BridgeError::InvalidArgument("title must not be empty".to_string())
            }
            err @ LocalProviderError::ObjectWrite { .. } => {
                let reason = err.to_string();
                if is_retryable_io(&err) {
                    BridgeError::TransientUpload { reason }
                } else {
                    BridgeError::PermanentUpload { reason }
                }
            }
            err @ LocalProviderError::Manifest { .. } => {
                BridgeError::RemoteUnavailable(err.to_string())
            }
            LocalProviderError::Io(e) => BridgeError::Io(e),
        }
    }
}

fn is_retryable_io(error: &LocalProviderError) -> bool {
    match error {
        LocalProviderError::ObjectWrite { source, .. } => matches!(
            source.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = LocalProviderError::QuotaExceeded {
            size: 2048,
            quota: 1024,
        };

        assert_eq!(
            error.to_string(),
            "Item of 2048 bytes exceeds the store quota of 1024 bytes"
        );
    }

    #[test]
    fn test_error_conversion() {
        let bridge_error: BridgeError = LocalProviderError::RootMissing {
            path: "/photos".to_string(),
        }
        .into();
        assert!(matches!(bridge_error, BridgeError::RemoteUnavailable(_)));

        let bridge_error: BridgeError = LocalProviderError::FileNotFound {
            path: "Trips/a.jpg".to_string(),
        }
        .into();
        assert!(matches!(bridge_error, BridgeError::NotFound(ref p) if p == "Trips/a.jpg"));

        let bridge_error: BridgeError = LocalProviderError::QuotaExceeded { size: 2, quota: 1 }.into();
        assert!(matches!(bridge_error, BridgeError::PermanentUpload { .. }));
    }

    #[test]
    fn test_object_write_classification() {
        let interrupted: BridgeError = LocalProviderError::ObjectWrite {
            item_id: "1".to_string(),
            source: io::Error::new(io::ErrorKind::Interrupted, "signal"),
        }
        .into();
        assert!(interrupted.is_transient());

        let denied: BridgeError = LocalProviderError::ObjectWrite {
            item_id: "1".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        }
        .into();
        assert!(matches!(denied, BridgeError::PermanentUpload { .. }));
    }
}
