//! # Host Bridge Traits
//!
//! Collaborator contracts consumed by the reconciliation core.
//!
//! ## Overview
//!
//! This crate defines the boundary between the core and everything it treats
//! as an opaque service: the two catalogs being reconciled and the local file
//! system used for staging. Concrete adapters live in separate crates
//! (`provider-local`, `bridge-desktop`) and tests substitute fakes.
//!
//! ## Traits
//!
//! ### Catalogs
//! - [`SourceCatalog`](catalog::SourceCatalog) - Folder tree of media files
//! - [`DestinationCatalog`](catalog::DestinationCatalog) - Named collections of items
//!
//! ### Local I/O
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Staging area file operations
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! should map their transport failures to `RemoteUnavailable`, vanished
//! entries to `NotFound`, and split upload failures into `TransientUpload`
//! (rate limits, flaky network) and `PermanentUpload` (rejected content).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so implementations can be
//! shared behind `Arc` across async tasks.

pub mod catalog;
pub mod error;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use catalog::{
    CollectionHandle, DestinationCatalog, Entry, EntrySize, ItemHandle, Listing, SourceCatalog,
};
pub use storage::FileSystemAccess;
