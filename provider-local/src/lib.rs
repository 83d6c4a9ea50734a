//! # Local Provider
//!
//! Directory-backed implementations of both catalog traits.
//!
//! ## Overview
//!
//! This module provides:
//! - [`LocalSourceCatalog`]: a folder tree read as a `SourceCatalog`. Top-level
//!   folders are collections, the files inside them are items.
//! - [`LocalAlbumStore`]: an album store kept in a directory as a
//!   `DestinationCatalog`. Uploaded bytes live under `objects/`, albums and
//!   item titles in JSON manifests next to them.
//!
//! Both map their failures onto [`bridge_traits::BridgeError`] so the sync
//! core sees the same error kinds a remote provider would produce.

pub mod album_store;
pub mod error;
pub mod mime;
pub mod source;
pub mod types;

pub use album_store::LocalAlbumStore;
pub use error::{LocalProviderError, Result};
pub use mime::guess_mime_type;
pub use source::LocalSourceCatalog;
