//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`, rooted in the platform cache
//!   directory (`dirs`) unless the host overrides it
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::TokioFileSystem;
//! use bridge_traits::FileSystemAccess;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fs = TokioFileSystem::new();
//!     let staging_root = fs.get_cache_directory().await.unwrap().join("staging");
//! }
//! ```

mod filesystem;

pub use filesystem::TokioFileSystem;
