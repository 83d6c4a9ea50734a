//! # Catalog Sync CLI
//!
//! The `catalog-sync` binary: loads configuration, initialises logging and
//! drives the reconciler over the local providers.
//!
//! ```text
//! catalog-sync [--config PATH] [--log-level LEVEL] [--log-format FORMAT] <command>
//!
//! list [--source [PATH]] [--destination [COLLECTION]]
//! sync [--collection NAME] [--dry-run]
//! ```
//!
//! Exit status is 0 on success, 2 for configuration errors and 1 for any
//! other failure, including an upload that exhausted its retries.

pub mod app;
pub mod cli;

pub use app::{build_reconciler, build_view, exit_code, load_config, run};
pub use cli::{Cli, Command, ListArgs, SyncArgs};
