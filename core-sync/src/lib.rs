//! # Sync Module
//!
//! One-way reconciliation of a folder-organised source catalog into a
//! collection-organised destination catalog.
//!
//! ## Overview
//!
//! A pass lists both catalogs, diffs collection names, then diffs item names
//! inside every collection both sides share. Only what the destination is
//! missing gets transferred:
//! - Filtering source items by MIME type and size
//! - Staging source bytes locally, one collection at a time
//! - Uploading with bounded, fixed-delay retry
//! - Creating new collections seeded with their first item, then attaching
//!   the rest
//!
//! ## Components
//!
//! - **Media Filter** (`media_filter`): Eligibility predicate for source items
//! - **Diff** (`diff`): Set difference between source and destination names
//! - **Retry Policy** (`retry`): Bounded retry around a single operation
//! - **Staging Area** (`staging`): Per-identity, per-collection scratch space
//! - **Transfer Pipeline** (`pipeline`): Fetch, stage and upload one collection
//! - **Catalog View** (`view`): Filtered, read-only listing of both catalogs
//! - **Reconciler** (`reconciler`): Drives a full pass and produces a report
//! - **Report** (`report`): Per-collection outcome of a pass

pub mod diff;
pub mod error;
pub mod media_filter;
pub mod pipeline;
pub mod reconciler;
pub mod report;
pub mod retry;
pub mod staging;
pub mod view;

#[cfg(test)]
mod test_support;

pub use diff::{compute_diff, DiffResult};
pub use error::{Result, SyncError};
pub use media_filter::{parse_size, MediaFilter};
pub use pipeline::{TransferOutcome, TransferPipeline};
pub use reconciler::Reconciler;
pub use report::{CollectionAction, CollectionReport, SyncReport};
pub use retry::{RetryError, RetryPolicy};
pub use staging::{CollectionStage, StagedItem, StagingArea};
pub use view::CatalogView;
