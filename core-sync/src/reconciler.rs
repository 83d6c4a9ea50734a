//! # Reconciler
//!
//! Drives one reconciliation pass from the source catalog to the destination.
//!
//! ## Workflow
//!
//! 1. List source collections (sub-folders of the root) and destination
//!    collections.
//! 2. Diff the two name sets.
//! 3. Each collection missing on the destination is transferred in full: its
//!    eligible items are uploaded, the collection is created with the first
//!    uploaded item as seed, then the remaining items are attached.
//! 4. Each collection present on both sides is reconciled at item level:
//!    only items missing on the destination are uploaded and attached.
//!
//! Deletions and renames are never propagated. Items already present are
//! left untouched. A [`SyncError::Fatal`] stops the pass; nothing already
//! created or attached is rolled back.

use bridge_traits::{CollectionHandle, DestinationCatalog, Listing, SourceCatalog};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::diff::compute_diff;
use crate::error::{Result, SyncError};
use crate::media_filter::MediaFilter;
use crate::pipeline::TransferPipeline;
use crate::report::{CollectionAction, CollectionReport, SyncReport};
use crate::view::{collection_handle, CatalogView};

/// Path of the source root
const SOURCE_ROOT: &str = "";

/// Reconciles a source catalog into a destination catalog.
pub struct Reconciler {
    view: CatalogView,
    pipeline: TransferPipeline,
    dry_run: bool,
}

impl Reconciler {
    /// Create a reconciler.
    ///
    /// `pipeline` should be built over the same catalogs.
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        destination: Arc<dyn DestinationCatalog>,
        pipeline: TransferPipeline,
        filter: MediaFilter,
    ) -> Self {
        Self {
            view: CatalogView::new(source, destination, filter),
            pipeline,
            dry_run: false,
        }
    }

    /// The read-only listing side of this reconciler
    pub fn view(&self) -> &CatalogView {
        &self.view
    }

    /// Plan transfers without staging, uploading or touching the destination.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a full pass over every source collection.
    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn reconcile_root(&self) -> Result<SyncReport> {
        let mut report = SyncReport::new(self.dry_run);
        let result = self.run_root(&mut report).await;
        finish(report, result)
    }

    /// Run a pass over a single source collection.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] when the source has no such collection.
    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn reconcile_collection(&self, name: &str) -> Result<SyncReport> {
        let sources = self.source_collections().await?;
        if sources.get(name).is_none() {
            return Err(SyncError::NotFound(format!(
                "source collection '{}'",
                name
            )));
        }

        let destinations = self.view.destination.list_collections().await?;
        let collection = match destinations.get(name) {
            Some(entry) => {
                let handle = CollectionHandle::new(entry.id.clone());
                self.reconcile_leaf(name, &handle).await
            }
            None => self.transfer_new(name).await,
        };

        let mut report = SyncReport::new(self.dry_run);
        let result = collection.map(|collection| report.push(collection));
        finish(report, result)
    }

    /// See [`CatalogView::list_source`].
    pub async fn list_source(&self, path: &str) -> Result<BTreeSet<String>> {
        self.view.list_source(path).await
    }

    /// See [`CatalogView::list_destination`].
    pub async fn list_destination(&self, collection: Option<&str>) -> Result<BTreeSet<String>> {
        self.view.list_destination(collection).await
    }

    async fn run_root(&self, report: &mut SyncReport) -> Result<()> {
        let sources = self.source_collections().await?;
        let destinations = self.view.destination.list_collections().await?;
        warn_duplicates("destination collections", &destinations);

        let diff = compute_diff(&sources.names(), &destinations.names());
        info!(
            new = diff.to_transfer.len(),
            existing = diff.already_present.len(),
            "Collection diff computed"
        );

        for name in &diff.to_transfer {
            report.push(self.transfer_new(name).await?);
        }

        for name in &diff.already_present {
            let handle = collection_handle(&destinations, name)?;
            report.push(self.reconcile_leaf(name, &handle).await?);
        }

        Ok(())
    }

    /// Source root restricted to folders
    async fn source_collections(&self) -> Result<Listing> {
        let listing = self.view.source.list(SOURCE_ROOT).await?;
        warn_duplicates("source collections", &listing);
        Ok(listing.filter(|entry| entry.is_collection))
    }

    /// Source items of one collection that pass the media filter
    async fn eligible_items(&self, collection: &str) -> Result<Listing> {
        let listing = self.view.source.list(collection).await?;
        warn_duplicates(collection, &listing);

        let total = listing.len();
        let eligible = listing.filter(|entry| self.view.filter.accepts(entry));
        debug!(
            collection = %collection,
            total,
            eligible = eligible.len(),
            "Filtered source items"
        );
        Ok(eligible)
    }

    #[instrument(skip(self))]
    async fn transfer_new(&self, name: &str) -> Result<CollectionReport> {
        let items = self.eligible_items(name).await?;

        if items.is_empty() {
            info!(collection = %name, "No eligible items, not creating collection");
            return Ok(CollectionReport::new(name, CollectionAction::SkippedEmpty));
        }

        if self.dry_run {
            let mut report = CollectionReport::new(name, CollectionAction::WouldCreate);
            report.items_planned = items.names().into_iter().collect();
            return Ok(report);
        }

        let outcome = self.pipeline.stage_and_upload(name, &items.names()).await?;

        let mut handles = outcome.handles();
        let Some(seed) = handles.next() else {
            warn!(collection = %name, "Every item vanished before upload, not creating collection");
            let mut report = CollectionReport::new(name, CollectionAction::SkippedEmpty);
            report.items_skipped = outcome.skipped.clone();
            return Ok(report);
        };

        let collection = self.view.destination.create_collection(name, seed).await?;
        info!(collection = %name, handle = %collection, "Created collection");

        let mut report = CollectionReport::new(name, CollectionAction::Created);
        report.items_uploaded = outcome.uploaded.len();
        report.items_attached = 1;
        report.items_skipped = outcome.skipped.clone();

        for item in handles {
            self.view.destination.attach_item(&collection, item).await?;
            report.items_attached += 1;
        }

        Ok(report)
    }

    #[instrument(skip(self, handle))]
    async fn reconcile_leaf(
        &self,
        name: &str,
        handle: &CollectionHandle,
    ) -> Result<CollectionReport> {
        let source_items = self.eligible_items(name).await?;
        let destination_items = self.view.destination.list_items(handle).await?;
        warn_duplicates(name, &destination_items);

        let diff = compute_diff(&source_items.names(), &destination_items.names());

        if diff.is_empty() {
            let mut report = CollectionReport::new(name, CollectionAction::Unchanged);
            report.items_already_present = diff.already_present.len();
            return Ok(report);
        }

        if self.dry_run {
            let mut report = CollectionReport::new(name, CollectionAction::WouldUpdate);
            report.items_already_present = diff.already_present.len();
            report.items_planned = diff.to_transfer.into_iter().collect();
            return Ok(report);
        }

        let outcome = self.pipeline.stage_and_upload(name, &diff.to_transfer).await?;

        let action = if outcome.is_empty() {
            CollectionAction::Unchanged
        } else {
            CollectionAction::Updated
        };
        let mut report = CollectionReport::new(name, action);
        report.items_already_present = diff.already_present.len();
        report.items_uploaded = outcome.uploaded.len();
        report.items_skipped = outcome.skipped.clone();

        for item in outcome.handles() {
            self.view.destination.attach_item(handle, item).await?;
            report.items_attached += 1;
        }

        Ok(report)
    }
}

fn warn_duplicates(scope: &str, listing: &Listing) {
    if !listing.duplicates().is_empty() {
        warn!(
            scope = %scope,
            duplicates = ?listing.duplicates(),
            "Listing contained duplicate names, keeping the first of each"
        );
    }
}

/// Log the outcome of a pass and hand back its report
fn finish(report: SyncReport, result: Result<()>) -> Result<SyncReport> {
    match result {
        Ok(()) => {
            info!(
                collections = report.collections.len(),
                uploaded = report.items_uploaded(),
                attached = report.items_attached(),
                skipped = report.items_skipped(),
                "Reconciliation finished"
            );
            Ok(report)
        }
        Err(err) => {
            error!(
                error = %err,
                completed_collections = report.collections.len(),
                uploaded = report.items_uploaded(),
                attached = report.items_attached(),
                "Reconciliation aborted"
            );
            Err(err)
        }
    }
}
