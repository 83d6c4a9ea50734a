//! Read-only, filtered view over both catalogs.
//!
//! Listing needs neither staging nor uploads, so it is available without
//! building a [`TransferPipeline`](crate::pipeline::TransferPipeline).

use bridge_traits::{CollectionHandle, DestinationCatalog, Listing, SourceCatalog};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{Result, SyncError};
use crate::media_filter::MediaFilter;

/// Source and destination catalogs plus the filter a pass applies.
#[derive(Clone)]
pub struct CatalogView {
    pub(crate) source: Arc<dyn SourceCatalog>,
    pub(crate) destination: Arc<dyn DestinationCatalog>,
    pub(crate) filter: MediaFilter,
}

impl CatalogView {
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        destination: Arc<dyn DestinationCatalog>,
        filter: MediaFilter,
    ) -> Self {
        Self {
            source,
            destination,
            filter,
        }
    }

    pub fn filter(&self) -> &MediaFilter {
        &self.filter
    }

    /// Names under a source path that a pass would consider: sub-folders plus
    /// eligible items.
    #[instrument(skip(self))]
    pub async fn list_source(&self, path: &str) -> Result<BTreeSet<String>> {
        let listing = self
            .source
            .list(path)
            .await?
            .filter(|entry| entry.is_collection || self.filter.accepts(entry));
        Ok(listing.names())
    }

    /// Destination collection names, or the item names of one collection.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] when `collection` does not exist on the
    /// destination.
    #[instrument(skip(self))]
    pub async fn list_destination(&self, collection: Option<&str>) -> Result<BTreeSet<String>> {
        let collections = self.destination.list_collections().await?;

        match collection {
            None => Ok(collections.names()),
            Some(name) => {
                let handle = collection_handle(&collections, name)?;
                Ok(self.destination.list_items(&handle).await?.names())
            }
        }
    }
}

pub(crate) fn collection_handle(listing: &Listing, name: &str) -> Result<CollectionHandle> {
    listing
        .get(name)
        .map(|entry| CollectionHandle::new(entry.id.clone()))
        .ok_or_else(|| SyncError::NotFound(format!("destination collection '{}'", name)))
}
