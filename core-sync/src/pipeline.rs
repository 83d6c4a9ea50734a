//! # Transfer Pipeline
//!
//! Moves one collection's worth of items from the source catalog to the
//! destination: fetch into a fresh [`CollectionStage`], upload under the
//! [`RetryPolicy`], discard the staged copy.
//!
//! Items are processed one at a time in name order. A fetch that reports
//! `NotFound` skips just that item; any other failure aborts the collection
//! and leaves already uploaded items on the destination as they are.

use bridge_traits::{BridgeError, DestinationCatalog, ItemHandle, SourceCatalog};
use bytes::Bytes;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::retry::{RetryError, RetryPolicy};
use crate::staging::{CollectionStage, StagingArea};

/// Items a pipeline run managed to upload, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    /// `(source name, destination handle)` pairs
    pub uploaded: Vec<(String, ItemHandle)>,
    /// Names that disappeared from the source before they could be fetched
    pub skipped: Vec<String>,
}

impl TransferOutcome {
    pub fn handles(&self) -> impl Iterator<Item = &ItemHandle> {
        self.uploaded.iter().map(|(_, handle)| handle)
    }

    pub fn is_empty(&self) -> bool {
        self.uploaded.is_empty()
    }
}

/// Stage-and-upload step shared by new and existing collections.
pub struct TransferPipeline {
    source: Arc<dyn SourceCatalog>,
    destination: Arc<dyn DestinationCatalog>,
    staging: StagingArea,
    retry: RetryPolicy,
}

impl TransferPipeline {
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        destination: Arc<dyn DestinationCatalog>,
        staging: StagingArea,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            destination,
            staging,
            retry,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Stage and upload `names` from the source folder `collection`.
    ///
    /// The collection's staging directory is purged first and removed again
    /// before returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Fatal`] when an upload exhausts its retries or is
    ///   rejected permanently
    /// - [`SyncError::RemoteUnavailable`] when the source cannot be reached
    /// - [`SyncError::Staging`] / [`SyncError::Bridge`] for local I/O failures
    #[instrument(skip(self, names), fields(count = names.len()))]
    pub async fn stage_and_upload(
        &self,
        collection: &str,
        names: &BTreeSet<String>,
    ) -> Result<TransferOutcome> {
        let stage = self.staging.prepare(collection).await?;

        let result = self.transfer_all(&stage, collection, names).await;

        if let Err(err) = stage.release().await {
            warn!(collection = %collection, error = %err, "Failed to release staging directory");
        }

        if let Ok(outcome) = &result {
            info!(
                collection = %collection,
                uploaded = outcome.uploaded.len(),
                skipped = outcome.skipped.len(),
                "Transfer finished"
            );
        }
        result
    }

    async fn transfer_all(
        &self,
        stage: &CollectionStage,
        collection: &str,
        names: &BTreeSet<String>,
    ) -> Result<TransferOutcome> {
        let mut outcome = TransferOutcome::default();

        for name in names {
            let path = format!("{}/{}", collection, name);

            let data = match self.source.fetch(&path).await {
                Ok(data) => data,
                Err(BridgeError::NotFound(reason)) => {
                    warn!(item = %path, reason = %reason, "Item vanished before fetch, skipping");
                    outcome.skipped.push(name.clone());
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let staged = stage.stage(name, data).await?;
            let payload = stage.load(&staged).await?;
            let handle = self.upload(name, payload).await?;
            stage.discard(staged).await?;

            debug!(item = %path, handle = %handle, "Uploaded item");
            outcome.uploaded.push((name.clone(), handle));
        }

        Ok(outcome)
    }

    async fn upload(&self, name: &str, data: Bytes) -> Result<ItemHandle> {
        let label = format!("upload {}", name);
        let destination = &self.destination;

        self.retry
            .execute(&label, BridgeError::is_transient, || {
                destination.upload(data.clone(), name)
            })
            .await
            .map_err(|err| escalate(label, err))
    }
}

/// Map a terminal retry failure onto the run-level error taxonomy.
fn escalate(operation: String, err: RetryError<BridgeError>) -> SyncError {
    match err {
        RetryError::Exhausted { attempts, last } => SyncError::Fatal {
            operation,
            attempts,
            reason: last.to_string(),
        },
        RetryError::NonTransient {
            attempt,
            error: BridgeError::PermanentUpload { reason },
        } => SyncError::Fatal {
            operation,
            attempts: attempt,
            reason,
        },
        RetryError::NonTransient { error, .. } => error.into(),
    }
}
