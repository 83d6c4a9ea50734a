//! Set difference between a source listing and a destination listing.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Partition of the source names into what must be transferred and what
/// the destination already has.
///
/// `to_transfer ∪ already_present` equals the source names and the two sets
/// are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub to_transfer: BTreeSet<String>,
    pub already_present: BTreeSet<String>,
}

impl DiffResult {
    /// Nothing to transfer
    pub fn is_empty(&self) -> bool {
        self.to_transfer.is_empty()
    }
}

/// Compute `source − destination` and the source names left over.
///
/// Destination names absent from the source are ignored: deletions are never
/// propagated.
pub fn compute_diff(source: &BTreeSet<String>, destination: &BTreeSet<String>) -> DiffResult {
    let to_transfer: BTreeSet<String> = source.difference(destination).cloned().collect();
    let already_present: BTreeSet<String> = source.difference(&to_transfer).cloned().collect();

    debug!(
        source = ?source,
        destination = ?destination,
        to_transfer = ?to_transfer,
        already_present = ?already_present,
        "Computed diff"
    );

    DiffResult {
        to_transfer,
        already_present,
    }
}
