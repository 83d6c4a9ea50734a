//! Summary of one reconciliation pass.

use serde::Serialize;
use std::fmt;

/// What happened to one collection during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionAction {
    /// New destination collection created
    Created,
    /// Items attached to an existing collection
    Updated,
    /// Existing collection already had every eligible item
    Unchanged,
    /// Source folder had no eligible items; nothing created
    SkippedEmpty,
    /// Dry run: collection would be created
    WouldCreate,
    /// Dry run: items would be attached
    WouldUpdate,
}

impl fmt::Display for CollectionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::SkippedEmpty => "skipped (empty)",
            Self::WouldCreate => "would create",
            Self::WouldUpdate => "would update",
        };
        f.write_str(s)
    }
}

/// Per-collection counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub name: String,
    pub action: CollectionAction,
    /// Items uploaded to the destination
    pub items_uploaded: usize,
    /// Items bound to the collection (seed item included)
    pub items_attached: usize,
    /// Items that vanished from the source before they could be fetched
    pub items_skipped: Vec<String>,
    /// Items the destination already had
    pub items_already_present: usize,
    /// Items a dry run would transfer
    pub items_planned: Vec<String>,
}

impl CollectionReport {
    pub fn new(name: impl Into<String>, action: CollectionAction) -> Self {
        Self {
            name: name.into(),
            action,
            items_uploaded: 0,
            items_attached: 0,
            items_skipped: Vec::new(),
            items_already_present: 0,
            items_planned: Vec::new(),
        }
    }
}

/// Result of a whole pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub collections: Vec<CollectionReport>,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            collections: Vec::new(),
        }
    }

    pub fn push(&mut self, collection: CollectionReport) {
        self.collections.push(collection);
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| c.name == name)
    }

    fn count(&self, action: CollectionAction) -> usize {
        self.collections.iter().filter(|c| c.action == action).count()
    }

    pub fn collections_created(&self) -> usize {
        self.count(CollectionAction::Created)
    }

    pub fn collections_updated(&self) -> usize {
        self.count(CollectionAction::Updated)
    }

    pub fn items_uploaded(&self) -> usize {
        self.collections.iter().map(|c| c.items_uploaded).sum()
    }

    pub fn items_attached(&self) -> usize {
        self.collections.iter().map(|c| c.items_attached).sum()
    }

    pub fn items_skipped(&self) -> usize {
        self.collections.iter().map(|c| c.items_skipped.len()).sum()
    }

    pub fn items_already_present(&self) -> usize {
        self.collections.iter().map(|c| c.items_already_present).sum()
    }

    pub fn items_planned(&self) -> usize {
        self.collections.iter().map(|c| c.items_planned.len()).sum()
    }

    /// True when the pass moved (or would move) nothing
    pub fn is_noop(&self) -> bool {
        self.items_uploaded() == 0 && self.items_planned() == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.collections {
            write!(f, "{}: {}", c.name, c.action)?;
            if self.dry_run {
                write!(f, " ({} to transfer", c.items_planned.len())?;
            } else {
                write!(
                    f,
                    " ({} uploaded, {} attached",
                    c.items_uploaded, c.items_attached
                )?;
            }
            writeln!(
                f,
                ", {} already present, {} skipped)",
                c.items_already_present,
                c.items_skipped.len()
            )?;
        }

        if self.dry_run {
            write!(
                f,
                "dry run: {} collection(s) examined, {} item(s) to transfer",
                self.collections.len(),
                self.items_planned()
            )
        } else {
            write!(
                f,
                "{} collection(s) created, {} updated, {} item(s) uploaded",
                self.collections_created(),
                self.collections_updated(),
                self.items_uploaded()
            )
        }
    }
}
