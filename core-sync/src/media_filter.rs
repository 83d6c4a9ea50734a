//! # Media Filter
//!
//! Decides whether a source entry is a transferable media item.
//!
//! Collections are never accepted. Leaf entries must carry an allowed MIME
//! type and a size at or below the ceiling. Sizes reported as human strings
//! (`"<number> <unit>"`, unit one of `bytes`, `KB`, `MB`, binary multiples)
//! are normalised to bytes first; a string that cannot be parsed rejects the
//! entry rather than raising an error.

use bridge_traits::{Entry, EntrySize};
use core_runtime::config::MediaSettings;
use std::collections::HashSet;
use tracing::{debug, warn};

const KIB: f64 = 1024.0;
const MIB: f64 = 1_048_576.0;

/// Pure eligibility predicate for source entries.
#[derive(Debug, Clone)]
pub struct MediaFilter {
    allowed_mime_types: HashSet<String>,
    max_size_bytes: u64,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::from_settings(&MediaSettings::default())
    }
}

impl MediaFilter {
    /// Create a filter with an explicit allow-list and size ceiling
    pub fn new<I, S>(allowed_mime_types: I, max_size_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_mime_types: allowed_mime_types.into_iter().map(Into::into).collect(),
            max_size_bytes,
        }
    }

    /// Create a filter from configuration
    pub fn from_settings(settings: &MediaSettings) -> Self {
        Self::new(
            settings.allowed_mime_types.iter().cloned(),
            settings.max_item_size_bytes,
        )
    }

    /// Size ceiling in bytes (inclusive)
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Whether `entry` should be transferred
    pub fn accepts(&self, entry: &Entry) -> bool {
        if entry.is_collection {
            return false;
        }

        if !self.is_allowed_mime(&entry.mime_type) {
            debug!(
                name = %entry.name,
                mime_type = %entry.mime_type,
                "Rejected entry: unsupported MIME type"
            );
            return false;
        }

        self.within_size_limit(&entry.name, &entry.size)
    }

    /// Whether the MIME type is on the allow-list
    pub fn is_allowed_mime(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(mime_type)
    }

    fn within_size_limit(&self, name: &str, size: &EntrySize) -> bool {
        let bytes = match size {
            EntrySize::Bytes(bytes) => *bytes as f64,
            EntrySize::Human(text) => match parse_size(text) {
                Some(bytes) => bytes,
                None => {
                    debug!(name = %name, size = %text, "Rejected entry: unparseable size");
                    return false;
                }
            },
        };

        let accepted = bytes <= self.max_size_bytes as f64;
        if !accepted {
            warn!(
                name = %name,
                size_bytes = bytes,
                limit_bytes = self.max_size_bytes,
                "Rejected entry: too large"
            );
        }
        accepted
    }
}

/// Parse a `"<number> <unit>"` size string into bytes.
///
/// Units are case-sensitive: `bytes`, `KB` (1024) and `MB` (1,048,576).
/// Returns `None` for anything else, including negative or non-finite numbers.
pub fn parse_size(text: &str) -> Option<f64> {
    let (number, unit) = text.split_once(' ')?;
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let multiplier = match unit {
        "bytes" => 1.0,
        "KB" => KIB,
        "MB" => MIB,
        _ => return None,
    };

    Some(value * multiplier)
}
