//! Persisted listing snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Listings, ProductEntry};

/// The single persisted record: the last observed listings of every
/// tracked category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Fixed record identifier
    pub id: String,

    /// Entries per category key
    #[serde(default)]
    pub categories: Listings,

    /// Time the snapshot was written
    pub last_updated: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(id: impl Into<String>, categories: Listings) -> Self {
        Self {
            id: id.into(),
            categories,
            last_updated: Utc::now(),
        }
    }

    /// Entries recorded for a category, empty when the category is unknown.
    pub fn entries(&self, key: &str) -> &[ProductEntry] {
        self.categories.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of entries across all categories.
    pub fn entry_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}
