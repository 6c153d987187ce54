//! Diff calculation between current and previous listings.
//!
//! Entries are compared by value: an entry is added when its exact value
//! does not occur in the previous listing and removed when it no longer
//! occurs in the current one. Duplicates collapse and output keeps the
//! order of the side each entry was drawn from.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{Category, ProductEntry};

/// Added and removed entries of one listing.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ListingDiff {
    /// In current, not in previous (current order)
    pub added: Vec<ProductEntry>,
    /// In previous, not in current (previous order)
    pub removed: Vec<ProductEntry>,
}

impl ListingDiff {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Compute the entries added to and removed from a listing.
pub fn diff_listing(current: &[ProductEntry], previous: &[ProductEntry]) -> ListingDiff {
    ListingDiff {
        added: missing_from(current, previous),
        removed: missing_from(previous, current),
    }
}

/// Entries of `side` whose value is absent from `other`, first occurrence only.
fn missing_from(side: &[ProductEntry], other: &[ProductEntry]) -> Vec<ProductEntry> {
    let other: HashSet<&ProductEntry> = other.iter().collect();
    let mut seen = HashSet::new();

    side.iter()
        .filter(|entry| !other.contains(entry) && seen.insert(*entry))
        .cloned()
        .collect()
}

/// Per-entry counts for one category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub total: usize,
    pub added: usize,
    pub removed: usize,
}

/// Diff of a single tracked category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryDiff {
    pub category: Category,
    /// Number of entries currently listed
    pub total: usize,
    pub diff: ListingDiff,
}

impl CategoryDiff {
    /// Diff a category's current entries against its previous entries.
    pub fn compute(
        category: &Category,
        current: &[ProductEntry],
        previous: &[ProductEntry],
    ) -> Self {
        Self {
            category: category.clone(),
            total: current.len(),
            diff: diff_listing(current, previous),
        }
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            total: self.total,
            added: self.diff.added.len(),
            removed: self.diff.removed.len(),
        }
    }
}

/// Diffs of every tracked category, in configuration order.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub categories: Vec<CategoryDiff>,
}

impl DiffReport {
    /// Check if any category changed.
    pub fn has_changes(&self) -> bool {
        self.categories.iter().any(|c| c.diff.has_changes())
    }

    pub fn added_count(&self) -> usize {
        self.categories.iter().map(|c| c.diff.added.len()).sum()
    }

    pub fn removed_count(&self) -> usize {
        self.categories.iter().map(|c| c.diff.removed.len()).sum()
    }

    /// Counts keyed by category key.
    pub fn counts(&self) -> BTreeMap<String, CategoryCounts> {
        self.categories
            .iter()
            .map(|c| (c.category.key.clone(), c.counts()))
            .collect()
    }
}
