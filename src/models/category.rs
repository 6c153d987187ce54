//! Tracked listing categories.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::ProductEntry;

/// Entries per category key, in fetch order within each category.
pub type Listings = BTreeMap<String, Vec<ProductEntry>>;

/// One tracked listing page (e.g. pre-orders, new arrivals).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Stable key used in snapshots and results
    pub key: String,

    /// Human-readable name used in reports
    pub name: String,

    /// Source listing page
    pub url: String,
}

impl Category {
    pub fn new(key: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}
