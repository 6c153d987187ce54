//! Snapshot persistence.
//!
//! A deployment keeps exactly one snapshot record, overwritten after
//! every successful run:
//!
//! ```text
//! {
//!   "id": "current_games",
//!   "categories": { "pre_orders": [...], "new_arrivals": [...] },
//!   "last_updated": "2026-10-19T08:00:00Z"
//! }
//! ```
//!
//! Backends only read and write that record; the load/save contract on
//! top of them lives in the provided trait methods.

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Category, Listings, Snapshot};

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Identifier of the snapshot record.
    fn snapshot_id(&self) -> &str;

    /// Human-readable location of the record, for logs.
    fn location(&self) -> String;

    /// Read the stored snapshot, `None` when nothing was written yet.
    async fn read_snapshot(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot.
    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// Load previous entries for every tracked category.
    ///
    /// Never fails: a read error is logged and treated as an empty
    /// previous state, and categories absent from the snapshot load as
    /// empty.
    async fn load(&self, categories: &[Category]) -> Listings {
        let snapshot = match self.read_snapshot().await {
            Ok(Some(snapshot)) => {
                log::info!(
                    "Loaded snapshot from {} (last updated {})",
                    self.location(),
                    snapshot.last_updated
                );
                Some(snapshot)
            }
            Ok(None) => {
                log::info!("No snapshot at {}, starting empty", self.location());
                None
            }
            Err(e) => {
                log::warn!(
                    "Snapshot read failed at {}: {}; treating previous listings as empty",
                    self.location(),
                    e
                );
                None
            }
        };

        categories
            .iter()
            .map(|category| {
                let entries = snapshot
                    .as_ref()
                    .map(|s| s.entries(&category.key).to_vec())
                    .unwrap_or_default();
                (category.key.clone(), entries)
            })
            .collect()
    }

    /// Persist the listings of exactly the tracked categories.
    async fn save(&self, categories: &[Category], listings: &Listings) -> Result<Snapshot> {
        let mut tracked = Listings::new();
        for category in categories {
            let entries = listings.get(&category.key).ok_or_else(|| {
                AppError::persistence_write(format!(
                    "no listing for tracked category {}",
                    category.key
                ))
            })?;
            tracked.insert(category.key.clone(), entries.clone());
        }

        let snapshot = Snapshot::new(self.snapshot_id(), tracked);
        self.write_snapshot(&snapshot).await.map_err(|e| match e {
            AppError::PersistenceWrite(_) => e,
            other => AppError::persistence_write(other),
        })?;

        log::info!(
            "Saved snapshot with {} entries to {}",
            snapshot.entry_count(),
            self.location()
        );
        Ok(snapshot)
    }
}
