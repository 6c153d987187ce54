// src/models/mod.rs

//! Domain models for the listing watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod category;
mod config;
mod product;
mod selectors;
mod snapshot;

// Re-export all public types
pub use category::{Category, Listings};
pub use config::{Config, EmailConfig, FetcherConfig, GuardConfig, GuardMode, StorageConfig};
pub use product::ProductEntry;
pub use selectors::ListingSelectors;
pub use snapshot::Snapshot;
