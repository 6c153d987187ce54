//! Service layer for the listing watcher.
//!
//! This module contains the business logic for:
//! - Listing retrieval and parsing (`ListingFetcher`)

mod listings;

pub use listings::{ListingFetcher, ListingParser, ListingSource};
