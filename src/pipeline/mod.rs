//! Pipeline entry points for monitoring runs.
//!
//! - `diff`: per-category added/removed computation
//! - `guard`: suspicious listing drop detection
//! - `run`: the fetch → diff → persist → notify orchestration

pub mod diff;
pub mod guard;
pub mod run;

pub use diff::{CategoryCounts, CategoryDiff, DiffReport, ListingDiff, diff_listing};
pub use guard::{GuardResult, ListingGuard};
pub use run::{Monitor, RunOutcome, RunResponse, RunStage, RunSummary};
