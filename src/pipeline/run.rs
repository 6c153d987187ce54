// src/pipeline/run.rs

//! Run orchestration: fetch → diff → persist → notify.
//!
//! A run either commits everything (new snapshot, then notification) or
//! fails at one stage. Any fetch failure aborts before the snapshot is
//! touched, so a category is never dropped from the stored state.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, Listings};
use crate::notify::{Notifier, NotifyOutcome};
use crate::pipeline::diff::{CategoryCounts, CategoryDiff, DiffReport};
use crate::pipeline::guard::ListingGuard;
use crate::services::ListingSource;
use crate::storage::SnapshotStorage;

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    Fetching,
    Diffing,
    Persisting,
    Notifying,
    Done,
}

impl RunStage {
    fn step(self) -> usize {
        match self {
            Self::Fetching => 1,
            Self::Diffing => 2,
            Self::Persisting => 3,
            Self::Notifying => 4,
            Self::Done => 5,
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetching => "fetching",
            Self::Diffing => "diffing",
            Self::Persisting => "persisting",
            Self::Notifying => "notifying",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Counts per category key
    pub categories: BTreeMap<String, CategoryCounts>,
    /// Whether a change email was actually sent
    pub notified: bool,
    pub snapshot_updated_at: DateTime<Utc>,
}

/// Outcome of a run.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    Failed { stage: RunStage, error: AppError },
}

/// Structured result returned to the scheduler.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunResponse {
    Success {
        categories: BTreeMap<String, CategoryCounts>,
        notified: bool,
    },
    Failure {
        stage: RunStage,
        error_kind: String,
        error: String,
    },
}

impl From<&RunOutcome> for RunResponse {
    fn from(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed(summary) => Self::Success {
                categories: summary.categories.clone(),
                notified: summary.notified,
            },
            RunOutcome::Failed { stage, error } => Self::Failure {
                stage: *stage,
                error_kind: error.kind().to_string(),
                error: error.to_string(),
            },
        }
    }
}

/// Orchestrates one monitoring run over every tracked category.
pub struct Monitor<'a> {
    config: &'a Config,
    source: &'a dyn ListingSource,
    storage: &'a dyn SnapshotStorage,
    notifier: &'a Notifier,
    guard: ListingGuard,
}

impl<'a> Monitor<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn ListingSource,
        storage: &'a dyn SnapshotStorage,
        notifier: &'a Notifier,
    ) -> Self {
        Self {
            config,
            source,
            storage,
            notifier,
            guard: ListingGuard::new(config.guard.clone()),
        }
    }

    /// Execute a full run.
    ///
    /// On failure a best-effort error email is attempted; its own failure
    /// is only logged.
    pub async fn run(&self) -> RunOutcome {
        let start = Instant::now();
        let mut stage = RunStage::Fetching;

        match self.execute(&mut stage).await {
            Ok(summary) => {
                log::info!(
                    "Run completed in {}ms: {:?}",
                    start.elapsed().as_millis(),
                    summary.categories
                );
                RunOutcome::Completed(summary)
            }
            Err(error) => {
                log::error!("Run failed while {}: {}", stage, error);
                self.notifier.notify_error(&error).await;
                RunOutcome::Failed { stage, error }
            }
        }
    }

    /// Fetch and diff without persisting or notifying.
    pub async fn check(&self) -> Result<(Listings, DiffReport)> {
        let current = self.fetch_all().await?;
        let previous = self.storage.load(&self.config.categories).await;
        let report = self.diff_all(&current, &previous)?;
        Ok((current, report))
    }

    async fn execute(&self, stage: &mut RunStage) -> Result<RunSummary> {
        self.enter(stage, RunStage::Fetching);
        let current = self.fetch_all().await?;

        self.enter(stage, RunStage::Diffing);
        let previous = self.storage.load(&self.config.categories).await;
        let report = self.diff_all(&current, &previous)?;

        self.enter(stage, RunStage::Persisting);
        let snapshot = self.storage.save(&self.config.categories, &current).await?;

        let mut notified = false;
        if report.has_changes() {
            self.enter(stage, RunStage::Notifying);
            notified = self.notifier.notify(&report).await? == NotifyOutcome::Sent;
        } else {
            log::info!("No changes in any category");
        }

        self.enter(stage, RunStage::Done);
        Ok(RunSummary {
            categories: report.counts(),
            notified,
            snapshot_updated_at: snapshot.last_updated,
        })
    }

    fn enter(&self, stage: &mut RunStage, next: RunStage) {
        *stage = next;
        if next != RunStage::Done {
            log::info!("[STEP {}/4] {}", next.step(), next);
        }
    }

    /// Fetch every category; the first failure aborts.
    async fn fetch_all(&self) -> Result<Listings> {
        let mut listings = Listings::new();
        for category in &self.config.categories {
            let entries = self.source.fetch(category).await?;
            listings.insert(category.key.clone(), entries);
        }
        Ok(listings)
    }

    fn diff_all(&self, current: &Listings, previous: &Listings) -> Result<DiffReport> {
        let mut report = DiffReport::default();
        for category in &self.config.categories {
            let current = current.get(&category.key).map(Vec::as_slice).unwrap_or(&[]);
            let previous = previous.get(&category.key).map(Vec::as_slice).unwrap_or(&[]);

            self.guard
                .validate(&category.key, current.len(), previous.len())?;

            let diff = CategoryDiff::compute(category, current, previous);
            log::info!(
                "{}: {} listed, {} new, {} removed",
                category.name,
                diff.total,
                diff.diff.added.len(),
                diff.diff.removed.len()
            );
            report.categories.push(diff);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::models::{Category, GuardMode, ProductEntry, Snapshot};
    use crate::notify::tests::{RecordingTransport, email_config};

    /// Listing source serving canned entries or errors per category.
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, Vec<ProductEntry>>,
        broken: Option<String>,
    }

    impl FakeSource {
        fn with(mut self, key: &str, entries: Vec<ProductEntry>) -> Self {
            self.pages.insert(key.to_string(), entries);
            self
        }

        fn broken(mut self, key: &str) -> Self {
            self.broken = Some(key.to_string());
            self
        }
    }

    #[async_trait]
    impl ListingSource for FakeSource {
        async fn fetch(&self, category: &Category) -> Result<Vec<ProductEntry>> {
            if self.broken.as_deref() == Some(category.key.as_str()) {
                return Err(AppError::structure(&category.url, "div.main-products.product-grid"));
            }
            Ok(self.pages.get(&category.key).cloned().unwrap_or_default())
        }
    }

    /// In-memory storage with switchable read/write failures.
    #[derive(Default)]
    struct MemoryStorage {
        snapshot: Mutex<Option<Snapshot>>,
        fail_read: bool,
        fail_write: bool,
    }

    impl MemoryStorage {
        fn seeded(key: &str, entries: Vec<ProductEntry>) -> Self {
            let mut listings = Listings::new();
            listings.insert(key.to_string(), entries);
            Self {
                snapshot: Mutex::new(Some(Snapshot::new("current_games", listings))),
                ..Self::default()
            }
        }

        fn stored(&self) -> Option<Snapshot> {
            self.snapshot.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SnapshotStorage for MemoryStorage {
        fn snapshot_id(&self) -> &str {
            "current_games"
        }

        fn location(&self) -> String {
            "memory".to_string()
        }

        async fn read_snapshot(&self) -> Result<Option<Snapshot>> {
            if self.fail_read {
                return Err(AppError::persistence_read("table unavailable"));
            }
            Ok(self.stored())
        }

        async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
            if self.fail_write {
                return Err(AppError::persistence_write("access denied"));
            }
            *self.snapshot.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.categories = vec![
            Category::new("pre_orders", "Pre-Orders", "https://shop.example.com/pre-orders"),
            Category::new("new_arrivals", "New Arrivals", "https://shop.example.com/new"),
        ];
        config.email = email_config();
        config
    }

    fn catan() -> ProductEntry {
        ProductEntry::new("Catan", "₹1999", "/catan")
    }

    fn wingspan() -> ProductEntry {
        ProductEntry::new("Wingspan", "₹3499", "/wingspan").with_stock_status("Pre-order")
    }

    fn azul() -> ProductEntry {
        ProductEntry::new("Azul", "₹2499", "/azul")
    }

    fn summary(outcome: RunOutcome) -> RunSummary {
        match outcome {
            RunOutcome::Completed(summary) => summary,
            RunOutcome::Failed { stage, error } => panic!("run failed while {stage}: {error}"),
        }
    }

    #[tokio::test]
    async fn test_no_change_sends_nothing() {
        let config = config();
        let source = FakeSource::default().with("pre_orders", vec![catan()]);
        let storage = MemoryStorage::seeded("pre_orders", vec![catan()]);
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), config.email.clone());

        let summary = summary(Monitor::new(&config, &source, &storage, &notifier).run().await);

        assert!(!summary.notified);
        assert_eq!(summary.categories["pre_orders"].added, 0);
        assert_eq!(summary.categories["pre_orders"].removed, 0);
        assert!(transport.emails().is_empty());
        assert_eq!(storage.stored().unwrap().entries("pre_orders"), &[catan()]);
    }

    #[tokio::test]
    async fn test_new_item_is_reported() {
        let config = config();
        let source = FakeSource::default().with("pre_orders", vec![wingspan()]);
        let storage = MemoryStorage::default();
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), config.email.clone());

        let summary = summary(Monitor::new(&config, &source, &storage, &notifier).run().await);

        assert!(summary.notified);
        assert_eq!(summary.categories["pre_orders"].added, 1);
        let emails = transport.emails();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "Board Games Update: 1 New, 0 Removed");
        assert!(emails[0].html_body.contains("Wingspan"));
    }

    #[tokio::test]
    async fn test_removed_item_is_reported() {
        let config = config();
        let source = FakeSource::default();
        let storage = MemoryStorage::seeded("pre_orders", vec![azul()]);
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), config.email.clone());

        let summary = summary(Monitor::new(&config, &source, &storage, &notifier).run().await);

        assert_eq!(summary.categories["pre_orders"].removed, 1);
        assert_eq!(summary.categories["pre_orders"].added, 0);
        assert_eq!(transport.emails().len(), 1);
        assert!(storage.stored().unwrap().entries("pre_orders").is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_reports_everything_as_new() {
        let config = config();
        let source = FakeSource::default()
            .with("pre_orders", vec![wingspan(), catan()])
            .with("new_arrivals", vec![azul()]);
        let storage = MemoryStorage {
            fail_read: true,
            ..MemoryStorage::default()
        };
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), config.email.clone());

        let summary = summary(Monitor::new(&config, &source, &storage, &notifier).run().await);

        assert_eq!(summary.categories["pre_orders"].added, 2);
        assert_eq!(summary.categories["new_arrivals"].added, 1);
        let stored = storage.stored().unwrap();
        assert_eq!(stored.entries("pre_orders").len(), 2);
        assert_eq!(stored.entries("new_arrivals"), &[azul()]);
    }

    #[tokio::test]
    async fn test_structure_error_keeps_snapshot() {
        let config = config();
        let source = FakeSource::default()
            .with("pre_orders", vec![wingspan()])
            .broken("new_arrivals");
        let storage = MemoryStorage::seeded("pre_orders", vec![catan()]);
        let before = storage.stored();
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), config.email.clone());

        let outcome = Monitor::new(&config, &source, &storage, &notifier).run().await;

        match &outcome {
            RunOutcome::Failed { stage, error } => {
                assert_eq!(*stage, RunStage::Fetching);
                assert!(matches!(error, AppError::Structure { .. }));
            }
            RunOutcome::Completed(_) => panic!("expected failure"),
        }
        assert_eq!(storage.stored(), before);

        let emails = transport.emails();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "Board Games Monitor Error");
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal_and_skips_diff_email() {
        let config = config();
        let source = FakeSource::default().with("pre_orders", vec![wingspan()]);
        let storage = MemoryStorage {
            fail_write: true,
            ..MemoryStorage::default()
        };
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), config.email.clone());

        let outcome = Monitor::new(&config, &source, &storage, &notifier).run().await;

        assert!(matches!(
            outcome,
            RunOutcome::Failed {
                stage: RunStage::Persisting,
                error: AppError::PersistenceWrite(_)
            }
        ));
        let emails = transport.emails();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "Board Games Monitor Error");
    }

    #[tokio::test]
    async fn test_notification_failure_fails_run_after_persisting() {
        let config = config();
        let source = FakeSource::default().with("pre_orders", vec![wingspan()]);
        let storage = MemoryStorage::default();
        let notifier = Notifier::new(Arc::new(RecordingTransport::failing()), config.email.clone());

        let outcome = Monitor::new(&config, &source, &storage, &notifier).run().await;

        assert!(matches!(
            outcome,
            RunOutcome::Failed {
                stage: RunStage::Notifying,
                error: AppError::Notification(_)
            }
        ));
        assert_eq!(storage.stored().unwrap().entries("pre_orders"), &[wingspan()]);
    }

    #[tokio::test]
    async fn test_abort_guard_stops_before_persisting() {
        let mut config = config();
        config.guard.mode = GuardMode::Abort;
        config.guard.min_baseline = 1;
        let source = FakeSource::default();
        let storage = MemoryStorage::seeded("pre_orders", vec![catan(), azul()]);
        let before = storage.stored();
        let notifier = Notifier::new(Arc::new(RecordingTransport::default()), config.email.clone());

        let outcome = Monitor::new(&config, &source, &storage, &notifier).run().await;

        assert!(matches!(
            outcome,
            RunOutcome::Failed {
                stage: RunStage::Diffing,
                ..
            }
        ));
        assert_eq!(storage.stored(), before);
    }

    #[tokio::test]
    async fn test_check_has_no_side_effects() {
        let config = config();
        let source = FakeSource::default().with("pre_orders", vec![wingspan()]);
        let storage = MemoryStorage::seeded("pre_orders", vec![catan()]);
        let before = storage.stored();
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), config.email.clone());

        let (current, report) = Monitor::new(&config, &source, &storage, &notifier)
            .check()
            .await
            .unwrap();

        assert_eq!(current["pre_orders"], vec![wingspan()]);
        assert_eq!(report.added_count(), 1);
        assert_eq!(report.removed_count(), 1);
        assert_eq!(storage.stored(), before);
        assert!(transport.emails().is_empty());
    }

    #[test]
    fn test_response_shapes() {
        let mut categories = BTreeMap::new();
        categories.insert(
            "pre_orders".to_string(),
            CategoryCounts {
                total: 3,
                added: 1,
                removed: 0,
            },
        );
        let ok = RunOutcome::Completed(RunSummary {
            categories,
            notified: true,
            snapshot_updated_at: Utc::now(),
        });
        let json = serde_json::to_value(RunResponse::from(&ok)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["categories"]["pre_orders"]["added"], 1);

        let failed = RunOutcome::Failed {
            stage: RunStage::Fetching,
            error: AppError::fetch("https://example.com", "HTTP status 500"),
        };
        let json = serde_json::to_value(RunResponse::from(&failed)).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["stage"], "fetching");
        assert_eq!(json["error_kind"], "fetch");
        assert!(json["error"].as_str().unwrap().contains("HTTP status 500"));
    }
}
