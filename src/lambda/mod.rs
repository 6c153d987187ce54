// src/lambda/mod.rs

//! AWS Lambda handler for the listing watcher.
//!
//! Each scheduled invocation:
//! 1. Builds configuration (optional TOML + environment overrides)
//! 2. Fetches every tracked category
//! 3. Diffs against the snapshot in S3 and overwrites it
//! 4. Emails a consolidated report through SES when anything changed

use std::path::PathBuf;
use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::{CONFIG_PATH_VAR, load_runtime_config};
use crate::error::Result;
use crate::notify::{Notifier, SesTransport};
use crate::pipeline::{Monitor, RunOutcome, RunResponse, RunStage};
use crate::services::ListingFetcher;
use crate::storage::S3Storage;

/// Main Lambda handler function. The event payload is ignored.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<RunResponse, LambdaError> {
    let start = std::time::Instant::now();
    info!(request_id = %event.context.request_id, "Starting listing check");

    let outcome = match run_lambda().await {
        Ok(outcome) => outcome,
        Err(e) => RunOutcome::Failed {
            stage: RunStage::Fetching,
            error: e,
        },
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &outcome {
        RunOutcome::Completed(summary) => info!(
            elapsed_ms,
            notified = summary.notified,
            "Listing check completed"
        ),
        RunOutcome::Failed { stage, error } => {
            error!(elapsed_ms, %stage, "Listing check failed: {}", error)
        }
    }

    Ok(RunResponse::from(&outcome))
}

/// Set up collaborators from the environment and run once.
///
/// Errors here happen before the run starts (configuration, client setup).
async fn run_lambda() -> Result<RunOutcome> {
    let config_path = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
    let config = load_runtime_config(config_path.as_deref())?;

    let storage = S3Storage::from_config(&config.storage).await;
    let transport = SesTransport::from_env().await;
    let notifier = Notifier::new(Arc::new(transport), config.email.clone());

    let fetcher = match ListingFetcher::new(&config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            notifier.notify_error(&e).await;
            return Err(e);
        }
    };

    let monitor = Monitor::new(&config, &fetcher, &storage, &notifier);
    Ok(monitor.run().await)
}
