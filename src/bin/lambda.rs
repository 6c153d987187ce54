//! AWS Lambda entry point for listwatch.
//!
//! Deploy with `cargo lambda build --release --features lambda` and trigger
//! it from a schedule.
//!
//! ## Environment Variables
//!
//! - `LISTWATCH_CONFIG`: optional path to a bundled `config.toml`
//! - `SES_SENDER_EMAIL` / `RECEIVER_EMAIL`: notification addresses
//! - `SNAPSHOT_KEY`: snapshot record identifier (default: `current_games`)
//! - `S3_BUCKET` / `S3_PREFIX`: snapshot location
//! - `FETCH_TIMEOUT_SECS`, `USER_AGENT`: HTTP settings
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("listwatch Lambda starting...");
    lambda_runtime::run(service_fn(listwatch::lambda::handler)).await
}
