//! listwatch CLI
//!
//! Local execution and diagnostics. For AWS Lambda, use `listwatch-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use listwatch::{
    config::load_config,
    error::{AppError, Result},
    models::{Category, Config, ProductEntry},
    notify::{LogTransport, MailTransport, Notifier},
    pipeline::{Monitor, RunOutcome},
    services::{ListingFetcher, ListingSource},
    storage::{LocalStorage, SnapshotStorage},
};

/// listwatch - retail listing change monitor
#[derive(Parser, Debug)]
#[command(
    name = "listwatch",
    version,
    about = "Watches pre-order and new-arrival listings for changes"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch listings and print them (read-only)
    Fetch {
        /// Only fetch this category key
        #[arg(long)]
        category: Option<String>,
    },

    /// Diff current listings against the stored snapshot without saving or emailing
    Check,

    /// Full run: fetch, diff, save the snapshot, notify
    Run {
        /// Send email through SES instead of logging it
        #[arg(long)]
        send: bool,
    },

    /// Validate configuration
    Validate,

    /// Show stored snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_entries(title: &str, entries: &[ProductEntry]) {
    println!("\n{} ({}):", title, entries.len());
    for entry in entries {
        println!("- {} ({})", entry.title, entry.price);
        println!("  URL: {}", entry.url);
        if let Some(status) = &entry.stock_status {
            println!("  Stock Status: {}", status);
        }
    }
}

fn selected_categories(config: &Config, key: Option<&str>) -> Result<Vec<Category>> {
    match key {
        Some(key) => config
            .category(key)
            .cloned()
            .map(|c| vec![c])
            .ok_or_else(|| AppError::config(format!("Unknown category: {key}"))),
        None => Ok(config.categories.clone()),
    }
}

#[cfg(feature = "ses")]
async fn transport(send: bool) -> Arc<dyn MailTransport> {
    if send {
        Arc::new(listwatch::notify::SesTransport::from_env().await)
    } else {
        Arc::new(LogTransport)
    }
}

#[cfg(not(feature = "ses"))]
async fn transport(send: bool) -> Arc<dyn MailTransport> {
    if send {
        log::warn!("Built without the 'ses' feature; emails will only be logged");
    }
    Arc::new(LogTransport)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(&cli.config);
    config.apply_env_overrides();

    let storage = LocalStorage::new(&config.storage.local_dir, &config.storage.snapshot_key);

    match cli.command {
        Command::Fetch { category } => {
            config.validate()?;
            let fetcher = ListingFetcher::new(&config)?;
            for category in selected_categories(&config, category.as_deref())? {
                let entries = fetcher.fetch(&category).await?;
                print_entries(&category.name, &entries);
            }
        }

        Command::Check => {
            config.validate()?;
            let fetcher = ListingFetcher::new(&config)?;
            let notifier = Notifier::new(Arc::new(LogTransport), config.email.clone());
            let monitor = Monitor::new(&config, &fetcher, &storage, &notifier);

            let (current, report) = monitor.check().await?;

            println!("\n=== Current State ===");
            for category in &config.categories {
                print_entries(
                    &format!("Current {}", category.name),
                    current.get(&category.key).map(Vec::as_slice).unwrap_or(&[]),
                );
            }

            println!("\n=== Updates ===");
            for category in &report.categories {
                print_entries(&format!("New in {}", category.category.name), &category.diff.added);
                print_entries(
                    &format!("No longer in {}", category.category.name),
                    &category.diff.removed,
                );
            }
        }

        Command::Run { send } => {
            config.validate()?;
            let fetcher = ListingFetcher::new(&config)?;
            let notifier = Notifier::new(transport(send).await, config.email.clone());
            let monitor = Monitor::new(&config, &fetcher, &storage, &notifier);

            let outcome = monitor.run().await;
            let response = listwatch::pipeline::RunResponse::from(&outcome);
            println!("{}", serde_json::to_string_pretty(&response)?);

            if let RunOutcome::Failed { error, .. } = outcome {
                return Err(error);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} categories, snapshot '{}')",
                config.categories.len(),
                config.storage.snapshot_key
            );
            match (&config.email.sender, &config.email.recipient) {
                (Some(_), Some(_)) => log::info!("✓ Email addresses configured"),
                _ => log::warn!("Email sender/recipient missing; notifications will be skipped"),
            }
        }

        Command::Info => {
            log::info!("Snapshot location: {}", storage.location());

            match storage.read_snapshot().await? {
                Some(snapshot) => {
                    log::info!("Last updated: {}", snapshot.last_updated);
                    for (key, entries) in &snapshot.categories {
                        log::info!("  {}: {} entries", key, entries.len());
                    }
                }
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    Ok(())
}
