//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Category, ListingSelectors};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetch settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Listing page selectors, shared by every category
    #[serde(default)]
    pub selectors: ListingSelectors,

    /// Tracked categories
    #[serde(default = "defaults::categories")]
    pub categories: Vec<Category>,

    /// Snapshot persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification addresses
    #[serde(default)]
    pub email: EmailConfig,

    /// Empty-listing guard
    #[serde(default)]
    pub guard: GuardConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override settings from process environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override settings from a variable lookup.
    ///
    /// Recognised names: `SES_SENDER_EMAIL`, `RECEIVER_EMAIL`, `SNAPSHOT_KEY`,
    /// `S3_BUCKET`, `S3_PREFIX`, `FETCH_TIMEOUT_SECS`, `USER_AGENT`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(sender) = non_empty("SES_SENDER_EMAIL") {
            self.email.sender = Some(sender);
        }
        if let Some(recipient) = non_empty("RECEIVER_EMAIL") {
            self.email.recipient = Some(recipient);
        }
        if let Some(key) = non_empty("SNAPSHOT_KEY") {
            self.storage.snapshot_key = key;
        }
        if let Some(bucket) = non_empty("S3_BUCKET") {
            self.storage.s3_bucket = bucket;
        }
        if let Some(prefix) = lookup("S3_PREFIX") {
            self.storage.s3_prefix = prefix;
        }
        if let Some(agent) = non_empty("USER_AGENT") {
            self.fetcher.user_agent = agent;
        }
        if let Some(timeout) = non_empty("FETCH_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.fetcher.timeout_secs = secs,
                Err(_) => log::warn!("Ignoring invalid FETCH_TIMEOUT_SECS: {}", timeout),
            }
        }
    }

    /// Look up a tracked category by key.
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.categories.is_empty() {
            return Err(AppError::validation("No categories defined"));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.key.trim().is_empty() {
                return Err(AppError::validation("Category key is empty"));
            }
            if !seen.insert(category.key.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate category key: {}",
                    category.key
                )));
            }
            let url = Url::parse(&category.url)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "Category {} must use http(s): {}",
                    category.key, category.url
                )));
            }
        }

        for (name, selector) in self.selectors.named() {
            Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{name}: {e:?}")))?;
        }
        if self.selectors.link_attr.trim().is_empty() {
            return Err(AppError::validation("selectors.link_attr is empty"));
        }

        if self.storage.snapshot_key.trim().is_empty() {
            return Err(AppError::validation("storage.snapshot_key is empty"));
        }
        if self.guard.max_drop_percent > 100 {
            return Err(AppError::validation(
                "guard.max_drop_percent must be within 0..=100",
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            selectors: ListingSelectors::default(),
            categories: defaults::categories(),
            storage: StorageConfig::default(),
            email: EmailConfig::default(),
            guard: GuardConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Identifier of the single snapshot record
    #[serde(default = "defaults::snapshot_key")]
    pub snapshot_key: String,

    /// Directory for the local snapshot file
    #[serde(default = "defaults::local_dir")]
    pub local_dir: String,

    /// S3 bucket for the serverless deployment
    #[serde(default = "defaults::s3_bucket")]
    pub s3_bucket: String,

    /// S3 key prefix
    #[serde(default = "defaults::s3_prefix")]
    pub s3_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_key: defaults::snapshot_key(),
            local_dir: defaults::local_dir(),
            s3_bucket: defaults::s3_bucket(),
            s3_prefix: defaults::s3_prefix(),
        }
    }
}

/// Notification addresses. A missing address disables sending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub sender: Option<String>,

    #[serde(default)]
    pub recipient: Option<String>,

    /// Leading text of every subject line
    #[serde(default = "defaults::subject_prefix")]
    pub subject_prefix: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender: None,
            recipient: None,
            subject_prefix: defaults::subject_prefix(),
        }
    }
}

/// What to do with a suspicious listing drop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
    /// Log and continue
    #[default]
    Warn,
    /// Abort the run before anything is persisted
    Abort,
}

/// Empty-listing guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub mode: GuardMode,

    /// Maximum allowed drop percentage (0-100)
    #[serde(default = "defaults::max_drop_percent")]
    pub max_drop_percent: u8,

    /// Below this previous count the check is skipped
    #[serde(default = "defaults::min_baseline")]
    pub min_baseline: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            mode: GuardMode::default(),
            max_drop_percent: defaults::max_drop_percent(),
            min_baseline: defaults::min_baseline(),
        }
    }
}

mod defaults {
    use crate::models::Category;

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; listwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Category defaults
    pub fn categories() -> Vec<Category> {
        vec![
            Category::new(
                "pre_orders",
                "Pre-Orders",
                "https://www.boardgamesindia.com/pre-orders?fq=1",
            ),
            Category::new(
                "new_arrivals",
                "New Arrivals",
                "https://www.boardgamesindia.com/new-arrivals?fq=1",
            ),
        ]
    }

    // Storage defaults
    pub fn snapshot_key() -> String {
        "current_games".into()
    }
    pub fn local_dir() -> String {
        "storage".into()
    }
    pub fn s3_bucket() -> String {
        "listwatch-snapshots".into()
    }
    pub fn s3_prefix() -> String {
        "listwatch".into()
    }

    // Email defaults
    pub fn subject_prefix() -> String {
        "Board Games".into()
    }

    // Guard defaults
    pub fn max_drop_percent() -> u8 {
        80
    }
    pub fn min_baseline() -> usize {
        5
    }
}
