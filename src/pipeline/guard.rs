//! Listing drop guard.
//!
//! A listing that suddenly empties or shrinks sharply usually means the
//! page changed under the scraper rather than the shop clearing its
//! shelves. The guard flags such drops; in `abort` mode the run stops
//! before the snapshot is overwritten.

use crate::error::{AppError, Result};
use crate::models::{GuardConfig, GuardMode};

/// Drop guard over per-category entry counts.
#[derive(Debug, Clone, Default)]
pub struct ListingGuard {
    config: GuardConfig,
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardResult {
    /// Count is within the allowed drop
    Safe {
        current_count: usize,
        previous_count: usize,
    },
    /// No previous entries or previous count below baseline
    ColdStart { current_count: usize },
    /// Count dropped by more than the allowed percentage
    Dropped {
        current_count: usize,
        previous_count: usize,
        drop_percent: f64,
    },
    /// Listing came back empty after having entries
    Emptied { previous_count: usize },
}

impl GuardResult {
    pub fn is_suspicious(&self) -> bool {
        matches!(self, Self::Dropped { .. } | Self::Emptied { .. })
    }
}

impl ListingGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Classify the change from `previous_count` to `current_count`.
    pub fn check(&self, current_count: usize, previous_count: usize) -> GuardResult {
        if previous_count == 0 || previous_count < self.config.min_baseline {
            return GuardResult::ColdStart { current_count };
        }

        if current_count == 0 {
            return GuardResult::Emptied { previous_count };
        }

        if current_count < previous_count {
            let drop = previous_count - current_count;
            let drop_percent = (drop as f64 / previous_count as f64) * 100.0;

            if drop_percent > self.config.max_drop_percent as f64 {
                return GuardResult::Dropped {
                    current_count,
                    previous_count,
                    drop_percent,
                };
            }
        }

        GuardResult::Safe {
            current_count,
            previous_count,
        }
    }

    /// Check a category and apply the configured mode.
    ///
    /// Suspicious results are logged; only `abort` mode turns them into
    /// an error.
    pub fn validate(
        &self,
        category: &str,
        current_count: usize,
        previous_count: usize,
    ) -> Result<()> {
        let result = self.check(current_count, previous_count);
        let message = match &result {
            GuardResult::Safe { .. } | GuardResult::ColdStart { .. } => {
                log::debug!("Guard {}: {:?}", category, result);
                return Ok(());
            }
            GuardResult::Dropped {
                current_count,
                previous_count,
                drop_percent,
            } => format!(
                "{}: {} -> {} entries ({:.1}% drop > {}% threshold)",
                category, previous_count, current_count, drop_percent, self.config.max_drop_percent
            ),
            GuardResult::Emptied { previous_count } => format!(
                "{}: listing is empty, previously {} entries",
                category, previous_count
            ),
        };

        match self.config.mode {
            GuardMode::Warn => {
                log::warn!("Suspicious listing drop: {}", message);
                Ok(())
            }
            GuardMode::Abort => {
                log::error!("Suspicious listing drop, aborting: {}", message);
                Err(AppError::validation(format!("Suspicious listing drop: {message}")))
            }
        }
    }
}
