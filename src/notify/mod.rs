//! Change notifications.
//!
//! The notifier turns a diff report into one consolidated email and hands
//! it to a `MailTransport`. Sending is skipped, not failed, when the sender
//! or recipient address is not configured.

pub mod report;
#[cfg(feature = "ses")]
pub mod ses;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::EmailConfig;
use crate::pipeline::DiffReport;

#[cfg(feature = "ses")]
pub use ses::SesTransport;

/// A single HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivery channel for emails.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Transport that only logs the email, for local runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, email: &Email) -> Result<()> {
        log::info!(
            "Email (not sent) from {} to {}: {}",
            email.sender,
            email.recipient,
            email.subject
        );
        log::debug!("Email body:\n{}", email.html_body);
        Ok(())
    }
}

/// What happened to a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The report had no changes
    NoChanges,
    /// Sender or recipient not configured
    Skipped,
    Sent,
}

/// Formats reports and dispatches them through a transport.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    email: EmailConfig,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>, email: EmailConfig) -> Self {
        Self { transport, email }
    }

    /// Send one email covering every category of the report.
    ///
    /// Transport failures are returned as notification errors.
    pub async fn notify(&self, report: &DiffReport) -> Result<NotifyOutcome> {
        if !report.has_changes() {
            log::info!("No changes detected, skipping notification");
            return Ok(NotifyOutcome::NoChanges);
        }

        let prefix = &self.email.subject_prefix;
        let sent = self
            .dispatch(
                report::report_subject(prefix, report),
                report::report_body(prefix, report, Utc::now()),
            )
            .await?;

        Ok(if sent {
            NotifyOutcome::Sent
        } else {
            NotifyOutcome::Skipped
        })
    }

    /// Best-effort failure email. Never returns an error.
    pub async fn notify_error(&self, error: &AppError) {
        let prefix = &self.email.subject_prefix;
        let result = self
            .dispatch(
                report::error_subject(prefix),
                report::error_body(prefix, &error.to_string(), Utc::now()),
            )
            .await;

        if let Err(e) = result {
            log::error!("Failed to send error notification: {}", e);
        }
    }

    /// Returns `Ok(false)` when addresses are missing.
    async fn dispatch(&self, subject: String, html_body: String) -> Result<bool> {
        let (Some(sender), Some(recipient)) = (&self.email.sender, &self.email.recipient) else {
            log::warn!("Email configuration missing (sender/recipient), not sending: {}", subject);
            return Ok(false);
        };

        let email = Email {
            sender: sender.clone(),
            recipient: recipient.clone(),
            subject,
            html_body,
        };

        self.transport.send(&email).await.map_err(|e| match e {
            AppError::Notification(_) => e,
            other => AppError::notification(other),
        })?;

        log::info!("Email sent to {}: {}", email.recipient, email.subject);
        Ok(true)
    }
}
