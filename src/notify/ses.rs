//! Amazon SES email transport.

use async_trait::async_trait;
use aws_sdk_sesv2::Client;
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

use crate::error::{AppError, Result};
use crate::notify::{Email, MailTransport};

/// Sends emails through the SES v2 API.
#[derive(Clone)]
pub struct SesTransport {
    client: Client,
}

impl SesTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a transport from the ambient AWS environment.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    fn utf8(data: &str) -> Result<Content> {
        Content::builder()
            .data(data)
            .charset("UTF-8")
            .build()
            .map_err(AppError::notification)
    }
}

#[async_trait]
impl MailTransport for SesTransport {
    async fn send(&self, email: &Email) -> Result<()> {
        let message = Message::builder()
            .subject(Self::utf8(&email.subject)?)
            .body(Body::builder().html(Self::utf8(&email.html_body)?).build())
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&email.sender)
            .destination(Destination::builder().to_addresses(&email.recipient).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| AppError::notification(DisplayErrorContext(e)))?;

        log::info!(
            "SES accepted message {}",
            output.message_id().unwrap_or("<no id>")
        );
        Ok(())
    }
}
