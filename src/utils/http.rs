// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &FetcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body, treating any non-success status as a fetch error.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::fetch(url, e))?;

    let status = response.status();
    log::debug!("GET {} -> {}", url, status);
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("HTTP status {status}")));
    }

    response.text().await.map_err(|e| AppError::fetch(url, e))
}
