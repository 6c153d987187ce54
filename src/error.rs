// src/error.rs

//! Unified error handling for the listing watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A source page could not be retrieved
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Expected markup was not found on a source page
    #[error("Structure error for {url}: '{selector}' not found, the page layout may have changed")]
    Structure { url: String, selector: String },

    /// Loading the previous snapshot failed
    #[error("Snapshot read error: {0}")]
    PersistenceRead(String),

    /// Persisting the new snapshot failed
    #[error("Snapshot write error: {0}")]
    PersistenceWrite(String),

    /// Dispatching a notification failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a source URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a structure error for a missing selector.
    pub fn structure(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::Structure {
            url: url.into(),
            selector: selector.into(),
        }
    }

    /// Create a snapshot read error.
    pub fn persistence_read(message: impl fmt::Display) -> Self {
        Self::PersistenceRead(message.to_string())
    }

    /// Create a snapshot write error.
    pub fn persistence_write(message: impl fmt::Display) -> Self {
        Self::PersistenceWrite(message.to_string())
    }

    /// Create a notification error.
    pub fn notification(message: impl fmt::Display) -> Self {
        Self::Notification(message.to_string())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short, stable label for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::Http(_) => "fetch",
            Self::Structure { .. } => "structure",
            Self::PersistenceRead(_) => "persistence_read",
            Self::PersistenceWrite(_) => "persistence_write",
            Self::Notification(_) => "notification",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Toml(_) | Self::Config(_) => "config",
            Self::Url(_) | Self::Selector { .. } => "config",
            Self::Validation(_) => "validation",
        }
    }
}
