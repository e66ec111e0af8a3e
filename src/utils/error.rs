use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Webhook URL is not configured (set DISCORD_WEBHOOK_URL)")]
    MissingWebhook,
}

/// Failures of a single page session operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("session already closed")]
    Closed,

    #[error("invalid selector '{selector}'")]
    Selector { selector: String },
}

/// Reasons a probe yields no `ProductInfo` at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("navigation to {url} returned HTTP {status}")]
    NavigationHttp { url: String, status: u16 },

    #[error("access denied by {url} (marker: {marker})")]
    AccessDenied { url: String, marker: String },

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("browser engine unavailable: {0}")]
    Engine(String),
}

impl ProbeError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Hostile sites alternate benign and blocking responses, so HTTP errors
    /// and denial pages are retried. A browser that cannot start is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProbeError::Engine(_))
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, ProbeError::AccessDenied { .. })
    }
}

/// Field-level extraction problem; handlers substitute sentinel text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not extract {field}: {reason}")]
pub struct ExtractionFailure {
    pub field: &'static str,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("webhook transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned HTTP {0}")]
    Status(u16),
}

pub type Result<T> = std::result::Result<T, AppError>;
