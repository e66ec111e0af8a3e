use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::EngineKind;
use crate::utils::error::{ProbeError, SessionError};

pub mod chrome;
pub mod engine;
pub mod snapshot;

pub use chrome::{ChromeEngine, ChromeLauncher};
pub use engine::EngineSelector;
pub use snapshot::{PageSnapshot, SnapshotEngine, SnapshotLauncher};

/// How a site handler points at an element on the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    Css(String),
    /// First `tag` element whose rendered text contains `text`.
    Text { tag: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "{}", selector),
            Locator::Text { tag, text } => write!(f, "{}:has-text(\"{}\")", tag, text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResponse {
    /// Main document HTTP status, when the engine could observe it.
    pub status: Option<u16>,
    pub final_url: String,
}

/// Observable state of an interactive control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementState {
    pub visible: bool,
    pub disabled: bool,
    #[serde(default)]
    pub class_name: String,
}

/// One isolated browsing session (own cookies and storage) bound to a single tab.
///
/// Every method is a suspension point; nothing here runs concurrently with
/// another probe.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationResponse, ProbeError>;

    /// Block until `selector` matches or `timeout` elapses.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), SessionError>;

    /// Give client-side rendering time to settle.
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn body_text(&self) -> Result<String, SessionError>;

    /// Rendered text of the first element matching `locator`, if any.
    async fn text_of(&self, locator: &Locator) -> Result<Option<String>, SessionError>;

    async fn element_state(&self, locator: &Locator) -> Result<Option<ElementState>, SessionError>;

    async fn close(&self) -> Result<(), SessionError>;
}

/// A running browser able to hand out isolated sessions.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    async fn open_session(&self) -> Result<Box<dyn PageSession>, ProbeError>;

    async fn shutdown(&self);
}

/// Starts engines on demand for the selector.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self, kind: EngineKind) -> Result<Arc<dyn BrowserEngine>, ProbeError>;
}
