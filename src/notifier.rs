use std::time::Duration;

use chrono::Local;
use reqwest::Client;
use serde_json::json;
use tracing::{error, info};

use crate::config::NotificationsConfig;
use crate::models::ProductInfo;
use crate::utils::error::NotifyError;

const EMBED_COLOR: u32 = 0x00ff00;
const ALERT_CONTENT: &str = "⚠️ **Buy it now!** ⚠️";

/// Posts stock alerts to a Discord-compatible webhook.
///
/// One POST per call with a bounded timeout. Failures are logged and
/// reported as `false`; nothing is retried here.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
    username: Option<String>,
    mention: Option<String>,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            username: None,
            mention: None,
        })
    }

    /// `None` when no webhook is configured.
    pub fn from_config(config: &NotificationsConfig) -> Result<Option<Self>, NotifyError> {
        let Some(webhook_url) = config.webhook_url.as_deref() else {
            return Ok(None);
        };

        let mut notifier = Self::new(webhook_url, Duration::from_secs(config.timeout_secs))?;
        notifier.username = config.username.clone();
        notifier.mention = config.mention.clone();
        Ok(Some(notifier))
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_mention(mut self, mention: impl Into<String>) -> Self {
        self.mention = Some(mention.into());
        self
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    fn create_embed(&self, info: &ProductInfo, site_name: &str) -> serde_json::Value {
        json!({
            "title": "🎉 Back in stock! Purchasable now!",
            "description": format!("**{}**", info.name()),
            "color": EMBED_COLOR,
            "url": info.url(),
            "fields": [
                { "name": "💰 Price", "value": info.price(), "inline": true },
                { "name": "📦 Status", "value": info.status(), "inline": true },
                { "name": "🏪 Store", "value": site_name, "inline": true },
                { "name": "🔗 Link", "value": info.url(), "inline": false },
            ],
            "footer": {
                "text": format!("Detected at {}", info.checked_at().with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")),
            },
            "timestamp": info.checked_at().to_rfc3339(),
        })
    }

    fn create_payload(&self, info: &ProductInfo, site_name: &str) -> serde_json::Value {
        let content = match &self.mention {
            Some(mention) => format!("{} {}", mention, ALERT_CONTENT),
            None => ALERT_CONTENT.to_string(),
        };

        let mut payload = json!({
            "content": content,
            "embeds": [self.create_embed(info, site_name)],
        });

        if let Some(username) = &self.username {
            payload["username"] = json!(username);
        }

        payload
    }

    pub async fn try_notify(&self, info: &ProductInfo, site_name: &str) -> Result<(), NotifyError> {
        let payload = self.create_payload(info, site_name);
        let response = self.client.post(&self.webhook_url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }

    pub async fn notify(&self, info: &ProductInfo, site_name: &str) -> bool {
        match self.try_notify(info, site_name).await {
            Ok(()) => {
                info!("Notification sent for '{}'", info.name());
                true
            }
            Err(e) => {
                error!("Failed to send notification for '{}': {}", info.name(), e);
                false
            }
        }
    }

    /// Send a sample alert so the webhook can be checked without a detection.
    pub async fn notify_test(&self, url: &str, site_name: &str) -> bool {
        let sample = ProductInfo::new("Test product", "¥9,999", "test notification", url);
        self.notify(&sample, site_name).await
    }
}
