use std::env;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::MonitoredProduct;
use crate::retry::Backoff;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub products: Vec<MonitoredProduct>,
    pub browser: BrowserConfig,
    pub retry: RetryConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub chrome_path: Option<String>,
    pub user_agent: String,
    pub fallback_user_agent: String,
    pub locale: String,
    pub navigation_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub ready_timeout_secs: u64,
    pub window_width: u32,
    pub window_height: u32,
    pub idle_timeout_secs: u64,
    /// Re-probe on the fallback engine when the default one is denied.
    pub fallback_on_denial: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            fallback_user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15".to_string(),
            locale: "ja-JP".to_string(),
            navigation_timeout_secs: 60,
            settle_delay_ms: 3000,
            ready_timeout_secs: 10,
            window_width: 1366,
            window_height: 768,
            idle_timeout_secs: 300,
            fallback_on_denial: false,
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5,
            backoff: Backoff::Fixed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
    pub username: Option<String>,
    /// Message content placed above the embed, e.g. a role mention.
    pub mention: Option<String>,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
            username: None,
            mention: None,
        }
    }
}

impl AppConfig {
    /// Layered load: `config/default.*`, then `path`, then `STOCKWATCH__*`
    /// environment variables, then the well-known overrides
    /// `DISCORD_WEBHOOK_URL` and `CHROME_PATH`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::from(path).required(required))
            .add_source(Environment::with_prefix("STOCKWATCH").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if let Ok(webhook_url) = env::var("DISCORD_WEBHOOK_URL") {
            if !webhook_url.trim().is_empty() {
                config.notifications.webhook_url = Some(webhook_url);
            }
        }

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a single file with no environment layering.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn enabled_products(&self) -> impl Iterator<Item = &MonitoredProduct> {
        self.products.iter().filter(|p| p.enabled)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate browser configuration
        if self.browser.navigation_timeout_secs == 0 {
            return Err(ConfigError::Message("browser.navigation_timeout_secs must be greater than 0".into()));
        }

        if self.browser.ready_timeout_secs == 0 {
            return Err(ConfigError::Message("browser.ready_timeout_secs must be greater than 0".into()));
        }

        if self.browser.user_agent.trim().is_empty() || self.browser.fallback_user_agent.trim().is_empty() {
            return Err(ConfigError::Message("browser user agents must not be empty".into()));
        }

        // Validate retry configuration
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Message("retry.max_attempts must be greater than 0".into()));
        }

        // Validate notification configuration
        if self.notifications.timeout_secs == 0 {
            return Err(ConfigError::Message("notifications.timeout_secs must be greater than 0".into()));
        }

        if let Some(webhook_url) = &self.notifications.webhook_url {
            match Url::parse(webhook_url) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                _ => {
                    return Err(ConfigError::Message("Invalid webhook URL format".into()));
                }
            }
        }

        // Validate product list
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(ConfigError::Message("Product name must not be empty".into()));
            }
            if product.site.trim().is_empty() {
                return Err(ConfigError::Message(format!("Product '{}' has no site", product.name)));
            }
            if Url::parse(&product.url).is_err() {
                return Err(ConfigError::Message(format!(
                    "Invalid URL for product '{}': {}",
                    product.name, product.url
                )));
            }
        }

        Ok(())
    }
}
