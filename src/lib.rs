pub mod browser;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod retry;
pub mod sites;
pub mod utils;

// Re-export commonly used types
pub use classifier::{classify, Classification, StockKeywords};
pub use config::AppConfig;
pub use models::{CheckResult, MonitoredProduct, ProductInfo, RunSummary};
pub use monitor::{MonitorRunner, RunOptions};
pub use notifier::WebhookNotifier;
pub use retry::RetryPolicy;
pub use sites::{HandlerRegistry, SiteHandler, SiteKind};
pub use utils::error::{AppError, Result};
