use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::AppConfig;
use crate::models::MonitoredProduct;

pub const DEFAULT_CONFIG_PATH: &str = "monitor.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "stockwatch",
    about = "Watch retail product pages and alert a webhook when items come back in stock",
    version
)]
pub struct Cli {
    /// Configuration file (YAML or TOML). Defaults to monitor.yaml.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Check a single product page instead of the configured list.
    #[arg(long)]
    pub url: Option<String>,

    /// Site handler for --url.
    #[arg(long, default_value = "edion")]
    pub site: String,

    /// Classify but never post notifications.
    #[arg(long)]
    pub dry_run: bool,

    /// Send a sample alert to the webhook and exit.
    #[arg(long)]
    pub test_notify: bool,

    /// Print the supported sites and exit.
    #[arg(long)]
    pub list_sites: bool,

    /// Debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn config_path(&self) -> &Path {
        self.config.as_deref().unwrap_or(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// An explicitly named config file must exist.
    pub fn config_required(&self) -> bool {
        self.config.is_some()
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "stockwatch=debug"
        } else {
            "stockwatch=info"
        }
    }

    /// Products for this pass: the single `--url` if given, else the config list.
    pub fn products(&self, config: &AppConfig) -> Vec<MonitoredProduct> {
        match &self.url {
            Some(url) => vec![MonitoredProduct::new(url.clone(), url.clone(), self.site.clone())],
            None => config.products.clone(),
        }
    }

    pub fn is_single_url(&self) -> bool {
        self.url.is_some()
    }
}
