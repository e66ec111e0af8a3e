use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use stockwatch::browser::ChromeLauncher;
use stockwatch::cli::Cli;
use stockwatch::config::AppConfig;
use stockwatch::monitor::{MonitorRunner, RunOptions};
use stockwatch::notifier::WebhookNotifier;
use stockwatch::retry::RetryPolicy;
use stockwatch::sites::{HandlerRegistry, ProbeTimings, SiteKind};
use stockwatch::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_sites {
        for kind in SiteKind::ALL {
            let profile = kind.profile();
            println!(
                "{:<10} {}{}",
                kind.id(),
                profile.display_name,
                if profile.requires_fallback { " (fallback engine)" } else { "" }
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = AppConfig::load(cli.config_path(), cli.config_required())
        .map_err(AppError::from)
        .with_context(|| format!("failed to load configuration from {}", cli.config_path().display()))?;

    let notifier = WebhookNotifier::from_config(&config.notifications).map_err(AppError::from)?;
    if notifier.is_none() && (!cli.dry_run || cli.test_notify) {
        return Err(AppError::MissingWebhook.into());
    }

    if cli.test_notify {
        let notifier = notifier.ok_or(AppError::MissingWebhook)?;
        let site_name = cli
            .site
            .parse::<SiteKind>()
            .map(|kind| kind.profile().display_name)
            .unwrap_or_else(|_| cli.site.clone());
        let url = cli.url.as_deref().unwrap_or("https://www.edion.com/");
        let sent = notifier.notify_test(url, &site_name).await;
        return Ok(if sent { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let products = cli.products(&config);
    if products.iter().all(|p| !p.enabled) {
        warn!("No enabled products to check");
        return Ok(ExitCode::SUCCESS);
    }

    let registry = HandlerRegistry::builtin(
        ProbeTimings::from_config(&config.browser),
        RetryPolicy::from_config(&config.retry),
    );
    let launcher = Arc::new(ChromeLauncher::new(config.browser.clone()));
    let mut runner = MonitorRunner::new(registry, launcher)
        .with_notifier(notifier)
        .with_options(RunOptions {
            dry_run: cli.dry_run,
            fallback_on_denial: config.browser.fallback_on_denial,
        });

    let summary = runner.run(&products).await;

    for result in &summary.results {
        match &result.info {
            Some(info) => info!(
                "{} | {} | {} | {}",
                result.product.name,
                info.price(),
                result.status,
                if result.available { "AVAILABLE" } else { "not available" }
            ),
            None => warn!(
                "{} | {} | {}",
                result.product.name,
                result.status,
                result.error.as_deref().unwrap_or("")
            ),
        }
    }

    if cli.is_single_url() && summary.failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
