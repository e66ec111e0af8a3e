use std::sync::Arc;

use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::browser::{EngineLauncher, EngineSelector};
use crate::models::{CheckResult, EngineKind, MonitoredProduct, ProductInfo, RunSummary};
use crate::notifier::WebhookNotifier;
use crate::sites::{HandlerRegistry, SiteHandler};
use crate::utils::error::ProbeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Classify as usual but never post notifications.
    pub dry_run: bool,
    /// Re-probe once on the fallback engine when the default engine is denied.
    pub fallback_on_denial: bool,
}

/// Runs monitoring passes over a product list, one product at a time.
pub struct MonitorRunner {
    registry: HandlerRegistry,
    engines: EngineSelector,
    notifier: Option<WebhookNotifier>,
    options: RunOptions,
}

impl MonitorRunner {
    pub fn new(registry: HandlerRegistry, launcher: Arc<dyn EngineLauncher>) -> Self {
        Self {
            registry,
            engines: EngineSelector::new(launcher),
            notifier: None,
            options: RunOptions::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Option<WebhookNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// One pass over the enabled entries of `products`, in order.
    ///
    /// Per-product failures are recorded and the pass continues. Browser
    /// engines started during the pass are shut down before returning.
    pub async fn run(&mut self, products: &[MonitoredProduct]) -> RunSummary {
        let run_id = Uuid::new_v4();
        let span = info_span!("monitor_run", %run_id);

        async {
            let enabled: Vec<&MonitoredProduct> = products.iter().filter(|p| p.enabled).collect();
            info!(
                "Starting monitoring pass over {} product(s){}",
                enabled.len(),
                if self.options.dry_run { " (dry run)" } else { "" }
            );

            let mut summary = RunSummary::default();
            for product in enabled {
                let span = info_span!("product", name = %product.name, site = %product.site);
                let result = self.check_product(product).instrument(span).await;
                summary.record(result);
            }

            self.engines.shutdown().await;
            info!(
                "Pass complete: checked={} available={} failed={} notified={}",
                summary.checked, summary.available, summary.failed, summary.notifications_sent
            );
            summary
        }
        .instrument(span)
        .await
    }

    async fn check_product(&mut self, product: &MonitoredProduct) -> CheckResult {
        let Some(handler) = self.registry.get(&product.site) else {
            warn!("No handler registered for site '{}', skipping", product.site);
            return CheckResult::unsupported(product.clone());
        };

        let kind = handler.engine();
        let mut outcome = self.probe_on(handler.as_ref(), kind, &product.url).await;

        if self.options.fallback_on_denial && kind == EngineKind::Default {
            if let Err(e) = &outcome {
                if e.is_access_denied() {
                    info!("Denied on the default engine, trying the fallback engine");
                    outcome = self.probe_on(handler.as_ref(), EngineKind::Fallback, &product.url).await;
                }
            }
        }

        match outcome {
            Ok(info) => {
                info!(
                    "name={} price={} status={} available={}",
                    info.name(),
                    info.price(),
                    info.status(),
                    info.is_available()
                );
                let notified = self.dispatch(&info, handler.display_name()).await;
                let mut result = CheckResult::probed(product.clone(), info);
                result.notified = notified;
                result
            }
            Err(e) => {
                error!("Probe failed: {}", e);
                CheckResult::failed(product.clone(), e)
            }
        }
    }

    /// Open an isolated session on `kind`, probe, and always close the session.
    async fn probe_on(&mut self, handler: &dyn SiteHandler, kind: EngineKind, url: &str) -> Result<ProductInfo, ProbeError> {
        let engine = self.engines.engine(kind).await?;
        let session = engine.open_session().await?;

        let result = handler.probe(session.as_ref(), url).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browsing session: {}", e);
        }
        result
    }

    async fn dispatch(&self, info: &ProductInfo, site_name: &str) -> bool {
        if !info.is_available() {
            return false;
        }
        info!("★ In stock: {}", info.name());

        if self.options.dry_run {
            info!("Dry run, notification suppressed");
            return false;
        }

        match &self.notifier {
            Some(notifier) => notifier.notify(info, site_name).await,
            None => {
                warn!("No webhook configured, availability not notified");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::browser::{PageSession, PageSnapshot, SnapshotEngine, SnapshotLauncher};
    use crate::classifier::StockKeywords;
    use crate::models::status;

    const URL: &str = "https://site/x";

    /// Handler that loads the page and reports a fixed status.
    struct FixedHandler {
        id: &'static str,
        status: &'static str,
        fallback: bool,
        keywords: StockKeywords,
    }

    impl FixedHandler {
        fn new(id: &'static str, status: &'static str) -> Self {
            Self {
                id,
                status,
                fallback: false,
                keywords: StockKeywords::new(["in stock"], ["sold out"]),
            }
        }
    }

    #[async_trait]
    impl SiteHandler for FixedHandler {
        fn site_id(&self) -> &str {
            self.id
        }

        fn display_name(&self) -> &str {
            "Known Store"
        }

        fn requires_fallback(&self) -> bool {
            self.fallback
        }

        fn keywords(&self) -> &StockKeywords {
            &self.keywords
        }

        async fn probe(&self, session: &dyn PageSession, url: &str) -> Result<ProductInfo, ProbeError> {
            session.navigate(url, Duration::from_secs(1)).await?;
            let text = session.body_text().await?;
            if text.contains("Access Denied") {
                return Err(ProbeError::AccessDenied {
                    url: url.to_string(),
                    marker: "Access Denied".to_string(),
                });
            }
            Ok(ProductInfo::new("A", "¥1,000", self.status, url))
        }
    }

    fn registry_with(handler: FixedHandler) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(handler));
        registry
    }

    fn page_engine() -> SnapshotEngine {
        SnapshotEngine::new().with_page(URL, PageSnapshot::ok("<body>in stock</body>"))
    }

    async fn webhook_expecting(calls: u64) -> (MockServer, WebhookNotifier) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(calls)
            .mount(&server)
            .await;
        let notifier = WebhookNotifier::new(server.uri(), Duration::from_secs(10)).unwrap();
        (server, notifier)
    }

    #[tokio::test]
    async fn test_available_product_notifies_once() {
        let (_server, notifier) = webhook_expecting(1).await;
        let engine = page_engine();
        let mut runner = MonitorRunner::new(
            registry_with(FixedHandler::new("known", status::PURCHASABLE)),
            Arc::new(SnapshotLauncher::new(engine.clone())),
        )
        .with_notifier(Some(notifier));

        let summary = runner.run(&[MonitoredProduct::new("A", URL, "known")]).await;

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.available, 1);
        assert_eq!(summary.notifications_sent, 1);
        assert!(summary.results[0].notified);
        assert_eq!(summary.results[0].status, status::PURCHASABLE);
    }

    #[tokio::test]
    async fn test_dry_run_classifies_without_posting() {
        let (_server, notifier) = webhook_expecting(0).await;
        let mut runner = MonitorRunner::new(
            registry_with(FixedHandler::new("known", status::PURCHASABLE)),
            Arc::new(SnapshotLauncher::new(page_engine())),
        )
        .with_notifier(Some(notifier))
        .with_options(RunOptions {
            dry_run: true,
            ..RunOptions::default()
        });

        let summary = runner.run(&[MonitoredProduct::new("A", URL, "known")]).await;

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.available, 1);
        assert_eq!(summary.notifications_sent, 0);
    }

    #[tokio::test]
    async fn test_unsupported_site_does_not_abort_run() {
        let (_server, notifier) = webhook_expecting(1).await;
        let engine = page_engine();
        let mut runner = MonitorRunner::new(
            registry_with(FixedHandler::new("known", status::PURCHASABLE)),
            Arc::new(SnapshotLauncher::new(engine.clone())),
        )
        .with_notifier(Some(notifier));

        let summary = runner
            .run(&[
                MonitoredProduct::new("Mystery", "https://elsewhere/y", "unknown-site"),
                MonitoredProduct::new("A", URL, "known"),
            ])
            .await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.results[0].status, status::UNSUPPORTED_SITE);
        assert!(!summary.results[0].available);
        assert!(summary.results[0].info.is_none());
        assert_eq!(summary.results[1].status, status::PURCHASABLE);
        assert_eq!(engine.sessions_opened(), 1);
    }

    #[tokio::test]
    async fn test_disabled_products_are_skipped() {
        let engine = page_engine();
        let mut runner = MonitorRunner::new(
            registry_with(FixedHandler::new("known", status::SOLD_OUT)),
            Arc::new(SnapshotLauncher::new(engine.clone())),
        );

        let mut disabled = MonitoredProduct::new("Off", URL, "known");
        disabled.enabled = false;
        let summary = runner.run(&[disabled, MonitoredProduct::new("On", URL, "known")]).await;

        assert_eq!(summary.checked, 1);
        assert_eq!(summary.results[0].product.name, "On");
        assert_eq!(summary.available, 0);
        assert_eq!(engine.navigations_to(URL), 1);
    }

    #[tokio::test]
    async fn test_failed_probe_is_contained_and_sessions_released() {
        let engine = SnapshotEngine::new()
            .with_page(URL, PageSnapshot::ok("<body>Access Denied</body>"))
            .with_page("https://site/z", PageSnapshot::ok("<body>in stock</body>"));
        let mut runner = MonitorRunner::new(
            registry_with(FixedHandler::new("known", status::SOLD_OUT)),
            Arc::new(SnapshotLauncher::new(engine.clone())),
        );

        let summary = runner
            .run(&[
                MonitoredProduct::new("Blocked", URL, "known"),
                MonitoredProduct::new("Fine", "https://site/z", "known"),
            ])
            .await;

        assert_eq!(summary.checked, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.results[0].status, status::PROBE_FAILED);
        assert!(summary.results[0].error.as_deref().unwrap().contains("Access Denied"));
        assert_eq!(summary.results[1].status, status::SOLD_OUT);
        assert_eq!(engine.sessions_opened(), 2);
        assert_eq!(engine.sessions_closed(), 2);
    }

    #[tokio::test]
    async fn test_engines_started_lazily_and_shut_down_once() {
        let default = page_engine();
        let fallback = SnapshotEngine::new().with_page(URL, PageSnapshot::ok("<body>in stock</body>"));
        let mut registry = registry_with(FixedHandler::new("known", status::SOLD_OUT));
        registry.register(Arc::new(FixedHandler {
            fallback: true,
            ..FixedHandler::new("guarded", status::SOLD_OUT)
        }));
        let mut runner = MonitorRunner::new(
            registry,
            Arc::new(SnapshotLauncher::with_engines(default.clone(), fallback.clone())),
        );

        runner
            .run(&[
                MonitoredProduct::new("A", URL, "known"),
                MonitoredProduct::new("B", URL, "guarded"),
                MonitoredProduct::new("C", URL, "guarded"),
            ])
            .await;

        assert_eq!(default.launches(), 1);
        assert_eq!(fallback.launches(), 1);
        assert_eq!(default.navigations_to(URL), 1);
        assert_eq!(fallback.navigations_to(URL), 2);
        assert_eq!(default.shutdowns(), 1);
        assert_eq!(fallback.shutdowns(), 1);
    }

    #[tokio::test]
    async fn test_no_engine_started_for_empty_run() {
        let engine = page_engine();
        let mut runner = MonitorRunner::new(HandlerRegistry::new(), Arc::new(SnapshotLauncher::new(engine.clone())));

        let summary = runner.run(&[]).await;

        assert_eq!(summary.checked, 0);
        assert_eq!(engine.launches(), 0);
        assert_eq!(engine.shutdowns(), 0);
    }

    #[tokio::test]
    async fn test_fallback_on_denial_reprobes_on_fallback_engine() {
        let default = SnapshotEngine::new().with_page(URL, PageSnapshot::ok("<body>Access Denied</body>"));
        let fallback = SnapshotEngine::new().with_page(URL, PageSnapshot::ok("<body>in stock</body>"));
        let mut runner = MonitorRunner::new(
            registry_with(FixedHandler::new("known", status::PURCHASABLE)),
            Arc::new(SnapshotLauncher::with_engines(default.clone(), fallback.clone())),
        )
        .with_options(RunOptions {
            dry_run: true,
            fallback_on_denial: true,
        });

        let summary = runner.run(&[MonitoredProduct::new("A", URL, "known")]).await;

        assert_eq!(summary.available, 1);
        assert_eq!(default.navigations_to(URL), 1);
        assert_eq!(fallback.navigations_to(URL), 1);
        assert_eq!(default.sessions_closed(), 1);
        assert_eq!(fallback.sessions_closed(), 1);
    }
}
