use std::time::Duration;

use stockwatch::browser::{PageSnapshot, SnapshotEngine};
use stockwatch::models::status;
use stockwatch::monitor::RunOptions;
use stockwatch::notifier::WebhookNotifier;
use stockwatch::MonitoredProduct;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

#[tokio::test]
async fn test_dry_run_detects_but_never_posts() {
    let (_server, notifier) = webhook(0).await;
    let engine = SnapshotEngine::new().with_page(EDION_URL, page(EDION_IN_STOCK));

    let mut runner = runner(
        &engine,
        Some(notifier),
        RunOptions {
            dry_run: true,
            ..RunOptions::default()
        },
    );
    let summary = runner.run(&[MonitoredProduct::new("Switch 2", EDION_URL, "edion")]).await;

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.available, 1);
    assert_eq!(summary.notifications_sent, 0);
    assert!(!summary.results[0].notified);
}

#[tokio::test]
async fn test_sold_out_product_is_not_notified() {
    let (_server, notifier) = webhook(0).await;
    let engine = SnapshotEngine::new().with_page(EDION_URL, page(EDION_SOLD_OUT));

    let mut runner = runner(&engine, Some(notifier), RunOptions::default());
    let summary = runner.run(&[MonitoredProduct::new("Switch 2", EDION_URL, "edion")]).await;

    assert_eq!(summary.available, 0);
    assert_eq!(summary.results[0].status, status::SOLD_OUT);
    let info = summary.results[0].info.as_ref().unwrap();
    assert_eq!(info.name(), "Nintendo Switch 2");
    assert_eq!(info.price(), "¥49,980");
}

#[tokio::test]
async fn test_biccamera_recovers_from_denials_and_notifies() {
    let (_server, notifier) = webhook(1).await;
    let engine = SnapshotEngine::new().with_sequence(
        BIC_URL,
        vec![
            PageSnapshot::ok("<html><body><h1>Access Denied</h1></body></html>"),
            PageSnapshot::with_status(403, "<html><body>Forbidden</body></html>"),
            page(BIC_IN_STOCK),
        ],
    );

    let mut runner = runner(&engine, Some(notifier), RunOptions::default());
    let summary = runner.run(&[MonitoredProduct::new("PS5 Pro", BIC_URL, "biccamera")]).await;

    assert_eq!(summary.available, 1);
    assert_eq!(summary.notifications_sent, 1);
    assert_eq!(engine.navigations_to(BIC_URL), 3);
    assert_eq!(engine.sessions_opened(), 1);
    assert_eq!(engine.sessions_closed(), 1);
}

#[tokio::test]
async fn test_exhausted_retries_fail_only_that_product() {
    let (_server, notifier) = webhook(1).await;
    let engine = SnapshotEngine::new()
        .with_page(BIC_URL, page("<html><body>アクセスが拒否されました</body></html>"))
        .with_page(EDION_URL, page(EDION_IN_STOCK));

    let mut runner = runner(&engine, Some(notifier), RunOptions::default());
    let summary = runner
        .run(&[
            MonitoredProduct::new("PS5 Pro", BIC_URL, "biccamera"),
            MonitoredProduct::new("Switch 2", EDION_URL, "edion"),
        ])
        .await;

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.results[0].status, status::PROBE_FAILED);
    assert!(!summary.results[0].available);
    assert_eq!(summary.results[1].status, status::PURCHASABLE);
    assert_eq!(engine.navigations_to(BIC_URL), 3);
}

#[tokio::test]
async fn test_unsupported_site_is_recorded_and_skipped() {
    let engine = SnapshotEngine::new().with_page(EDION_URL, page(EDION_SOLD_OUT));

    let mut runner = runner(&engine, None, RunOptions::default());
    let summary = runner
        .run(&[
            MonitoredProduct::new("Mystery", "https://shop.example/item", "unknown-site"),
            MonitoredProduct::new("Switch 2", EDION_URL, "edion"),
        ])
        .await;

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.results[0].status, status::UNSUPPORTED_SITE);
    assert!(!summary.results[0].available);
    assert_eq!(summary.results[1].status, status::SOLD_OUT);
}

#[tokio::test]
async fn test_failed_delivery_keeps_detection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let notifier = WebhookNotifier::new(server.uri(), Duration::from_secs(10)).unwrap();
    let engine = SnapshotEngine::new().with_page(AMAZON_URL, page(AMAZON_IN_STOCK));

    let mut runner = runner(&engine, Some(notifier), RunOptions::default());
    let summary = runner.run(&[MonitoredProduct::new("Console", AMAZON_URL, "amazon")]).await;

    assert_eq!(summary.available, 1);
    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(summary.results[0].status, status::PURCHASABLE);
}

#[tokio::test]
async fn test_navigation_timeout_is_contained() {
    let engine = SnapshotEngine::new()
        .with_page(YODO_URL, page(YODO_BACKORDER).with_latency(Duration::from_secs(3600)))
        .with_page(EDION_URL, page(EDION_SOLD_OUT));

    let mut runner = runner(&engine, None, RunOptions::default());
    let summary = runner
        .run(&[
            MonitoredProduct::new("Headphones", YODO_URL, "yodobashi"),
            MonitoredProduct::new("Switch 2", EDION_URL, "edion"),
        ])
        .await;

    assert_eq!(summary.failed, 1);
    assert!(summary.results[0].error.as_deref().unwrap().contains("timed out"));
    assert_eq!(summary.results[1].status, status::SOLD_OUT);
    assert_eq!(engine.sessions_closed(), 2);
}
