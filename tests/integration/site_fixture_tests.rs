use std::io::Write;

use stockwatch::browser::SnapshotEngine;
use stockwatch::config::AppConfig;
use stockwatch::monitor::RunOptions;
use stockwatch::models::{status, EXTRACTION_FAILED};

use super::*;

#[tokio::test]
async fn test_products_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r#"
products:
  - name: "Switch 2"
    url: "{edion}"
    site: edion
  - name: "Headphones"
    url: "{yodo}"
    site: yodobashi
  - name: "Paused"
    url: "{amazon}"
    site: amazon
    enabled: false
"#,
        edion = EDION_URL,
        yodo = YODO_URL,
        amazon = AMAZON_URL
    )
    .unwrap();

    let config = AppConfig::load_file(file.path()).unwrap();
    let engine = SnapshotEngine::new()
        .with_page(EDION_URL, page(EDION_SOLD_OUT))
        .with_page(YODO_URL, page(YODO_BACKORDER))
        .with_page(AMAZON_URL, page(AMAZON_IN_STOCK));

    let mut runner = runner(&engine, None, RunOptions::default());
    let summary = runner.run(&config.products).await;

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.available, 0);
    assert_eq!(engine.navigations_to(AMAZON_URL), 0);
}

#[tokio::test]
async fn test_unrecognised_layout_yields_sentinels_and_unknown() {
    let engine = SnapshotEngine::new().with_page(
        AMAZON_URL,
        page("<html><body><div>Something completely different</div></body></html>"),
    );

    let mut runner = runner(&engine, None, RunOptions::default());
    let summary = runner
        .run(&[stockwatch::MonitoredProduct::new("Console", AMAZON_URL, "amazon")])
        .await;

    let info = summary.results[0].info.as_ref().unwrap();
    assert_eq!(info.name(), EXTRACTION_FAILED);
    assert_eq!(info.price(), EXTRACTION_FAILED);
    assert_eq!(info.status(), status::UNKNOWN);
    assert!(!info.is_available());
}

#[tokio::test]
async fn test_enabled_control_overrides_sold_out_copy() {
    let html = r#"
        <html><body>
          <h1>Console</h1>
          <p>関連商品: 売り切れ</p>
          <button>カートに入れる</button>
        </body></html>"#;
    let engine = SnapshotEngine::new().with_page(EDION_URL, page(html));

    let mut runner = runner(&engine, None, RunOptions::default());
    let summary = runner
        .run(&[stockwatch::MonitoredProduct::new("Console", EDION_URL, "edion")])
        .await;

    assert_eq!(summary.results[0].status, status::PURCHASABLE);
    assert!(summary.results[0].available);
}
