// Shared fixtures for end-to-end monitoring passes.
// Pages are served by the snapshot engine, so no browser is needed.

pub mod monitor_pass_tests;
pub mod site_fixture_tests;

use std::sync::Arc;
use std::time::Duration;

use stockwatch::browser::{PageSnapshot, SnapshotEngine, SnapshotLauncher};
use stockwatch::monitor::{MonitorRunner, RunOptions};
use stockwatch::notifier::WebhookNotifier;
use stockwatch::retry::RetryPolicy;
use stockwatch::sites::{HandlerRegistry, ProbeTimings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EDION_URL: &str = "https://www.edion.com/detail.html?p_cd=00084797278";
pub const BIC_URL: &str = "https://www.biccamera.com/bc/item/13416786/";
pub const YODO_URL: &str = "https://www.yodobashi.com/product/100000001008885455/";
pub const AMAZON_URL: &str = "https://www.amazon.co.jp/dp/B0DZZZZZZZ";

pub const EDION_IN_STOCK: &str = r#"
<html><body>
  <h1>Nintendo Switch 2</h1>
  <div class="price">¥49,980</div>
  <button class="cart">カートに入れる</button>
</body></html>"#;

pub const EDION_SOLD_OUT: &str = r#"
<html><body>
  <h1>Nintendo Switch 2</h1>
  <div class="price">¥49,980</div>
  <p>売り切れ</p>
  <button class="cart" disabled>カートに入れる</button>
</body></html>"#;

pub const BIC_IN_STOCK: &str = r#"
<html><body>
  <div class="bcs_title">PlayStation 5 Pro</div>
  <div class="bcs_price"><span class="val">¥119,980</span></div>
  <div class="bcs_cart_btn"><button class="btn">カートに入れる</button></div>
</body></html>"#;

pub const YODO_BACKORDER: &str = r#"
<html><body>
  <h1>Wireless Headphones</h1>
  <span class="priceYen">¥39,600</span>
  <p>お取り寄せ</p>
</body></html>"#;

pub const AMAZON_IN_STOCK: &str = r#"
<html><body>
  <span id="productTitle">Portable Console</span>
  <div id="corePriceDisplay_desktop_feature_div">
    <span class="a-price"><span class="a-offscreen">￥34,980</span></span>
  </div>
  <p>在庫あり。</p>
  <input id="add-to-cart-button" type="submit" value="カートに入れる">
</body></html>"#;

/// Built-in handlers with no waits, so passes run instantly.
pub fn fast_registry() -> HandlerRegistry {
    let timings = ProbeTimings {
        navigation_timeout: Duration::from_millis(500),
        settle_delay: Duration::ZERO,
        ready_timeout: Duration::from_millis(10),
    };
    HandlerRegistry::builtin(timings, RetryPolicy::new(3, Duration::from_millis(1)))
}

pub fn runner(engine: &SnapshotEngine, notifier: Option<WebhookNotifier>, options: RunOptions) -> MonitorRunner {
    MonitorRunner::new(fast_registry(), Arc::new(SnapshotLauncher::new(engine.clone())))
        .with_notifier(notifier)
        .with_options(options)
}

pub fn page(html: &str) -> PageSnapshot {
    PageSnapshot::ok(html)
}

/// Webhook endpoint that must receive exactly `calls` POSTs.
pub async fn webhook(calls: u64) -> (MockServer, WebhookNotifier) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(calls)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(
        format!("{}/api/webhooks/1/token", server.uri()),
        Duration::from_secs(10),
    )
    .expect("notifier");
    (server, notifier)
}
