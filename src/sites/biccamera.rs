//! Biccamera blocks the default engine's fingerprint and alternates
//! between normal and hostile responses, so probes go through the fallback
//! engine with retries and a growing warm-up pause.

use std::time::Duration;

use crate::browser::Locator;
use crate::classifier::StockKeywords;
use crate::sites::profile::{css_all, SiteProfile, StatusRule, Warmup};

pub const SITE_ID: &str = "biccamera";

pub fn profile() -> SiteProfile {
    let keywords = StockKeywords::new(
        ["カートに入れる", "予約する", "在庫あり"],
        ["売り切れ", "在庫なし", "販売終了", "販売休止中", "予定数の販売を終了"],
    );

    SiteProfile {
        requires_fallback: true,
        status_rule: StatusRule::FailAtOrAbove(400),
        ready_selector: Some("body".to_string()),
        title: css_all(&[".bcs_title", ".itemDetailHeader h1", "h1"]),
        price: css_all(&[".bcs_price .val", ".price .val", ".itemPrice"]),
        affordance: vec![
            Locator::css(".bcs_cart_btn button"),
            Locator::css(".addtocart"),
            Locator::text("button", "カートに入れる"),
        ],
        disabled_classes: vec!["gray".to_string()],
        title_max_chars: Some(100),
        retries: true,
        warmup: Some(Warmup {
            base: Duration::from_millis(1000),
            per_attempt: Duration::from_millis(500),
        }),
        ..SiteProfile::new(SITE_ID, "ビックカメラ", keywords)
    }
}
