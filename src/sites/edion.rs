use crate::browser::Locator;
use crate::classifier::StockKeywords;
use crate::sites::profile::{css_all, SiteProfile, StatusRule};

pub const SITE_ID: &str = "edion";

pub fn profile() -> SiteProfile {
    let keywords = StockKeywords::new(
        ["カートに入れる", "予約する", "在庫あり", "予約受付中"],
        ["売り切れ", "在庫なし", "販売終了", "予約終了"],
    );

    SiteProfile {
        status_rule: StatusRule::Lenient,
        ready_selector: Some("h1".to_string()),
        title: css_all(&["h1"]),
        price: css_all(&[".price", ".item-price", ".selling-price"]),
        affordance: vec![Locator::text("button", "カート"), Locator::text("button", "予約")],
        // Only the disabled attribute matters here.
        affordance_must_be_visible: false,
        ..SiteProfile::new(SITE_ID, "エディオン", keywords)
    }
}
