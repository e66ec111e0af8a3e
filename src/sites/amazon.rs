use crate::browser::Locator;
use crate::classifier::StockKeywords;
use crate::sites::profile::{css_all, default_denial_markers, SiteProfile, StatusRule};

pub const SITE_ID: &str = "amazon";

pub fn profile() -> SiteProfile {
    let keywords = StockKeywords::new(
        ["カートに入れる", "通常注文", "在庫あり"],
        ["在庫切れ", "現在在庫切れ", "販売を終了しました", "在庫なし"],
    );

    SiteProfile {
        status_rule: StatusRule::Exactly(200),
        // Robot-check interstitial.
        denial_markers: std::iter::once("To discuss automated access".to_string())
            .chain(default_denial_markers())
            .collect(),
        title: css_all(&["#productTitle"]),
        price: css_all(&[
            "#corePriceDisplay_desktop_feature_div .a-price .a-offscreen",
            "#corePriceDisplay_mobile_feature_div .a-price .a-offscreen",
            ".a-price .a-offscreen",
        ]),
        affordance: vec![Locator::css("#add-to-cart-button")],
        ..SiteProfile::new(SITE_ID, "Amazon", keywords)
    }
}
