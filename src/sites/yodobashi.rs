use crate::browser::Locator;
use crate::classifier::StockKeywords;
use crate::sites::profile::{css_all, SiteProfile, StatusRule};

pub const SITE_ID: &str = "yodobashi";

pub fn profile() -> SiteProfile {
    let keywords = StockKeywords::new(
        ["カートに入れる", "在庫あり", "在庫あり（在庫僅少）"],
        ["在庫なし", "販売終了", "予定数の販売を終了", "お取り寄せ"],
    );

    SiteProfile {
        status_rule: StatusRule::Exactly(200),
        title: css_all(&["h1"]),
        price: css_all(&[".priceYen", "#js_scl_p", ".productPrice .price"]),
        affordance: vec![
            Locator::text("button", "カートに入れる"),
            Locator::text("a", "カートに入れる"),
        ],
        ..SiteProfile::new(SITE_ID, "ヨドバシカメラ", keywords)
    }
}
