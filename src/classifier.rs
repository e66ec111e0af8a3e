use serde::{Deserialize, Serialize};

use crate::models::{status, ProbeAttempt};

/// Ranked keyword lists that drive stock classification for one site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockKeywords {
    pub available: Vec<String>,
    pub sold_out: Vec<String>,
}

impl StockKeywords {
    pub fn new<A, S>(available: A, sold_out: S) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            available: available.into_iter().map(Into::into).collect(),
            sold_out: sold_out.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: String,
    pub is_available: bool,
}

/// Decide purchasability from page text and the purchase control's state.
///
/// Sold-out keywords are scanned first so an explicit banner is not shadowed
/// by a stale "add to cart" label. The first available keyword then decides:
/// an enabled control makes the item purchasable regardless of banners,
/// otherwise the keyword is reported as disabled unless the page is already
/// known to be sold out.
pub fn classify(page_text: &str, affordance_enabled: bool, keywords: &StockKeywords) -> Classification {
    let mut status = status::UNKNOWN.to_string();
    let mut is_available = false;

    if keywords.sold_out.iter().any(|k| page_text.contains(k.as_str())) {
        status = status::SOLD_OUT.to_string();
    }

    if let Some(keyword) = keywords.available.iter().find(|k| page_text.contains(k.as_str())) {
        if affordance_enabled {
            status = status::PURCHASABLE.to_string();
            is_available = true;
        } else if status != status::SOLD_OUT {
            status = status::control_disabled(keyword);
        }
    }

    Classification { status, is_available }
}

impl ProbeAttempt {
    pub fn classify(&self, keywords: &StockKeywords) -> Classification {
        classify(&self.page_text, self.affordance_enabled, keywords)
    }
}
