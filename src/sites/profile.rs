use std::time::Duration;

use crate::browser::Locator;
use crate::classifier::StockKeywords;
use crate::utils::error::ProbeError;

/// Which main-document HTTP statuses a site's pages are allowed to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRule {
    /// Never fail on status; a missing status is fine too.
    Lenient,
    /// Fail on any status at or above the bound. A missing status passes.
    FailAtOrAbove(u16),
    /// Require exactly this status. A missing status fails.
    Exactly(u16),
}

impl StatusRule {
    pub fn check(&self, url: &str, status: Option<u16>) -> Result<(), ProbeError> {
        let rejected = match (*self, status) {
            (StatusRule::Lenient, _) => None,
            (StatusRule::FailAtOrAbove(bound), Some(code)) if code >= bound => Some(code),
            (StatusRule::FailAtOrAbove(_), _) => None,
            (StatusRule::Exactly(expected), Some(code)) if code == expected => None,
            (StatusRule::Exactly(_), code) => Some(code.unwrap_or(0)),
        };

        match rejected {
            Some(status) => Err(ProbeError::NavigationHttp {
                url: url.to_string(),
                status,
            }),
            None => Ok(()),
        }
    }
}

/// Pause before each navigation: `base + per_attempt * (attempt - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Warmup {
    pub base: Duration,
    pub per_attempt: Duration,
}

impl Warmup {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base + self.per_attempt * attempt.saturating_sub(1)
    }
}

/// Everything that distinguishes one retail site from another.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub id: String,
    pub display_name: String,
    pub keywords: StockKeywords,
    pub requires_fallback: bool,
    pub status_rule: StatusRule,
    /// Selector awaited (best-effort) after navigation.
    pub ready_selector: Option<String>,
    pub denial_markers: Vec<String>,
    /// Candidate locations in priority order.
    pub title: Vec<Locator>,
    pub price: Vec<Locator>,
    pub affordance: Vec<Locator>,
    /// A hidden purchase control counts as disabled.
    pub affordance_must_be_visible: bool,
    /// Class-name fragments that mark the purchase control as disabled.
    pub disabled_classes: Vec<String>,
    pub title_max_chars: Option<usize>,
    /// Probe under the handler's retry policy instead of a single attempt.
    pub retries: bool,
    pub warmup: Option<Warmup>,
}

impl SiteProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, keywords: StockKeywords) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            keywords,
            requires_fallback: false,
            status_rule: StatusRule::Lenient,
            ready_selector: None,
            denial_markers: default_denial_markers(),
            title: vec![Locator::css("h1")],
            price: Vec::new(),
            affordance: Vec::new(),
            affordance_must_be_visible: true,
            disabled_classes: Vec::new(),
            title_max_chars: None,
            retries: false,
            warmup: None,
        }
    }

    pub fn denial_marker_in(&self, page_text: &str) -> Option<&str> {
        self.denial_markers
            .iter()
            .find(|marker| page_text.contains(marker.as_str()))
            .map(String::as_str)
    }
}

pub fn default_denial_markers() -> Vec<String> {
    vec!["Access Denied".to_string(), "アクセスが拒否".to_string()]
}

pub(crate) fn css_all(selectors: &[&str]) -> Vec<Locator> {
    selectors.iter().map(|s| Locator::css(*s)).collect()
}
