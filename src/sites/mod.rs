use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::browser::{EngineSelector, PageSession};
use crate::classifier::StockKeywords;
use crate::models::{EngineKind, ProductInfo};
use crate::utils::error::ProbeError;

pub mod amazon;
pub mod biccamera;
pub mod edion;
pub mod handler;
pub mod profile;
pub mod registry;
pub mod yodobashi;

pub use handler::{ProbeTimings, RetailSiteHandler};
pub use profile::{SiteProfile, StatusRule, Warmup};
pub use registry::HandlerRegistry;

/// Probing strategy for one retail site.
#[async_trait]
pub trait SiteHandler: Send + Sync {
    /// Identifier used in product configuration, e.g. `edion`.
    fn site_id(&self) -> &str;

    /// Human-readable store name shown in notifications.
    fn display_name(&self) -> &str;

    /// Whether probes must run on the fallback engine.
    fn requires_fallback(&self) -> bool;

    fn keywords(&self) -> &StockKeywords;

    fn engine(&self) -> EngineKind {
        EngineSelector::kind_for(self.requires_fallback())
    }

    /// Load `url` in `session` and report what the page says about stock.
    async fn probe(&self, session: &dyn PageSession, url: &str) -> Result<ProductInfo, ProbeError>;
}

/// Built-in sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    Edion,
    Biccamera,
    Yodobashi,
    Amazon,
}

impl SiteKind {
    pub const ALL: [SiteKind; 4] = [SiteKind::Edion, SiteKind::Biccamera, SiteKind::Yodobashi, SiteKind::Amazon];

    pub fn id(&self) -> &'static str {
        match self {
            SiteKind::Edion => edion::SITE_ID,
            SiteKind::Biccamera => biccamera::SITE_ID,
            SiteKind::Yodobashi => yodobashi::SITE_ID,
            SiteKind::Amazon => amazon::SITE_ID,
        }
    }

    pub fn profile(&self) -> SiteProfile {
        match self {
            SiteKind::Edion => edion::profile(),
            SiteKind::Biccamera => biccamera::profile(),
            SiteKind::Yodobashi => yodobashi::profile(),
            SiteKind::Amazon => amazon::profile(),
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SiteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SiteKind::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| format!("unknown site '{}'", s))
    }
}
