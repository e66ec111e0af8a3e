use serde::{Deserialize, Serialize};

pub mod product;
pub mod check;

// Re-exports for convenience
pub use product::*;
pub use check::*;

/// Canonical status labels produced by the classifier and the runner.
pub mod status {
    pub const PURCHASABLE: &str = "purchasable";
    pub const SOLD_OUT: &str = "sold out";
    pub const UNKNOWN: &str = "unknown";
    pub const UNSUPPORTED_SITE: &str = "unsupported site";
    pub const PROBE_FAILED: &str = "probe failed";

    /// Label for an available keyword whose purchase control is not usable.
    pub fn control_disabled(keyword: &str) -> String {
        format!("{} (control disabled)", keyword)
    }
}

/// Substituted for a field the page would not give up.
pub const EXTRACTION_FAILED: &str = "extraction failed";

/// Which browser engine a site must be probed with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Default,
    Fallback,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Default => write!(f, "default"),
            EngineKind::Fallback => write!(f, "fallback"),
        }
    }
}
