use serde::{Deserialize, Serialize};

use crate::models::{status, MonitoredProduct, ProductInfo};

/// Evidence gathered from a loaded page, the classifier's only input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub page_text: String,
    pub affordance_enabled: bool,
}

/// Per-product record of one monitoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub product: MonitoredProduct,
    pub status: String,
    pub available: bool,
    pub info: Option<ProductInfo>,
    pub error: Option<String>,
    pub notified: bool,
}

impl CheckResult {
    pub fn probed(product: MonitoredProduct, info: ProductInfo) -> Self {
        Self {
            status: info.status().to_string(),
            available: info.is_available(),
            product,
            info: Some(info),
            error: None,
            notified: false,
        }
    }

    pub fn failed(product: MonitoredProduct, error: impl ToString) -> Self {
        Self {
            product,
            status: status::PROBE_FAILED.to_string(),
            available: false,
            info: None,
            error: Some(error.to_string()),
            notified: false,
        }
    }

    pub fn unsupported(product: MonitoredProduct) -> Self {
        let error = format!("no handler registered for site '{}'", product.site);
        Self {
            product,
            status: status::UNSUPPORTED_SITE.to_string(),
            available: false,
            info: None,
            error: Some(error),
            notified: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub checked: usize,
    pub available: usize,
    pub failed: usize,
    pub notifications_sent: usize,
    pub results: Vec<CheckResult>,
}

impl RunSummary {
    pub fn record(&mut self, result: CheckResult) {
        self.checked += 1;
        if result.available {
            self.available += 1;
        }
        if result.info.is_none() {
            self.failed += 1;
        }
        if result.notified {
            self.notifications_sent += 1;
        }
        self.results.push(result);
    }
}
