use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::status;

/// A product page listed in the monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitoredProduct {
    pub name: String,
    pub url: String,
    pub site: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl MonitoredProduct {
    pub fn new(name: impl Into<String>, url: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            site: site.into(),
            enabled: true,
        }
    }
}

/// Outcome of one successful probe. Built once by a site handler, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "ProductInfoRecord")]
pub struct ProductInfo {
    name: String,
    price: String,
    status: String,
    is_available: bool,
    url: String,
    checked_at: DateTime<Utc>,
}

impl ProductInfo {
    /// `is_available` is derived from `status` so the two can never disagree.
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        status: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let status = status.into();
        Self {
            name: name.into(),
            price: price.into(),
            is_available: status == status::PURCHASABLE,
            status,
            url: url.into(),
            checked_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }
}

/// Serialized form of `ProductInfo`, checked before it becomes one.
#[derive(Deserialize)]
struct ProductInfoRecord {
    name: String,
    price: String,
    status: String,
    is_available: bool,
    url: String,
    checked_at: DateTime<Utc>,
}

impl TryFrom<ProductInfoRecord> for ProductInfo {
    type Error = String;

    fn try_from(record: ProductInfoRecord) -> Result<Self, Self::Error> {
        let expected = record.status == status::PURCHASABLE;
        if record.is_available != expected {
            return Err(format!(
                "is_available={} contradicts status '{}'",
                record.is_available, record.status
            ));
        }
        Ok(Self {
            name: record.name,
            price: record.price,
            status: record.status,
            is_available: expected,
            url: record.url,
            checked_at: record.checked_at,
        })
    }
}
