use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::browser::{Locator, PageSession};
use crate::classifier::StockKeywords;
use crate::config::BrowserConfig;
use crate::models::{ProbeAttempt, ProductInfo, EXTRACTION_FAILED};
use crate::retry::RetryPolicy;
use crate::sites::{SiteHandler, SiteProfile};
use crate::utils::error::{ExtractionFailure, ProbeError};

/// Waits applied around every probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimings {
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub ready_timeout: Duration,
}

impl ProbeTimings {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            navigation_timeout: config.navigation_timeout(),
            settle_delay: config.settle_delay(),
            ready_timeout: config.ready_timeout(),
        }
    }
}

impl Default for ProbeTimings {
    fn default() -> Self {
        Self::from_config(&BrowserConfig::default())
    }
}

/// Profile-driven handler shared by every built-in site.
pub struct RetailSiteHandler {
    profile: SiteProfile,
    timings: ProbeTimings,
    retry: Option<RetryPolicy>,
}

impl RetailSiteHandler {
    pub fn new(profile: SiteProfile, timings: ProbeTimings) -> Self {
        Self {
            profile,
            timings,
            retry: None,
        }
    }

    /// Policy used when the profile asks for retries; ignored otherwise.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        if self.profile.retries {
            self.retry = Some(policy);
        }
        self
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    async fn probe_once(&self, session: &dyn PageSession, url: &str, attempt: u32) -> Result<ProductInfo, ProbeError> {
        let profile = &self.profile;

        if let Some(warmup) = profile.warmup {
            session.pause(warmup.delay_for(attempt)).await;
        }

        let response = session.navigate(url, self.timings.navigation_timeout).await?;
        profile.status_rule.check(url, response.status)?;

        if let Some(selector) = &profile.ready_selector {
            if let Err(e) = session.wait_for(selector, self.timings.ready_timeout).await {
                debug!("{}: '{}' not ready, continuing: {}", profile.id, selector, e);
            }
        }

        session.pause(self.timings.settle_delay).await;
        let page_text = session.body_text().await?;

        if let Some(marker) = profile.denial_marker_in(&page_text) {
            return Err(ProbeError::AccessDenied {
                url: url.to_string(),
                marker: marker.to_string(),
            });
        }

        let name = match self.first_text(session, "name", &profile.title).await {
            Ok(name) => match profile.title_max_chars {
                Some(max) => name.chars().take(max).collect(),
                None => name,
            },
            Err(failure) => {
                warn!("{}: {}", profile.id, failure);
                EXTRACTION_FAILED.to_string()
            }
        };

        let price = self
            .first_text(session, "price", &profile.price)
            .await
            .unwrap_or_else(|failure| {
                warn!("{}: {}", profile.id, failure);
                EXTRACTION_FAILED.to_string()
            });

        let attempt = ProbeAttempt {
            affordance_enabled: self.affordance_enabled(session).await,
            page_text,
        };
        let classification = attempt.classify(&profile.keywords);
        debug!(
            "{}: affordance_enabled={} status={}",
            profile.id, attempt.affordance_enabled, classification.status
        );

        Ok(ProductInfo::new(name, price, classification.status, url))
    }

    /// Trimmed text of the first candidate that yields any.
    async fn first_text(
        &self,
        session: &dyn PageSession,
        field: &'static str,
        candidates: &[Locator],
    ) -> Result<String, ExtractionFailure> {
        let mut last_error = None;

        for locator in candidates {
            match session.text_of(locator).await {
                Ok(Some(text)) if !text.trim().is_empty() => return Ok(text.trim().to_string()),
                Ok(_) => {}
                Err(e) => last_error = Some(format!("{}: {}", locator, e)),
            }
        }

        Err(ExtractionFailure {
            field,
            reason: last_error.unwrap_or_else(|| "no candidate matched".to_string()),
        })
    }

    /// Whether the purchase control exists, is visible when required and is
    /// not disabled. Errors resolve to `false`.
    async fn affordance_enabled(&self, session: &dyn PageSession) -> bool {
        let profile = &self.profile;

        for locator in &profile.affordance {
            let state = match session.element_state(locator).await {
                Ok(Some(state)) => state,
                Ok(None) => continue,
                Err(e) => {
                    debug!("{}: affordance check failed on {}: {}", profile.id, locator, e);
                    return false;
                }
            };

            if profile.affordance_must_be_visible && !state.visible {
                return false;
            }
            let disabled_by_class = profile
                .disabled_classes
                .iter()
                .any(|class| state.class_name.contains(class.as_str()));
            return !state.disabled && !disabled_by_class;
        }

        false
    }
}

#[async_trait]
impl SiteHandler for RetailSiteHandler {
    fn site_id(&self) -> &str {
        &self.profile.id
    }

    fn display_name(&self) -> &str {
        &self.profile.display_name
    }

    fn requires_fallback(&self) -> bool {
        self.profile.requires_fallback
    }

    fn keywords(&self) -> &StockKeywords {
        &self.profile.keywords
    }

    async fn probe(&self, session: &dyn PageSession, url: &str) -> Result<ProductInfo, ProbeError> {
        let result = match &self.retry {
            Some(policy) => {
                policy
                    .run(&self.profile.display_name, |attempt| self.probe_once(session, url, attempt))
                    .await
            }
            None => self.probe_once(session, url, 1).await,
        };

        if let Err(e) = &result {
            warn!("{}: probe of {} failed: {}", self.profile.display_name, url, e);
        }
        result
    }
}
