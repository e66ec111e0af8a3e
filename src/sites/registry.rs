use std::collections::HashMap;
use std::sync::Arc;

use crate::retry::RetryPolicy;
use crate::sites::{ProbeTimings, RetailSiteHandler, SiteHandler, SiteKind};

pub type SiteHandlerRef = Arc<dyn SiteHandler>;

/// Site handlers keyed by site identifier.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, SiteHandlerRef>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in site, sharing the same timings and retry policy.
    pub fn builtin(timings: ProbeTimings, retry: RetryPolicy) -> Self {
        let mut registry = Self::new();
        for kind in SiteKind::ALL {
            registry.register(Arc::new(
                RetailSiteHandler::new(kind.profile(), timings).with_retry(retry.clone()),
            ));
        }
        registry
    }

    /// Register a handler, replacing any previous one for the same site.
    pub fn register(&mut self, handler: SiteHandlerRef) -> Option<SiteHandlerRef> {
        let site_id = handler.site_id().to_string();
        let previous = self.handlers.insert(site_id.clone(), handler);
        if previous.is_some() {
            tracing::debug!("Replaced handler for site '{}'", site_id);
        }
        previous
    }

    pub fn get(&self, site_id: &str) -> Option<SiteHandlerRef> {
        self.handlers.get(site_id).cloned()
    }

    pub fn contains(&self, site_id: &str) -> bool {
        self.handlers.contains_key(site_id)
    }

    /// Registered site identifiers, sorted.
    pub fn site_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.handlers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
