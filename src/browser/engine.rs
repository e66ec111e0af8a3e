use std::sync::Arc;

use crate::browser::{BrowserEngine, EngineLauncher};
use crate::models::EngineKind;
use crate::utils::error::ProbeError;

/// Routes each probe to the default or the fallback browser engine.
///
/// Engines are started on first use, reused for the rest of the pass and
/// closed once by `shutdown`. Dropping the selector releases any engine
/// still held, so early exits do not leak browser processes.
pub struct EngineSelector {
    launcher: Arc<dyn EngineLauncher>,
    default: Option<Arc<dyn BrowserEngine>>,
    fallback: Option<Arc<dyn BrowserEngine>>,
}

impl EngineSelector {
    pub fn new(launcher: Arc<dyn EngineLauncher>) -> Self {
        Self {
            launcher,
            default: None,
            fallback: None,
        }
    }

    pub fn kind_for(requires_fallback: bool) -> EngineKind {
        if requires_fallback {
            EngineKind::Fallback
        } else {
            EngineKind::Default
        }
    }

    pub async fn engine(&mut self, kind: EngineKind) -> Result<Arc<dyn BrowserEngine>, ProbeError> {
        let slot = match kind {
            EngineKind::Default => &mut self.default,
            EngineKind::Fallback => &mut self.fallback,
        };

        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        tracing::debug!("Starting {} engine on first use", kind);
        let engine = self.launcher.launch(kind).await?;
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn is_running(&self, kind: EngineKind) -> bool {
        match kind {
            EngineKind::Default => self.default.is_some(),
            EngineKind::Fallback => self.fallback.is_some(),
        }
    }

    pub async fn shutdown(&mut self) {
        for engine in [self.default.take(), self.fallback.take()].into_iter().flatten() {
            engine.shutdown().await;
        }
    }
}
