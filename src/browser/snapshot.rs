//! Offline engine that serves saved HTML pages instead of driving a browser.
//!
//! Pages are parsed with `scraper` on every query, so the engine sees exactly
//! what was saved: no scripts run and nothing is rendered. Each URL can be
//! given a sequence of snapshots that successive navigations walk through,
//! which is how flaky or hostile sites are reproduced.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::browser::{
    BrowserEngine, ElementState, EngineLauncher, Locator, NavigationResponse, PageSession,
};
use crate::models::EngineKind;
use crate::utils::error::{ProbeError, SessionError};

#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub status: Option<u16>,
    pub html: String,
    /// Simulated network latency before the page "arrives".
    pub latency: Duration,
}

impl PageSnapshot {
    pub fn ok(html: impl Into<String>) -> Self {
        Self {
            status: Some(200),
            html: html.into(),
            latency: Duration::ZERO,
        }
    }

    pub fn with_status(status: u16, html: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            html: html.into(),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[derive(Default)]
struct SnapshotState {
    pages: HashMap<String, VecDeque<PageSnapshot>>,
    navigations: HashMap<String, usize>,
}

impl SnapshotState {
    /// The last snapshot of a sequence is sticky.
    fn next_page(&mut self, url: &str) -> Option<PageSnapshot> {
        *self.navigations.entry(url.to_string()).or_insert(0) += 1;
        let queue = self.pages.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

/// Cheap to clone; clones share pages and counters.
#[derive(Clone)]
pub struct SnapshotEngine {
    kind: EngineKind,
    state: Arc<Mutex<SnapshotState>>,
    sessions_opened: Arc<AtomicUsize>,
    sessions_closed: Arc<AtomicUsize>,
    launches: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
}

impl SnapshotEngine {
    pub fn new() -> Self {
        Self {
            kind: EngineKind::Default,
            state: Arc::new(Mutex::new(SnapshotState::default())),
            sessions_opened: Arc::new(AtomicUsize::new(0)),
            sessions_closed: Arc::new(AtomicUsize::new(0)),
            launches: Arc::new(AtomicUsize::new(0)),
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_page(self, url: impl Into<String>, snapshot: PageSnapshot) -> Self {
        self.with_sequence(url, vec![snapshot])
    }

    pub fn with_sequence(self, url: impl Into<String>, snapshots: Vec<PageSnapshot>) -> Self {
        self.lock().pages.insert(url.into(), snapshots.into());
        self
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.lock().navigations.get(url).copied().unwrap_or(0)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    /// Number of times a launcher started this engine.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SnapshotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn as_kind(&self, kind: EngineKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserEngine for SnapshotEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn open_session(&self) -> Result<Box<dyn PageSession>, ProbeError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SnapshotSession {
            engine: self.clone(),
            current: Mutex::new(None),
            closed: AtomicBool::new(false),
        }))
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Launcher handing out views of one shared page set, tagged per engine kind.
pub struct SnapshotLauncher {
    engines: HashMap<EngineKind, SnapshotEngine>,
}

impl SnapshotLauncher {
    pub fn new(default: SnapshotEngine) -> Self {
        let fallback = default.as_kind(EngineKind::Fallback);
        Self::with_engines(default, fallback)
    }

    /// Separate page sets per kind, to tell which engine served a probe.
    pub fn with_engines(default: SnapshotEngine, fallback: SnapshotEngine) -> Self {
        let mut engines = HashMap::new();
        engines.insert(EngineKind::Default, default.as_kind(EngineKind::Default));
        engines.insert(EngineKind::Fallback, fallback.as_kind(EngineKind::Fallback));
        Self { engines }
    }
}

#[async_trait]
impl EngineLauncher for SnapshotLauncher {
    async fn launch(&self, kind: EngineKind) -> Result<Arc<dyn BrowserEngine>, ProbeError> {
        let engine = self
            .engines
            .get(&kind)
            .cloned()
            .ok_or_else(|| ProbeError::Engine(format!("no {} snapshot engine", kind)))?;
        engine.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(engine))
    }
}

struct SnapshotSession {
    engine: SnapshotEngine,
    current: Mutex<Option<PageSnapshot>>,
    closed: AtomicBool,
}

impl SnapshotSession {
    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    fn html(&self) -> Result<String, SessionError> {
        self.ensure_open()?;
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|page| page.html.clone())
            .ok_or_else(|| SessionError::Navigation("no page loaded".to_string()))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SessionError> {
    Selector::parse(selector).map_err(|_| SessionError::Selector {
        selector: selector.to_string(),
    })
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_element<'a>(document: &'a Html, locator: &Locator) -> Result<Option<ElementRef<'a>>, SessionError> {
    match locator {
        Locator::Css(selector) => {
            let selector = parse_selector(selector)?;
            Ok(document.select(&selector).next())
        }
        Locator::Text { tag, text } => {
            let selector = parse_selector(tag)?;
            Ok(document
                .select(&selector)
                .find(|element| element_text(element).contains(text.as_str())))
        }
    }
}

/// A saved page has no layout, so only explicit hiding counts as invisible.
fn is_hidden(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    value
        .attr("style")
        .map(|style| {
            let style = style.replace(' ', "").to_ascii_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

#[async_trait]
impl PageSession for SnapshotSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationResponse, ProbeError> {
        self.ensure_open()?;
        let page = self
            .engine
            .lock()
            .next_page(url)
            .ok_or_else(|| SessionError::Navigation(format!("no snapshot for {}", url)))?;

        if page.latency >= timeout {
            tokio::time::sleep(timeout).await;
            return Err(ProbeError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            });
        }
        if !page.latency.is_zero() {
            tokio::time::sleep(page.latency).await;
        }

        let status = page.status;
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(page);
        Ok(NavigationResponse {
            status,
            final_url: url.to_string(),
        })
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), SessionError> {
        let html = self.html()?;
        let document = Html::parse_document(&html);
        let parsed = parse_selector(selector)?;
        if document.select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(SessionError::Navigation(format!("'{}' never appeared", selector)))
        }
    }

    /// Nothing renders in a snapshot.
    async fn pause(&self, _delay: Duration) {}

    async fn body_text(&self) -> Result<String, SessionError> {
        let html = self.html()?;
        let document = Html::parse_document(&html);
        let body = parse_selector("body")?;
        Ok(document
            .select(&body)
            .next()
            .map(|element| element_text(&element))
            .unwrap_or_default())
    }

    async fn text_of(&self, locator: &Locator) -> Result<Option<String>, SessionError> {
        let html = self.html()?;
        let document = Html::parse_document(&html);
        Ok(find_element(&document, locator)?.map(|element| element_text(&element)))
    }

    async fn element_state(&self, locator: &Locator) -> Result<Option<ElementState>, SessionError> {
        let html = self.html()?;
        let document = Html::parse_document(&html);
        Ok(find_element(&document, locator)?.map(|element| ElementState {
            visible: !is_hidden(&element),
            disabled: element.value().attr("disabled").is_some(),
            class_name: element.value().attr("class").unwrap_or_default().to_string(),
        }))
    }

    async fn close(&self) -> Result<(), SessionError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.engine.sessions_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
