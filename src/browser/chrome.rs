use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Target;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::de::DeserializeOwned;

use crate::browser::{
    BrowserEngine, ElementState, EngineLauncher, Locator, NavigationResponse, PageSession,
};
use crate::config::BrowserConfig;
use crate::models::EngineKind;
use crate::utils::error::{ProbeError, SessionError};

/// Headroom added to the tab's own CDP timeout so the async deadline fires first.
const TAB_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

const STATUS_SCRIPT: &str = r#"(() => {
    const entry = performance.getEntriesByType('navigation')[0];
    return JSON.stringify(entry && entry.responseStatus ? entry.responseStatus : null);
})()"#;

const BODY_TEXT_SCRIPT: &str =
    "JSON.stringify(document.body ? (document.body.innerText || '') : '')";

const TEXT_BODY: &str = "return JSON.stringify(el ? (el.innerText || el.textContent || '') : null);";

const STATE_BODY: &str = r#"if (!el) return JSON.stringify(null);
    const style = window.getComputedStyle(el);
    const visible = !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length)
        && style.visibility !== 'hidden' && style.display !== 'none';
    return JSON.stringify({
        visible: visible,
        disabled: el.hasAttribute('disabled'),
        class_name: el.getAttribute('class') || ''
    });"#;

/// Launches Chrome processes for the engine selector.
///
/// The fallback engine is a separate process with its own fingerprint:
/// a different user agent, the automation-controlled blink feature turned
/// off and an explicit desktop window size.
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineLauncher for ChromeLauncher {
    async fn launch(&self, kind: EngineKind) -> Result<Arc<dyn BrowserEngine>, ProbeError> {
        let config = self.config.clone();
        let (browser, control) = tokio::task::spawn_blocking(move || launch_browser(&config, kind))
            .await
            .map_err(|e| ProbeError::Engine(format!("launch task failed: {}", e)))??;

        let user_agent = match kind {
            EngineKind::Default => self.config.user_agent.clone(),
            EngineKind::Fallback => self.config.fallback_user_agent.clone(),
        };

        tracing::info!("Launched {} browser engine", kind);
        Ok(Arc::new(ChromeEngine {
            kind,
            browser: Mutex::new(Some(Arc::new(browser))),
            control,
            user_agent,
            accept_language: self.config.locale.clone(),
        }))
    }
}

/// Starts Chrome and opens the control tab that lives in the default context.
fn launch_browser(config: &BrowserConfig, kind: EngineKind) -> Result<(Browser, Arc<Tab>), ProbeError> {
    let lang_arg = format!("--lang={}", config.locale);
    let mut args: Vec<&OsStr> = vec![
        OsStr::new("--no-sandbox"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--disable-gpu"),
        OsStr::new("--disable-extensions"),
        OsStr::new(&lang_arg),
    ];
    if kind == EngineKind::Fallback {
        args.push(OsStr::new("--disable-blink-features=AutomationControlled"));
        args.push(OsStr::new("--disable-features=IsolateOrigins,site-per-process"));
    }

    let mut launch_options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .window_size(Some((config.window_width, config.window_height)))
        .idle_browser_timeout(Duration::from_secs(config.idle_timeout_secs))
        .args(args)
        .build()
        .map_err(|e| ProbeError::Engine(format!("Failed to create launch options: {}", e)))?;

    if let Some(chrome_path) = &config.chrome_path {
        launch_options.path = Some(std::path::PathBuf::from(chrome_path));
    }

    let browser = Browser::new(launch_options)
        .map_err(|e| ProbeError::Engine(format!("Failed to launch browser: {}", e)))?;
    let control = browser
        .new_tab()
        .map_err(|e| ProbeError::Engine(format!("Failed to open control tab: {}", e)))?;
    Ok((browser, control))
}

pub struct ChromeEngine {
    kind: EngineKind,
    browser: Mutex<Option<Arc<Browser>>>,
    /// Browser-level commands go through this tab; it never joins a product context.
    control: Arc<Tab>,
    user_agent: String,
    accept_language: String,
}

impl ChromeEngine {
    fn browser(&self) -> Result<Arc<Browser>, ProbeError> {
        self.browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| ProbeError::Engine(format!("{} engine already shut down", self.kind)))
    }
}

#[async_trait]
impl BrowserEngine for ChromeEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    async fn open_session(&self) -> Result<Box<dyn PageSession>, ProbeError> {
        let browser = self.browser()?;
        let control = Arc::clone(&self.control);
        let user_agent = self.user_agent.clone();
        let accept_language = self.accept_language.clone();

        let session = tokio::task::spawn_blocking(move || -> Result<ChromeSession, ProbeError> {
            // A fresh browser context keeps cookies and storage private to this probe.
            let context = browser
                .new_context()
                .map_err(|e| ProbeError::Engine(format!("Failed to create browser context: {}", e)))?;
            let context_id = context.get_id().to_string();
            let tab = context
                .new_tab()
                .map_err(|e| ProbeError::Engine(format!("Failed to create tab: {}", e)))?;
            tab.set_user_agent(&user_agent, Some(&accept_language), None)
                .map_err(|e| ProbeError::Engine(format!("Failed to set user agent: {}", e)))?;

            Ok(ChromeSession {
                control,
                tab,
                context_id,
                closed: AtomicBool::new(false),
            })
        })
        .await
        .map_err(|e| ProbeError::Engine(format!("session task failed: {}", e)))??;

        Ok(Box::new(session))
    }

    async fn shutdown(&self) {
        let browser = self
            .browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(browser) = browser {
            // Dropping the last handle terminates the Chrome process.
            let _ = tokio::task::spawn_blocking(move || drop(browser)).await;
            tracing::info!("Closed {} browser engine", self.kind);
        }
    }
}

pub struct ChromeSession {
    control: Arc<Tab>,
    tab: Arc<Tab>,
    context_id: String,
    closed: AtomicBool,
}

impl ChromeSession {
    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    /// headless_chrome is synchronous; keep its calls off the async workers.
    async fn run_blocking<T, F>(&self, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&Tab) -> Result<T, SessionError> + Send + 'static,
        T: Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || f(&tab))
            .await
            .map_err(|e| SessionError::Script(format!("blocking task failed: {}", e)))?
    }

    /// Scripts return `JSON.stringify(..)` so values cross CDP as plain strings.
    async fn eval_json<T>(&self, script: String) -> Result<T, SessionError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.ensure_open()?;
        self.run_blocking(move |tab| {
            let result = tab
                .evaluate(&script, false)
                .map_err(|e| SessionError::Script(e.to_string()))?;
            let raw = result
                .value
                .as_ref()
                .and_then(|v| v.as_str())
                .ok_or_else(|| SessionError::Script("script returned no value".to_string()))?;
            serde_json::from_str(raw).map_err(|e| SessionError::Script(format!("bad script result: {}", e)))
        })
        .await
    }
}

fn locate_script(locator: &Locator, body: &str) -> Result<String, SessionError> {
    let loc = serde_json::to_string(locator).map_err(|e| SessionError::Script(e.to_string()))?;
    Ok(format!(
        r#"(() => {{
    const loc = {loc};
    let el = null;
    if (loc.css !== undefined) {{
        el = document.querySelector(loc.css);
    }} else {{
        el = Array.from(document.querySelectorAll(loc.text.tag))
            .find(e => (e.innerText || e.textContent || '').includes(loc.text.text)) || null;
    }}
    {body}
}})()"#,
        loc = loc,
        body = body
    ))
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationResponse, ProbeError> {
        self.ensure_open()?;
        let target = url.to_string();
        let navigation = self.run_blocking(move |tab| {
            tab.set_default_timeout(timeout + TAB_TIMEOUT_SLACK);
            tab.navigate_to(&target)
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
            tab.wait_until_navigated()
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
            Ok(tab.get_url())
        });

        let final_url = match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ProbeError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                });
            }
        };

        let status = match self.eval_json::<Option<u16>>(STATUS_SCRIPT.to_string()).await {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!("Could not read response status for {}: {}", url, e);
                None
            }
        };

        Ok(NavigationResponse { status, final_url })
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), SessionError> {
        self.ensure_open()?;
        let selector = selector.to_string();
        self.run_blocking(move |tab| {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)
                .map(|_| ())
                .map_err(|e| SessionError::Navigation(format!("wait for '{}' failed: {}", selector, e)))
        })
        .await
    }

    async fn body_text(&self) -> Result<String, SessionError> {
        self.eval_json(BODY_TEXT_SCRIPT.to_string()).await
    }

    async fn text_of(&self, locator: &Locator) -> Result<Option<String>, SessionError> {
        self.eval_json(locate_script(locator, TEXT_BODY)?).await
    }

    async fn element_state(&self, locator: &Locator) -> Result<Option<ElementState>, SessionError> {
        self.eval_json(locate_script(locator, STATE_BODY)?).await
    }

    async fn close(&self) -> Result<(), SessionError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let control = Arc::clone(&self.control);
        let context_id = self.context_id.clone();
        self.run_blocking(move |tab| {
            if let Err(e) = tab.close(true) {
                tracing::debug!("Tab close failed: {}", e);
            }
            control
                .call_method(Target::DisposeBrowserContext {
                    browser_context_id: context_id,
                })
                .map(|_| ())
                .map_err(|e| SessionError::Script(format!("Failed to dispose browser context: {}", e)))
        })
        .await
    }
}
