use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use signon_core::config::WebConfig;
use signon_core::NegotiationError;

use crate::surface::{WebEvent, WebSurface};

const ERROR_PAGE_PREFIX: &str = "chrome-error://";

/// Chrome-backed web view. Starts headless; `show` moves the session to a
/// visible window unless the configuration forbids one.
pub struct HeadlessBrowser {
    // owns the Chrome process
    _browser: Browser,
    tab: Arc<Tab>,
    config: WebConfig,
    visible: bool,
    /// Last URL reported through `next_event`
    reported_url: Option<String>,
    load_pending: bool,
}

impl HeadlessBrowser {
    pub fn new(config: &WebConfig) -> Result<Self, NegotiationError> {
        let (browser, tab) = launch(config, true)?;
        Ok(Self {
            _browser: browser,
            tab,
            config: config.clone(),
            visible: false,
            reported_url: None,
            load_pending: false,
        })
    }

    fn current_url(&self) -> String {
        self.tab.get_url()
    }
}

fn launch(config: &WebConfig, headless: bool) -> Result<(Browser, Arc<Tab>), NegotiationError> {
    let mut extra_args: Vec<OsString> = Vec::new();

    // Required for running in containers
    extra_args.push(OsString::from("--no-sandbox"));
    extra_args.push(OsString::from("--disable-dev-shm-usage"));
    if headless {
        extra_args.push(OsString::from("--disable-gpu"));
    }

    let mut builder = LaunchOptionsBuilder::default();
    builder
        .headless(headless)
        .window_size(Some((config.window_width, config.window_height)))
        // a user may sit on the login page for a while
        .idle_browser_timeout(Duration::from_secs(600))
        .args(extra_args.iter().map(|a| a.as_ref()).collect());

    if let Some(path) = &config.chrome_path {
        builder.path(Some(std::path::PathBuf::from(path)));
    }

    let launch_options = builder
        .build()
        .map_err(|e| NegotiationError::Surface(e.to_string()))?;
    let browser =
        Browser::new(launch_options).map_err(|e| NegotiationError::Surface(e.to_string()))?;
    let tab = browser
        .new_tab()
        .map_err(|e| NegotiationError::Surface(e.to_string()))?;

    if let Some(agent) = &config.user_agent {
        tab.set_user_agent(agent, None, None)
            .map_err(|e| NegotiationError::Surface(e.to_string()))?;
    }

    debug!(headless, "browser launched");
    Ok((browser, tab))
}

#[async_trait]
impl WebSurface for HeadlessBrowser {
    async fn navigate(&mut self, url: &Url) -> Result<(), NegotiationError> {
        info!("navigating to {}", url);
        self.tab
            .navigate_to(url.as_str())
            .map_err(|e| NegotiationError::Navigation(e.to_string()))?;
        self.load_pending = true;
        Ok(())
    }

    async fn show(&mut self, title: &str) -> Result<(), NegotiationError> {
        if self.visible {
            return Ok(());
        }
        if self.config.headless {
            warn!(title, "visible browser disabled, the page stays headless");
            self.visible = true;
            return Ok(());
        }

        // Chrome cannot leave headless mode: reopen the current page in a window
        let current = self.current_url();
        let (browser, tab) = launch(&self.config, false)?;
        if !current.is_empty() && current != "about:blank" {
            tab.navigate_to(&current)
                .map_err(|e| NegotiationError::Navigation(e.to_string()))?;
            self.load_pending = true;
        }
        tab.bring_to_front()
            .map_err(|e| NegotiationError::Surface(e.to_string()))?;

        info!(title, "showing login page");
        self._browser = browser;
        self.tab = tab;
        self.visible = true;
        Ok(())
    }

    /// Fill a form field by CSS selector
    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), NegotiationError> {
        let selector_js = js_string(selector);
        let value_js = js_string(value);
        self.tab
            .evaluate(
                &format!(
                    r#"
                    (() => {{
                        const elem = document.querySelector({sel});
                        if (!elem) {{ throw new Error('Element not found: ' + {sel}); }}
                        elem.value = {val};
                        elem.dispatchEvent(new Event('input', {{ bubbles: true }}));
                        elem.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    }})()
                    "#,
                    sel = selector_js,
                    val = value_js,
                ),
                false,
            )
            .map_err(|e| NegotiationError::Surface(e.to_string()))?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), NegotiationError> {
        let selector_js = js_string(selector);
        self.tab
            .evaluate(
                &format!(
                    r#"
                    (() => {{
                        const elem = document.querySelector({sel});
                        if (!elem) {{ throw new Error('Element not found: ' + {sel}); }}
                        elem.click();
                    }})()
                    "#,
                    sel = selector_js,
                ),
                false,
            )
            .map_err(|e| NegotiationError::Surface(e.to_string()))?;
        Ok(())
    }

    /// Poll the tab until its URL changes or a requested load settles
    async fn next_event(&mut self) -> Option<WebEvent> {
        let interval = Duration::from_millis(self.config.poll_interval_ms.max(10));

        loop {
            tokio::time::sleep(interval).await;

            // evaluating anything fails once the user closed the window
            let location = match self.tab.evaluate("window.location.href", false) {
                Ok(result) => result
                    .value
                    .and_then(|v| v.as_str().map(|s| s.to_string()))
                    .unwrap_or_default(),
                Err(e) => {
                    debug!(error = %e, "browser tab is gone");
                    return Some(WebEvent::Closed);
                }
            };

            let url = self.current_url();
            if !self.load_pending && self.reported_url.as_deref() == Some(url.as_str()) {
                continue;
            }
            self.load_pending = false;
            self.reported_url = Some(url.clone());

            if location.starts_with(ERROR_PAGE_PREFIX) {
                return Some(WebEvent::LoadFailed {
                    url,
                    reason: "page could not be loaded".to_string(),
                });
            }
            if let Err(e) = self.tab.wait_until_navigated() {
                return Some(WebEvent::LoadFailed {
                    url,
                    reason: e.to_string(),
                });
            }
            return match self.tab.get_content() {
                Ok(html) => Some(WebEvent::Loaded { url, html }),
                Err(e) => Some(WebEvent::LoadFailed {
                    url,
                    reason: e.to_string(),
                }),
            };
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!(error = %e, "closing tab failed");
        }
    }
}

/// Quote `s` as a JavaScript string literal
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
