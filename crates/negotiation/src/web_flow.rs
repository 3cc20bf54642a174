use std::fmt;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use signon_core::config::SiteConfig;
use signon_core::{NegotiationError, Request};
use signon_parser::{find_login_form, page_title, LoginForm};

use crate::surface::{WebEvent, WebSurface};
use crate::{site_selectors, NegotiationConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebFlowState {
    /// Hidden view, waiting for the first usable page
    Navigating,
    /// Credentials were submitted silently
    AutoSubmitted,
    /// View is visible and the user drives it
    Interactive,
}

/// What the driver must do after feeding an event to the flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Wait,
    AutoSubmit(LoginForm),
    Show,
}

/// One transition of the flow. `Done` consumes it, so a completed flow
/// cannot see further events.
#[derive(Debug)]
pub enum Step {
    Continue(WebFlow, Command),
    Done(Result<String, NegotiationError>),
}

/// Web login state machine. Pure: it never touches a surface.
pub struct WebFlow {
    open_url: Url,
    final_url: String,
    username: Option<String>,
    secret: Option<String>,
    title: String,
    embedded: bool,
    state: WebFlowState,
    visible: bool,
    auto_logins: u32,
    max_auto_logins: u32,
    sites: Vec<SiteConfig>,
    pending_failure: Option<String>,
}

impl fmt::Debug for WebFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebFlow")
            .field("open_url", &self.open_url.as_str())
            .field("final_url", &self.final_url)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("state", &self.state)
            .field("visible", &self.visible)
            .field("auto_logins", &self.auto_logins)
            .field("pending_failure", &self.pending_failure)
            .finish_non_exhaustive()
    }
}

impl WebFlow {
    pub fn new(request: &Request, config: &NegotiationConfig) -> Result<Self, NegotiationError> {
        let open_url = request
            .open_url
            .clone()
            .ok_or_else(|| NegotiationError::InvalidRequest("web flow without OpenUrl".into()))?;
        let final_url = request
            .final_url
            .clone()
            .ok_or_else(|| NegotiationError::InvalidRequest("web flow without FinalUrl".into()))?;

        Ok(Self {
            open_url,
            final_url,
            username: request.username.clone(),
            secret: request.secret.clone(),
            title: request.web_title(),
            embedded: request.client_data.embedded,
            state: WebFlowState::Navigating,
            visible: false,
            auto_logins: 0,
            max_auto_logins: config.max_auto_login_attempts,
            sites: config.sites.clone(),
            pending_failure: None,
        })
    }

    pub fn state(&self) -> WebFlowState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn open_url(&self) -> &Url {
        &self.open_url
    }

    /// A load failed and nothing has replaced it yet
    pub fn pending_failure(&self) -> Option<&str> {
        self.pending_failure.as_deref()
    }

    pub fn mark_visible(&mut self) {
        self.visible = true;
        self.state = WebFlowState::Interactive;
    }

    pub fn on_event(self, event: Option<WebEvent>) -> Step {
        match event {
            Some(WebEvent::Loaded { url, html }) => self.on_loaded(&url, &html),
            Some(WebEvent::LoadFailed { url, reason }) => self.on_load_failed(&url, &reason),
            Some(WebEvent::Closed) | None => Step::Done(Err(NegotiationError::UserCanceled)),
        }
    }

    /// The grace period after a failed load ran out
    pub fn on_grace_expired(self) -> Step {
        let reason = self
            .pending_failure
            .unwrap_or_else(|| "page failed to load".to_string());
        Step::Done(Err(NegotiationError::Navigation(reason)))
    }

    fn on_loaded(mut self, url: &str, html: &str) -> Step {
        self.pending_failure = None;

        if let Some(suffix) = url.strip_prefix(self.final_url.as_str()) {
            info!(final_url = %self.final_url, "final URL reached");
            return Step::Done(Ok(format!("{}{}", self.final_url, suffix)));
        }

        if !self.visible && self.username.is_some() && self.secret.is_some() {
            if self.auto_logins < self.max_auto_logins {
                let host = Url::parse(url)
                    .ok()
                    .and_then(|u| u.host_str().map(|h| h.to_string()));
                let configured = host.and_then(|h| site_selectors(&self.sites, &h));
                if let Some(form) = find_login_form(html, configured.as_ref()) {
                    self.auto_logins += 1;
                    self.state = WebFlowState::AutoSubmitted;
                    let page = page_title(html).unwrap_or_default();
                    debug!(
                        url,
                        page = %page,
                        attempt = self.auto_logins,
                        "submitting known credentials"
                    );
                    return Step::Continue(self, Command::AutoSubmit(form));
                }
                debug!(url, "no login form recognized");
            } else {
                warn!(url, "automatic login did not reach the final URL");
            }
        }

        if self.visible {
            Step::Continue(self, Command::Wait)
        } else {
            self.mark_visible();
            Step::Continue(self, Command::Show)
        }
    }

    fn on_load_failed(mut self, url: &str, reason: &str) -> Step {
        // the final page itself need not load, reaching its URL is enough
        if url.starts_with(self.final_url.as_str()) {
            return self.on_loaded(url, "");
        }
        warn!(url, reason, "page load failed");
        self.pending_failure = Some(format!("{}: {}", url, reason));
        Step::Continue(self, Command::Wait)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }
}

/// Drive `flow` on `surface` until the final URL is reached. Returns the
/// URL response.
pub async fn run_web_flow(
    mut flow: WebFlow,
    surface: &mut dyn WebSurface,
    grace: Duration,
) -> Result<String, NegotiationError> {
    if flow.embedded {
        surface.show(flow.title()).await?;
        flow.mark_visible();
    }

    if let Err(e) = surface.navigate(flow.open_url()).await {
        surface.close().await;
        return Err(NegotiationError::Navigation(e.to_string()));
    }

    loop {
        let step = if flow.pending_failure().is_some() {
            match timeout(grace, surface.next_event()).await {
                Ok(event) => flow.on_event(event),
                Err(_) => flow.on_grace_expired(),
            }
        } else {
            let event = surface.next_event().await;
            flow.on_event(event)
        };

        let command = match step {
            Step::Continue(next, command) => {
                flow = next;
                command
            }
            Step::Done(result) => {
                surface.close().await;
                return result;
            }
        };

        let outcome = match command {
            Command::Wait => Ok(()),
            Command::Show => surface.show(flow.title()).await,
            Command::AutoSubmit(form) => match auto_submit(&flow, &form, surface).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    // the user can still log in by hand
                    warn!(error = %e, "automatic login failed, showing the page");
                    flow.mark_visible();
                    surface.show(flow.title()).await
                }
            },
        };
        if let Err(e) = outcome {
            surface.close().await;
            return Err(e);
        }
    }
}

async fn auto_submit(
    flow: &WebFlow,
    form: &LoginForm,
    surface: &mut dyn WebSurface,
) -> Result<(), NegotiationError> {
    let (Some(username), Some(secret)) = (flow.username(), flow.secret()) else {
        return Ok(());
    };
    surface.fill(&form.username_selector, username).await?;
    surface.fill(&form.password_selector, secret).await?;
    surface.click(&form.submit_selector).await
}
