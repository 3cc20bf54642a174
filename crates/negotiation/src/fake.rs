//! Scripted surfaces for tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use signon_core::NegotiationError;

use crate::dialog::DialogForm;
use crate::session::SessionInfo;
use crate::surface::*;

pub const LOGIN_PAGE: &str = r#"
    <html><head><title>Login here</title></head>
    <body>
    <form method="POST" action="http://localhost:8000/login.html">
      Username: <input type="text" name="username" size="15" /><br />
      Password: <input type="password" name="password" size="15" /><br />
      <p><input type="submit" value="Login" /></p>
    </form>
    </body>
    </html>
"#;

/// Everything the surfaces were asked to do
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub dialogs_opened: usize,
    pub dialog_forms: Vec<DialogForm>,
    pub rejected: Vec<DialogField>,
    pub dialog_hidden: bool,
    pub web_views_opened: usize,
    pub web_shown: bool,
    pub web_closed: bool,
    pub navigated: Vec<String>,
    pub clicked: Vec<String>,
    pub order: Vec<String>,
}

/// Dialog answering from a channel. Once the channel is drained and every
/// sender is gone the prompt reports that it went away.
pub struct ScriptedDialog {
    events: mpsc::UnboundedReceiver<DialogEvent>,
    log: Arc<Mutex<SurfaceLog>>,
}

impl ScriptedDialog {
    pub fn new(events: Vec<DialogEvent>, log: Arc<Mutex<SurfaceLog>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in events {
            let _ = tx.send(event);
        }
        Self::from_channel(rx, log)
    }

    pub fn from_channel(events: mpsc::UnboundedReceiver<DialogEvent>, log: Arc<Mutex<SurfaceLog>>) -> Self {
        Self { events, log }
    }
}

#[async_trait]
impl DialogSurface for ScriptedDialog {
    async fn show(&mut self, form: &DialogForm) -> Result<(), NegotiationError> {
        let mut log = self.log.lock().unwrap();
        log.dialog_forms.push(form.clone());
        log.order.push(format!("dialog:{}", form.title));
        Ok(())
    }

    async fn reject(&mut self, field: DialogField) -> Result<(), NegotiationError> {
        self.log.lock().unwrap().rejected.push(field);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<DialogEvent> {
        self.events.recv().await
    }

    async fn hide(&mut self) {
        self.log.lock().unwrap().dialog_hidden = true;
    }
}

/// The basic-login test site: submitting the form redirects to
/// `redirect_prefix` followed by the username and password.
#[derive(Debug, Clone)]
pub struct FakeSite {
    pub login_html: String,
    pub redirect_prefix: String,
    pub fail_open: bool,
    /// Filling a field errors, as when the page script rejects the selector
    pub fail_fill: bool,
}

impl Default for FakeSite {
    fn default() -> Self {
        Self {
            login_html: LOGIN_PAGE.to_string(),
            redirect_prefix: "http://localhost:8000/logged#".to_string(),
            fail_open: false,
            fail_fill: false,
        }
    }
}

/// Web view backed by [`FakeSite`]. Page events come first, then whatever the
/// "user" sends on the channel. With nothing left it waits forever.
pub struct FakeWebView {
    site: FakeSite,
    pages: VecDeque<WebEvent>,
    user: Option<mpsc::UnboundedReceiver<WebEvent>>,
    fields: HashMap<String, String>,
    log: Arc<Mutex<SurfaceLog>>,
}

impl FakeWebView {
    pub fn new(
        site: FakeSite,
        user: Option<mpsc::UnboundedReceiver<WebEvent>>,
        log: Arc<Mutex<SurfaceLog>>,
    ) -> Self {
        Self {
            site,
            pages: VecDeque::new(),
            user,
            fields: HashMap::new(),
            log,
        }
    }
}

#[async_trait]
impl WebSurface for FakeWebView {
    async fn navigate(&mut self, url: &Url) -> Result<(), NegotiationError> {
        {
            let mut log = self.log.lock().unwrap();
            log.navigated.push(url.to_string());
            log.order.push("navigate".into());
        }
        let event = if self.site.fail_open {
            WebEvent::LoadFailed {
                url: url.to_string(),
                reason: "connection refused".into(),
            }
        } else {
            WebEvent::Loaded {
                url: url.to_string(),
                html: self.site.login_html.clone(),
            }
        };
        self.pages.push_back(event);
        Ok(())
    }

    async fn show(&mut self, _title: &str) -> Result<(), NegotiationError> {
        let mut log = self.log.lock().unwrap();
        log.web_shown = true;
        log.order.push("show".into());
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), NegotiationError> {
        if self.site.fail_fill {
            return Err(NegotiationError::Surface(format!("element not found: {}", selector)));
        }
        self.fields.insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), NegotiationError> {
        self.log.lock().unwrap().clicked.push(selector.to_string());
        let field = |name: &str| {
            self.fields
                .get(&format!("input[name='{}']", name))
                .cloned()
                .unwrap_or_default()
        };
        let url = format!(
            "{}{}{}",
            self.site.redirect_prefix,
            field("username"),
            field("password")
        );
        self.pages.push_back(WebEvent::Loaded {
            url,
            html: "<html><body>Logged in</body></html>".into(),
        });
        Ok(())
    }

    async fn next_event(&mut self) -> Option<WebEvent> {
        if let Some(event) = self.pages.pop_front() {
            return Some(event);
        }
        if let Some(user) = self.user.as_mut() {
            if let Some(event) = user.recv().await {
                return Some(event);
            }
        }
        std::future::pending().await
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().web_closed = true;
    }
}

/// Hands out scripted surfaces in the order they were registered
pub struct FakeSurfaces {
    pub log: Arc<Mutex<SurfaceLog>>,
    site: FakeSite,
    dialogs: Mutex<VecDeque<mpsc::UnboundedReceiver<DialogEvent>>>,
    web_users: Mutex<VecDeque<mpsc::UnboundedReceiver<WebEvent>>>,
}

impl FakeSurfaces {
    pub fn new(site: FakeSite) -> Self {
        Self {
            log: Arc::new(Mutex::new(SurfaceLog::default())),
            site,
            dialogs: Mutex::new(VecDeque::new()),
            web_users: Mutex::new(VecDeque::new()),
        }
    }

    /// Script the next dialog. The returned sender drives it further; dropping
    /// it ends the script.
    pub fn script_dialog(&self, events: Vec<DialogEvent>) -> mpsc::UnboundedSender<DialogEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        for event in events {
            let _ = tx.send(event);
        }
        self.dialogs.lock().unwrap().push_back(rx);
        tx
    }

    /// User actions for the next web view
    pub fn web_user(&self) -> mpsc::UnboundedSender<WebEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.web_users.lock().unwrap().push_back(rx);
        tx
    }

    pub fn dialogs_opened(&self) -> usize {
        self.log.lock().unwrap().dialogs_opened
    }

    pub fn web_views_opened(&self) -> usize {
        self.log.lock().unwrap().web_views_opened
    }
}

#[async_trait]
impl SurfaceProvider for FakeSurfaces {
    async fn dialog(&self, _session: &SessionInfo) -> Result<Box<dyn DialogSurface>, NegotiationError> {
        let events = self
            .dialogs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| NegotiationError::Surface("no dialog scripted".into()))?;
        self.log.lock().unwrap().dialogs_opened += 1;
        Ok(Box::new(ScriptedDialog::from_channel(events, self.log.clone())))
    }

    async fn web_view(&self, _session: &SessionInfo) -> Result<Box<dyn WebSurface>, NegotiationError> {
        let user = self.web_users.lock().unwrap().pop_front();
        self.log.lock().unwrap().web_views_opened += 1;
        Ok(Box::new(FakeWebView::new(
            self.site.clone(),
            user,
            self.log.clone(),
        )))
    }
}

/// Poll `condition` until it holds, failing the test after a second
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
