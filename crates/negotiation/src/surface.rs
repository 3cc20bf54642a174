use async_trait::async_trait;
use url::Url;

use signon_core::NegotiationError;

use crate::dialog::DialogForm;
use crate::session::SessionInfo;

/// Values typed into a native prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogInput {
    pub username: String,
    pub password: String,
    pub captcha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    Submit(DialogInput),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogField {
    Username,
    Password,
    Captcha,
}

/// A native prompt the user answers
#[async_trait]
pub trait DialogSurface: Send {
    async fn show(&mut self, form: &DialogForm) -> Result<(), NegotiationError>;

    /// Tell the user a required field was left empty; the prompt stays open
    async fn reject(&mut self, field: DialogField) -> Result<(), NegotiationError>;

    /// Next user action. `None` means the prompt went away and counts as cancel.
    async fn next_event(&mut self) -> Option<DialogEvent>;

    async fn hide(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebEvent {
    Loaded { url: String, html: String },
    LoadFailed { url: String, reason: String },
    /// The user dismissed the view
    Closed,
}

/// A web view that starts hidden and is only shown on demand
#[async_trait]
pub trait WebSurface: Send {
    async fn navigate(&mut self, url: &Url) -> Result<(), NegotiationError>;

    async fn show(&mut self, title: &str) -> Result<(), NegotiationError>;

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), NegotiationError>;

    async fn click(&mut self, selector: &str) -> Result<(), NegotiationError>;

    /// Next page event. `None` is treated like [`WebEvent::Closed`].
    async fn next_event(&mut self) -> Option<WebEvent>;

    async fn close(&mut self);
}

/// Opens the UI surfaces a session needs. Only called for the mode the
/// session actually runs in.
#[async_trait]
pub trait SurfaceProvider: Send + Sync + 'static {
    async fn dialog(&self, session: &SessionInfo) -> Result<Box<dyn DialogSurface>, NegotiationError>;

    async fn web_view(&self, session: &SessionInfo) -> Result<Box<dyn WebSurface>, NegotiationError>;
}
