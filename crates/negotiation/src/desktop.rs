use async_trait::async_trait;
use tracing::debug;

use signon_core::config::WebConfig;
use signon_core::NegotiationError;

use crate::browser::HeadlessBrowser;
use crate::console::ConsoleDialog;
use crate::session::SessionInfo;
use crate::surface::{DialogSurface, SurfaceProvider, WebSurface};

/// Surfaces for a local run: prompts on the terminal, web logins in Chrome
pub struct LocalSurfaces {
    web: WebConfig,
}

impl LocalSurfaces {
    pub fn new(web: WebConfig) -> Self {
        Self { web }
    }
}

#[async_trait]
impl SurfaceProvider for LocalSurfaces {
    async fn dialog(&self, session: &SessionInfo) -> Result<Box<dyn DialogSurface>, NegotiationError> {
        debug!(session = %session.id, window = session.window_id, "opening console prompt");
        Ok(Box::new(ConsoleDialog::new()))
    }

    async fn web_view(&self, session: &SessionInfo) -> Result<Box<dyn WebSurface>, NegotiationError> {
        debug!(session = %session.id, embedded = session.embedded, "launching browser");
        let web = self.web.clone();
        // launching Chrome blocks until the devtools endpoint is up
        let browser = tokio::task::spawn_blocking(move || HeadlessBrowser::new(&web))
            .await
            .map_err(|e| NegotiationError::Surface(e.to_string()))??;
        Ok(Box::new(browser))
    }
}
