use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use signon_core::config::AppConfig;
use signon_core::KEY_REQUEST_ID;
use signon_negotiation::desktop::LocalSurfaces;
use signon_negotiation::{NegotiationConfig, Service};

use super::read_request;

pub async fn run(config: AppConfig, source: &str) -> Result<()> {
    let mut raw = read_request(source).await?;

    // Ctrl-C cancels through the request id, so make sure there is one
    let request_id = match raw.get(KEY_REQUEST_ID).and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => {
            let id = format!("cli-{}", std::process::id());
            raw.insert(KEY_REQUEST_ID.to_string(), Value::String(id.clone()));
            id
        }
    };

    let surfaces = Arc::new(LocalSurfaces::new(config.web.clone()));
    let service = Service::new(NegotiationConfig::from(&config), surfaces);

    let mut query = tokio::spawn({
        let service = service.clone();
        async move { service.query_dialog(&raw).await }
    });

    let reply = tokio::select! {
        reply = &mut query => reply?,
        _ = tokio::signal::ctrl_c() => {
            info!(request_id = %request_id, "interrupted, canceling");
            if !service.cancel_ui_request(&request_id) {
                warn!("no running session to cancel");
            }
            query.await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}
