use anyhow::Result;

use signon_core::config::AppConfig;
use signon_core::error_map;
use signon_negotiation::{select, DialogForm, Mode};

use super::read_request;

pub async fn run(config: AppConfig, source: &str) -> Result<()> {
    let raw = read_request(source).await?;

    let request = match signon_core::parse(&raw) {
        Ok(request) => request,
        Err(e) => {
            println!("Request: INVALID - {}", e);
            println!("{}", serde_json::to_string_pretty(&error_map(&e))?);
            return Ok(());
        }
    };

    let mode = select(&request);
    println!("Mode:      {}", mode);
    println!("Window:    {}", request.window_id());
    if let Some(id) = &request.request_id {
        println!("RequestId: {}", id);
    }

    match mode {
        Mode::NativeQuery => {
            let form = DialogForm::from_request(&request, &config.dialog.default_title);
            println!("Title:     {}", form.title);
            if let Some(username) = &form.username {
                let state = if username.enabled { "editable" } else { "fixed" };
                println!("Username:  {} ({})", username.value, state);
            }
            if form.password.is_some() {
                println!("Password:  asked");
            }
            if let Some(url) = &form.captcha_url {
                println!("Captcha:   {}", url);
            }
        }
        Mode::WebFlow => {
            println!("Title:     {}", request.web_title());
            if let Some(url) = &request.open_url {
                println!("Open:      {}", url);
            }
            if let Some(url) = &request.final_url {
                println!("Final:     {}", url);
            }
            let silent = if request.has_credentials() { "yes" } else { "no" };
            println!("Auto-login: {}", silent);
        }
        Mode::AutoComplete => {
            println!("No UI: the supplied credentials are returned as-is");
        }
    }

    Ok(())
}
