mod cli;
mod commands;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use signon_core::config::AppConfig;

use crate::cli::{Cli, Commands};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config_str, config_missing) = match std::fs::read_to_string(&cli.config) {
        Ok(s) => (s, false),
        Err(_) => (include_str!("../config/default.toml").to_string(), true),
    };
    let mut config: AppConfig = toml::from_str(&config_str)?;
    apply_env_overrides(&mut config);

    init_tracing(&config);
    if config_missing {
        warn!(path = %cli.config, "config file not found, using defaults");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.general.worker_threads.max(1))
        .enable_all()
        .build()?;

    let result = runtime.block_on(async_main(cli, config));
    // a canceled console prompt leaves a stdin read parked on the blocking pool
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn async_main(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Query { request } => {
            commands::query::run(config, &request).await?;
        }
        Commands::Check { request } => {
            commands::check::run(config, &request).await?;
        }
    }

    Ok(())
}

/// RUST_LOG wins, then SSOUI_LOGGING_LEVEL (0-3), then the config file
fn init_tracing(config: &AppConfig) {
    let fallback = std::env::var("SSOUI_LOGGING_LEVEL")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .map(|level| match level {
            0 => "error",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
        .map(|s| s.to_string())
        .unwrap_or_else(|| config.general.log_filter.clone());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(v) = std::env::var("SSOUI_HEADLESS") {
        config.web.headless = v != "0" && v.to_lowercase() != "false";
    }
    if let Ok(v) = std::env::var("SSOUI_LOAD_FAILURE_GRACE_MS") {
        if let Ok(ms) = v.parse::<u64>() {
            config.web.load_failure_grace_ms = ms;
        }
    }
    // Use CHROME_PATH env var if set (for Docker/custom installs)
    if let Ok(path) = std::env::var("CHROME_PATH") {
        config.web.chrome_path = Some(path);
    }
}
