use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            worker_threads: default_worker_threads(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DialogConfig {
    #[serde(default = "default_dialog_title")]
    pub default_title: String,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            default_title: default_dialog_title(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default)]
    pub headless: bool,
    pub chrome_path: Option<String>,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    pub user_agent: Option<String>,
    /// How long a failed load may wait for a follow-up load before the flow fails
    #[serde(default = "default_load_failure_grace_ms")]
    pub load_failure_grace_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_auto_login_attempts")]
    pub max_auto_login_attempts: u32,
    /// Per-host login form selectors
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            load_failure_grace_ms: default_load_failure_grace_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_auto_login_attempts: default_max_auto_login_attempts(),
            sites: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub host: String,
    pub username_field: Option<String>,
    pub password_field: Option<String>,
    pub login_button: Option<String>,
}

fn default_log_filter() -> String { "info".to_string() }
fn default_worker_threads() -> usize { 4 }
fn default_dialog_title() -> String { "Enter your credentials".to_string() }
fn default_window_width() -> u32 { 800 }
fn default_window_height() -> u32 { 600 }
fn default_load_failure_grace_ms() -> u64 { 3000 }
fn default_poll_interval_ms() -> u64 { 250 }
fn default_max_auto_login_attempts() -> u32 { 1 }
