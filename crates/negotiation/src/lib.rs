// Negotiation engine
pub mod assembler;
pub mod dialog;
pub mod mode;
pub mod service;
pub mod session;
pub mod surface;
pub mod web_flow;

// Local surfaces used by the binary
pub mod browser;
pub mod console;
pub mod desktop;

#[cfg(test)]
pub(crate) mod fake;

pub use assembler::*;
pub use dialog::*;
pub use mode::*;
pub use service::*;
pub use session::*;
pub use surface::*;
pub use web_flow::*;

use std::time::Duration;

use signon_core::config::{AppConfig, SiteConfig};
use signon_parser::FieldSelectors;

#[derive(Debug, Clone)]
pub struct NegotiationConfig {
    pub dialog_title: String,
    pub load_failure_grace: Duration,
    pub max_auto_login_attempts: u32,
    pub sites: Vec<SiteConfig>,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            dialog_title: "Enter your credentials".to_string(),
            load_failure_grace: Duration::from_millis(3000),
            max_auto_login_attempts: 1,
            sites: Vec::new(),
        }
    }
}

impl From<&AppConfig> for NegotiationConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            dialog_title: config.dialog.default_title.clone(),
            load_failure_grace: Duration::from_millis(config.web.load_failure_grace_ms),
            max_auto_login_attempts: config.web.max_auto_login_attempts,
            sites: config.web.sites.clone(),
        }
    }
}

impl NegotiationConfig {
    /// Login field selectors configured for `host`, if any
    pub fn selectors_for_host(&self, host: &str) -> Option<FieldSelectors> {
        site_selectors(&self.sites, host)
    }
}

pub(crate) fn site_selectors(sites: &[SiteConfig], host: &str) -> Option<FieldSelectors> {
    sites
        .iter()
        .find(|s| s.host.eq_ignore_ascii_case(host))
        .map(|s| FieldSelectors {
            username: s.username_field.clone(),
            password: s.password_field.clone(),
            login_button: s.login_button.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_for_host() {
        let mut app = AppConfig::default();
        app.web.load_failure_grace_ms = 500;
        app.web.sites.push(SiteConfig {
            host: "Login.Example.com".into(),
            username_field: Some("#id".into()),
            password_field: Some("#pw".into()),
            login_button: None,
        });

        let config = NegotiationConfig::from(&app);
        assert_eq!(config.load_failure_grace, Duration::from_millis(500));

        let fields = config.selectors_for_host("login.example.com").unwrap();
        assert_eq!(fields.password.as_deref(), Some("#pw"));
        assert!(fields.login_button.is_none());
        assert!(config.selectors_for_host("example.com").is_none());
    }
}
