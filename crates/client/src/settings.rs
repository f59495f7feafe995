//! Client settings.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading [`Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse settings")]
    Parse(#[from] serde_norway::Error),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Runtime tunables for the browser client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Prefix for API paths; empty means same origin.
    pub api_base: String,

    /// Timeout for callback-style requests.
    pub request_timeout_ms: u64,

    /// Default timeout for [`ApiClient::fetch`](crate::request::ApiClient::fetch).
    pub promise_timeout_ms: u64,

    /// Entries an alert list keeps; zero or less keeps everything.
    pub alert_max: i32,

    /// Delay before a page reloads after a state-changing action.
    pub reload_delay_ms: u64,

    /// Delay before an input is focused after it becomes visible.
    pub focus_delay_ms: u64,

    /// The home footer only appears once this many recent items are listed.
    pub recent_footer_threshold: usize,

    /// Tracing filter directive.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            request_timeout_ms: 10_000,
            promise_timeout_ms: 5_000,
            alert_max: 3,
            reload_delay_ms: 3_000,
            focus_delay_ms: 300,
            recent_footer_threshold: 5,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the YAML is malformed, names an unknown key, or
    /// sets a timeout to zero.
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let settings: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_norway::from_str(yaml)?
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Zero`] naming the first zero duration.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.request_timeout_ms == 0 {
            return Err(SettingsError::Zero("request_timeout_ms"));
        }

        if self.promise_timeout_ms == 0 {
            return Err(SettingsError::Zero("promise_timeout_ms"));
        }

        if self.reload_delay_ms == 0 {
            return Err(SettingsError::Zero("reload_delay_ms"));
        }

        Ok(())
    }

    /// Timeout for callback-style requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Default timeout for promise-style requests.
    #[must_use]
    pub const fn promise_timeout(&self) -> Duration {
        Duration::from_millis(self.promise_timeout_ms)
    }

    /// Delay before a scheduled reload.
    #[must_use]
    pub const fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    /// Delay before a deferred focus.
    #[must_use]
    pub const fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }

    /// Join the configured base with an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base.trim_end_matches('/'))
    }
}
