//! Hub connection configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::HassError;

/// Configuration for the hub connection (`[hub]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HassConfig {
    /// Base URL of the hub, e.g. `http://homeassistant.local:8123`.
    pub url: String,
    /// Long-lived access token.
    pub token: String,
    /// Timeout applied to every REST request, in seconds.
    pub request_timeout_secs: u64,
    /// Delay before reopening a dropped websocket, in seconds.
    pub reconnect_delay_secs: u64,
}

impl Default for HassConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            token: String::new(),
            request_timeout_secs: 15,
            reconnect_delay_secs: 2,
        }
    }
}

impl HassConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// The websocket endpoint derived from the base URL
    /// (`http` → `ws`, `https` → `wss`).
    ///
    /// # Errors
    ///
    /// Returns [`HassError::InvalidUrl`] when the URL is neither `http://`
    /// nor `https://`.
    pub fn websocket_url(&self) -> Result<String, HassError> {
        let base = self.base_url();
        let endpoint = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(HassError::InvalidUrl(self.url.clone()));
        };
        Ok(format!("{endpoint}/api/websocket"))
    }
}
