//! External assignment service configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Location and timeouts of the external execution/preview service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for preview calls in seconds.
    #[serde(default = "default_preview_timeout")]
    pub preview_timeout_seconds: u64,
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl BackendConfig {
    /// Timeout for preview calls.
    pub fn preview_timeout(&self) -> Duration {
        Duration::from_secs(self.preview_timeout_seconds)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            preview_timeout_seconds: default_preview_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_preview_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}
