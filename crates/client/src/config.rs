use serde::{Deserialize, Serialize};

/// Connection settings for the helpdesk API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// API root, including the `/api` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}
