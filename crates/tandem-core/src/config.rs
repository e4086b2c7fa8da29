//! Client configuration loaded from environment variables.

/// Relay URL used when `TANDEM_RELAY_URL` is not set.
pub const DEFAULT_RELAY_URL: &str = "ws://localhost:4000/ws";

/// Settings for one whiteboard client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the relay (`ws://` or `wss://`).
    pub relay_url: String,
    /// Display name; generated when absent.
    pub user_name: Option<String>,
    /// Presence color; picked from the palette when absent.
    pub user_color: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            user_name: None,
            user_color: None,
        }
    }
}

impl ClientConfig {
    /// Load from `TANDEM_RELAY_URL`, `TANDEM_USER_NAME` and `TANDEM_USER_COLOR`.
    ///
    /// Blank values count as unset.
    pub fn from_env() -> Self {
        Self {
            relay_url: env_non_empty("TANDEM_RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
            user_name: env_non_empty("TANDEM_USER_NAME"),
            user_color: env_non_empty("TANDEM_USER_COLOR"),
        }
    }

    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = url.into();
        self
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
