//! Client configuration types.
//!
//! [`ClientConfig`] is the single source of truth for how the client reaches
//! the backend.  It can be built from the settings file and CLI arguments
//! (see `main.rs`) or from defaults, which match a backend started locally in
//! development mode.

use std::time::Duration;

/// Default port of a locally served backend.
pub const DEFAULT_PORT: u16 = 8082;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// All runtime configuration for a [`BridgeClient`](crate::BridgeClient).
///
/// # Example
///
/// ```rust
/// use wallet_bridge_client::ClientConfig;
///
/// let cfg = ClientConfig::default();
/// assert_eq!(cfg.api_url("accounts"), "http://127.0.0.1:8082/api/accounts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Hostname or IP address of the backend.
    pub host: String,

    /// TCP port of the backend's HTTP API.
    pub port: u16,

    /// Use `https`/`wss` instead of `http`/`ws`.
    pub tls: bool,

    /// API token sent as `Authorization: Basic {token}`.
    ///
    /// A backend in development mode accepts requests without one.
    pub token: Option<String>,

    /// How long a request may stay unanswered before it fails with
    /// [`ClientError::Timeout`](crate::ClientError::Timeout).  `None` waits
    /// forever.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    /// | Field           | Default       |
    /// |-----------------|---------------|
    /// | host            | `127.0.0.1`   |
    /// | port            | `8082`        |
    /// | tls             | `false`       |
    /// | token           | none          |
    /// | request_timeout | 30 seconds    |
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            tls: false,
            token: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Full URL of an API endpoint, e.g. `http://127.0.0.1:8082/api/config`.
    pub fn api_url(&self, endpoint: &str) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!(
            "{scheme}://{}:{}/api/{}",
            self.host,
            self.port,
            endpoint.trim_start_matches('/')
        )
    }

    /// URL of the push-event WebSocket.
    pub fn events_url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}/api/events", self.host, self.port)
    }

    /// Value of the `Authorization` header (and of the WebSocket auth frame).
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Basic {token}"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_backend() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8082);
        assert!(!cfg.tls);
    }

    #[test]
    fn test_default_request_timeout_is_30s() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_tls_switches_both_schemes() {
        let cfg = ClientConfig {
            tls: true,
            ..ClientConfig::default()
        };

        assert!(cfg.api_url("version").starts_with("https://"));
        assert!(cfg.events_url().starts_with("wss://"));
    }

    #[test]
    fn test_api_url_strips_leading_slash() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.api_url("/config"), "http://127.0.0.1:8082/api/config");
    }

    #[test]
    fn test_events_url() {
        let cfg = ClientConfig {
            host: "localhost".to_string(),
            port: 9000,
            ..ClientConfig::default()
        };
        assert_eq!(cfg.events_url(), "ws://localhost:9000/api/events");
    }

    #[test]
    fn test_authorization_header_value() {
        let mut cfg = ClientConfig::default();
        assert_eq!(cfg.authorization(), None);

        cfg.token = Some("s3cret".to_string());
        assert_eq!(cfg.authorization().as_deref(), Some("Basic s3cret"));
    }
}
