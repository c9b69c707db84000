//! Builder pattern for constructing an [`EditorBridge`].

use std::sync::Arc;
use std::time::Duration;

use gb_domain::config::BridgeConfig;

use crate::client::EditorBridge;
use crate::connection::{ConnectionManager, ConnectionOptions};
use crate::correlator::Correlator;
use crate::error::BridgeError;
use crate::reconnect::ReconnectPolicy;
use crate::transport::{Connector, WsConnector};

/// Fluent builder for [`EditorBridge`].
///
/// # Example
///
/// ```rust,no_run
/// # use gb_bridge::EditorBridgeBuilder;
/// # use std::time::Duration;
/// let bridge = EditorBridgeBuilder::new()
///     .endpoint("ws://localhost:8090/mcp_godot")
///     .request_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// ```
pub struct EditorBridgeBuilder {
    endpoint: String,
    connector: Option<Arc<dyn Connector>>,
    connect_timeout: Duration,
    request_timeout: Duration,
    max_frame_bytes: usize,
    policy: ReconnectPolicy,
}

impl EditorBridgeBuilder {
    pub fn new() -> Self {
        Self {
            endpoint: "ws://localhost:8090/mcp_godot".into(),
            connector: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            max_frame_bytes: 16 * 1024 * 1024, // 16 MB
            policy: ReconnectPolicy::Passive,
        }
    }

    /// Take every setting from a `[bridge]` config table, resolving the
    /// endpoint through its environment overrides.
    pub fn config(self, cfg: &BridgeConfig) -> Self {
        self.endpoint(cfg.endpoint_url())
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .request_timeout(Duration::from_millis(cfg.request_timeout_ms))
            .max_frame_bytes(cfg.max_frame_bytes)
            .reconnect(ReconnectPolicy::from_config(&cfg.reconnect))
    }

    // ── Endpoint ─────────────────────────────────────────────────────

    /// Set the editor WebSocket URL (e.g. `ws://localhost:8090/mcp_godot`).
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Use a custom transport instead of a WebSocket to `endpoint`.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Bound on a single connection attempt (default 10s).
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// Per-call deadline (default 10s).
    pub fn request_timeout(mut self, d: Duration) -> Self {
        self.request_timeout = d;
        self
    }

    /// Inbound frames above this size are dropped (default 16 MB).
    pub fn max_frame_bytes(mut self, n: usize) -> Self {
        self.max_frame_bytes = n;
        self
    }

    /// What to do after the link drops (default passive).
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the [`EditorBridge`]. Does not connect.
    pub fn build(self) -> Result<EditorBridge, BridgeError> {
        if self.connector.is_none() && self.endpoint.trim().is_empty() {
            return Err(BridgeError::Config("endpoint is required".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(BridgeError::Config("connect_timeout must be non-zero".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(BridgeError::Config("request_timeout must be non-zero".into()));
        }

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector::new(self.endpoint)));
        let correlator = Correlator::new(self.request_timeout);
        let connection = ConnectionManager::new(
            connector,
            correlator.clone(),
            ConnectionOptions {
                connect_timeout: self.connect_timeout,
                max_frame_bytes: self.max_frame_bytes,
                policy: self.policy,
            },
        );

        Ok(EditorBridge::from_parts(connection, correlator))
    }
}

impl Default for EditorBridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gb_domain::config::ReconnectMode;

    #[test]
    fn rejects_empty_endpoint() {
        let err = EditorBridgeBuilder::new().endpoint("  ").build().err().unwrap();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn rejects_zero_timeouts() {
        assert!(EditorBridgeBuilder::new()
            .request_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(EditorBridgeBuilder::new()
            .connect_timeout(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn builds_from_config() {
        let mut cfg = BridgeConfig {
            host: "127.0.0.1".into(),
            port: 9123,
            request_timeout_ms: 2_500,
            ..Default::default()
        };
        // Point the env overrides at names nobody sets.
        cfg.port_env = "GB_TEST_UNSET_PORT".into();
        cfg.url_env = "GB_TEST_UNSET_URL".into();
        cfg.reconnect.mode = ReconnectMode::Active;

        let bridge = EditorBridgeBuilder::new().config(&cfg).build().unwrap();
        assert_eq!(bridge.endpoint(), "ws://127.0.0.1:9123/mcp_godot");
        assert_eq!(bridge.request_timeout(), Duration::from_millis(2_500));
        assert_eq!(bridge.pending_calls(), 0);
    }
}
