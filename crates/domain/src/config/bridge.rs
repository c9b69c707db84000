use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Editor bridge
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where and how to reach the editor's WebSocket endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_8090")]
    pub port: u16,
    #[serde(default = "d_path")]
    pub path: String,
    /// Environment variable that overrides `port` when set to a valid port.
    #[serde(default = "d_port_env")]
    pub port_env: String,
    /// Environment variable that overrides the whole endpoint URL.
    /// Takes precedence over `port_env`.
    #[serde(default = "d_url_env")]
    pub url_env: String,
    /// Bound on a single connection attempt.
    #[serde(default = "d_10000u")]
    pub connect_timeout_ms: u64,
    /// Deadline for each call, measured from registration.
    #[serde(default = "d_10000u")]
    pub request_timeout_ms: u64,
    /// Inbound frames larger than this are dropped before parsing.
    #[serde(default = "d_max_frame_bytes")]
    pub max_frame_bytes: usize,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: 8090,
            path: d_path(),
            port_env: d_port_env(),
            url_env: d_url_env(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 10_000,
            max_frame_bytes: d_max_frame_bytes(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Resolve the endpoint URL, honouring the environment overrides.
    pub fn endpoint_url(&self) -> String {
        self.endpoint_url_with(|key| std::env::var(key).ok())
    }

    /// Same as [`endpoint_url`](Self::endpoint_url) with an injectable
    /// environment lookup.
    pub fn endpoint_url_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(&self.url_env).filter(|u| !u.trim().is_empty()) {
            return url.trim().to_string();
        }

        let port = lookup(&self.port_env)
            .and_then(|p| p.trim().parse::<u16>().ok())
            .filter(|p| *p != 0)
            .unwrap_or(self.port);

        let path = if self.path.is_empty() || self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("ws://{}:{}{}", self.host, port, path)
    }
}

/// What the bridge does after the editor connection drops unexpectedly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectMode {
    /// Wait until the next call needs the connection.
    #[default]
    Passive,
    /// Keep retrying in the background with backoff.
    Active,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub mode: ReconnectMode,
    #[serde(default = "d_5000u")]
    pub initial_delay_ms: u64,
    #[serde(default = "d_60000u")]
    pub max_delay_ms: u64,
    /// `1.0` gives a fixed delay.
    #[serde(default = "d_factor")]
    pub backoff_factor: f64,
    /// `0` means retry forever.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            mode: ReconnectMode::Passive,
            initial_delay_ms: 5_000,
            max_delay_ms: 60_000,
            backoff_factor: 2.0,
            max_attempts: 0,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_host() -> String {
    "localhost".into()
}
fn d_8090() -> u16 {
    8090
}
fn d_path() -> String {
    "/mcp_godot".into()
}
fn d_port_env() -> String {
    "GODOT_PORT".into()
}
fn d_url_env() -> String {
    "GODOT_BRIDGE_URL".into()
}
fn d_10000u() -> u64 {
    10_000
}
fn d_5000u() -> u64 {
    5_000
}
fn d_60000u() -> u64 {
    60_000
}
fn d_factor() -> f64 {
    2.0
}
fn d_max_frame_bytes() -> usize {
    16 * 1024 * 1024
}
