mod bridge;
mod server;

pub use bridge::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins",
            ));
        }

        let bridge = &self.bridge;
        if bridge.host.is_empty() {
            errors.push(ConfigError::error("bridge.host", "host must not be empty"));
        }
        if bridge.port == 0 {
            errors.push(ConfigError::error("bridge.port", "port must be greater than 0"));
        }
        if bridge.connect_timeout_ms == 0 {
            errors.push(ConfigError::error(
                "bridge.connect_timeout_ms",
                "must be greater than 0",
            ));
        }
        if bridge.request_timeout_ms == 0 {
            errors.push(ConfigError::error(
                "bridge.request_timeout_ms",
                "must be greater than 0",
            ));
        } else if bridge.request_timeout_ms < 1_000 {
            errors.push(ConfigError::warning(
                "bridge.request_timeout_ms",
                "under one second; slow editor operations will time out",
            ));
        }
        if bridge.max_frame_bytes == 0 {
            errors.push(ConfigError::error("bridge.max_frame_bytes", "must be greater than 0"));
        }

        let rc = &bridge.reconnect;
        if rc.backoff_factor < 1.0 || !rc.backoff_factor.is_finite() {
            errors.push(ConfigError::error(
                "bridge.reconnect.backoff_factor",
                "must be a finite number >= 1.0",
            ));
        }
        if rc.max_delay_ms < rc.initial_delay_ms {
            errors.push(ConfigError::warning(
                "bridge.reconnect.max_delay_ms",
                "smaller than initial_delay_ms; every retry will use max_delay_ms",
            ));
        }
        if rc.mode == ReconnectMode::Active && rc.initial_delay_ms == 0 {
            errors.push(ConfigError::warning(
                "bridge.reconnect.initial_delay_ms",
                "zero delay makes active reconnect spin while the editor is down",
            ));
        }

        errors
    }
}
