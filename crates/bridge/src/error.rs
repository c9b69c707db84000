//! Errors surfaced to callers of the bridge.

use std::time::Duration;

use gb_protocol::RemoteErrorPayload;
use serde::Serialize;
use serde_json::Value;

/// Why a call (or a connection attempt) did not produce a result.
///
/// Every variant is terminal for the call that raised it; the bridge never
/// retries on its own. `Clone` because one failed connection attempt is
/// reported to every caller that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to connect to editor: {0}")]
    Connection(String),

    #[error("editor connection closed: {0}")]
    ConnectionClosed(String),

    #[error("call `{method}` timed out after {}ms", .after.as_millis())]
    Timeout { method: String, after: Duration },

    #[error("editor error: {message}")]
    Remote {
        message: String,
        details: Option<Value>,
    },

    #[error("failed to send call: {0}")]
    Send(String),

    #[error("unexpected result shape: {0}")]
    Decode(String),

    #[error("config: {0}")]
    Config(String),
}

/// Coarse classification of a [`BridgeError`], for front-ends that map
/// failures onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    ConnectionClosed,
    Timeout,
    Remote,
    Send,
    Decode,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::ConnectionClosed => "connection_closed",
            Self::Timeout => "timeout",
            Self::Remote => "remote",
            Self::Send => "send",
            Self::Decode => "decode",
            Self::Config => "config",
        }
    }
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::ConnectionClosed(_) => ErrorKind::ConnectionClosed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::Send(_) => ErrorKind::Send,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<RemoteErrorPayload> for BridgeError {
    fn from(err: RemoteErrorPayload) -> Self {
        BridgeError::Remote {
            message: err.message,
            details: err.details,
        }
    }
}
