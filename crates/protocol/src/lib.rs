//! Editor wire protocol: call frames exchanged with the Godot editor plugin
//! over its WebSocket, plus the catalogue of commands the plugin understands.
//!
//! Every WebSocket text message carries exactly one JSON document:
//!
//! ```text
//! bridge → editor   {"id": "…", "method": "select_node", "params": {…}}
//! editor → bridge   {"id": "…", "result": …}
//! editor → bridge   {"id": "…", "error": {"message": "…", "details": …}}
//! ```

pub mod commands;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use commands::{CommandCategory, CommandSpec, COMMANDS};

/// Errors raised while encoding or decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no id")]
    MissingId,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bridge → editor: invoke `method` with `params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    pub id: String,
    pub method: String,
    pub params: Value,
}

impl CallRequest {
    /// Build a request. A `null` params value is sent as `{}` since the
    /// editor plugin indexes into params unconditionally.
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        let params = if params.is_null() {
            Value::Object(Default::default())
        } else {
            params
        };
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error payload of a failed call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<'de> Deserialize<'de> for RemoteErrorPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older plugin builds send a bare string instead of an object.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Object {
                #[serde(default)]
                message: Option<String>,
                #[serde(default)]
                details: Option<Value>,
            },
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(message) => Self {
                message,
                details: None,
            },
            Wire::Object { message, details } => Self {
                message: message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Unknown error".into()),
                details,
            },
        })
    }
}

/// Editor → bridge: the answer to a [`CallRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteErrorPayload>,
}

impl CallResponse {
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(RemoteErrorPayload {
                message: message.into(),
                details,
            }),
        }
    }

    /// Parse one inbound text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            id: Option<Value>,
            #[serde(default)]
            result: Option<Value>,
            #[serde(default)]
            error: Option<RemoteErrorPayload>,
        }

        let raw: Raw = serde_json::from_str(text)?;
        let id = match raw.id {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(ProtocolError::MissingId),
        };

        Ok(Self {
            id,
            result: raw.result,
            error: raw.error,
        })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Split into the correlation id and the call outcome. An error payload
    /// wins over a result; a frame with neither resolves to `null`.
    pub fn into_outcome(self) -> (String, Result<Value, RemoteErrorPayload>) {
        let outcome = match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        };
        (self.id, outcome)
    }
}
