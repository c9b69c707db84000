//! The call interface: `call(method, params) -> result`.

use std::time::Duration;

use gb_domain::config::BridgeConfig;
use gb_protocol::CallRequest;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::builder::EditorBridgeBuilder;
use crate::connection::{ConnectionInfo, ConnectionManager, ConnectionState};
use crate::correlator::Correlator;
use crate::error::BridgeError;

/// Handle to the editor. Cheap to clone; every clone shares one connection
/// and one table of in-flight calls, so it can be handed to as many
/// concurrent callers as needed.
///
/// Create via [`EditorBridgeBuilder`].
#[derive(Clone)]
pub struct EditorBridge {
    connection: ConnectionManager,
    correlator: Correlator,
}

impl EditorBridge {
    /// Start a new builder.
    pub fn builder() -> EditorBridgeBuilder {
        EditorBridgeBuilder::new()
    }

    /// Build from a `[bridge]` config table.
    pub fn from_config(cfg: &BridgeConfig) -> Result<Self, BridgeError> {
        EditorBridgeBuilder::new().config(cfg).build()
    }

    pub(crate) fn from_parts(connection: ConnectionManager, correlator: Correlator) -> Self {
        Self {
            connection,
            correlator,
        }
    }

    /// Try to connect up front. Failure is logged, not returned: the next
    /// call retries (or the background loop does, under the active policy).
    pub async fn start(&self) {
        match self.connection.start().await {
            Ok(()) => tracing::info!(endpoint = %self.endpoint(), "editor bridge started"),
            Err(e) => tracing::warn!(
                endpoint = %self.endpoint(),
                error = %e,
                "editor not reachable yet, will retry on next call"
            ),
        }
    }

    /// Close the link and fail everything in flight.
    pub fn stop(&self) {
        self.connection.disconnect_all();
    }

    /// Invoke `method` on the editor and wait for its result.
    ///
    /// `params` is forwarded as-is (`null` is sent as `{}`).
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        if !self.connection.is_connected() {
            self.connection.ensure_connected().await?;
        }

        let mut handle = self.correlator.register(method);
        let frame = CallRequest::new(handle.id(), method, params)
            .encode()
            .map_err(|e| BridgeError::Send(e.to_string()))?;

        tracing::debug!(id = %handle.id(), method, "sending call");
        // A stalled writer can keep the outbound queue full. The call's own
        // deadline (or a teardown) still ends the wait for queue space.
        tokio::select! {
            sent = self.connection.send(frame) => {
                if let Err(e) = sent {
                    tracing::warn!(id = %handle.id(), method, error = %e, "failed to send call");
                    self.correlator.cancel(handle.id());
                    return Err(e);
                }
            }
            outcome = handle.settled() => {
                tracing::debug!(id = %handle.id(), method, "call settled before it was queued");
                return outcome;
            }
        }

        handle.wait().await
    }

    /// [`call`](Self::call), deserializing the result into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, BridgeError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| BridgeError::Decode(format!("{method}: {e}")))
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn info(&self) -> ConnectionInfo {
        self.connection.info()
    }

    /// Number of calls awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.correlator.pending_count()
    }

    pub fn request_timeout(&self) -> Duration {
        self.correlator.timeout()
    }

    pub fn endpoint(&self) -> &str {
        self.connection.endpoint()
    }

    /// The underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
}
