//! Transport seam: something that opens a bidirectional text-frame link to
//! the editor.
//!
//! The bridge only ever sees [`Link`]s: a sink of outbound frames and a
//! stream of inbound ones. [`WsConnector`] is the production implementation
//! on top of `tokio-tungstenite`.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;

/// Outbound half of a link.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Inbound half of a link. Ends when the remote side closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An open connection to the editor.
pub struct Link {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Errors that can occur on the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("binary frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("link closed")]
    Closed,
}

/// Opens links to a single endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a new link. Called once per connection attempt.
    async fn connect(&self) -> Result<Link, TransportError>;

    /// Human-readable endpoint, for logs and health output.
    fn endpoint(&self) -> &str;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// WebSocket connector
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connects to the editor plugin's WebSocket server
/// (e.g. `ws://localhost:8090/mcp_godot`).
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Link, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (sink, stream) = ws.split();

        let sink = sink.with(|text: String| {
            future::ready(Ok::<_, TransportError>(Message::Text(text)))
        });

        // Control frames are answered by tungstenite itself; only data
        // frames reach the bridge.
        let stream = stream.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    Some(String::from_utf8(bytes).map_err(|_| TransportError::InvalidUtf8))
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "editor sent close frame");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::from(e))),
            })
        });

        Ok(Link {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
