//! `gb-bridge`: request/response bridge to the Godot editor plugin.
//!
//! The editor exposes a single WebSocket. This crate owns that socket, turns
//! named calls into correlated `{id, method, params}` frames, and routes each
//! `{id, result | error}` reply back to the caller waiting for it.
//!
//! ```text
//!   caller ──call()──► EditorBridge ──ensure_connected()──► ConnectionManager
//!                          │                                    │ writer task ──► editor
//!                          └──register()──► Correlator ◄── reader task ◄──────── editor
//! ```
//!
//! - Calls time out individually (default 10s) and are never retried.
//! - A dropped link fails every pending call; the next call reconnects, or
//!   the background loop does under [`ReconnectPolicy::Active`].
//! - Responses with unknown ids are logged and dropped.

pub mod builder;
pub mod client;
pub mod connection;
pub mod correlator;
pub mod error;
pub mod reconnect;
pub mod transport;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::EditorBridgeBuilder;
pub use client::EditorBridge;
pub use connection::{ConnectionInfo, ConnectionManager, ConnectionOptions, ConnectionState};
pub use correlator::{Correlator, PendingHandle};
pub use error::{BridgeError, ErrorKind};
pub use reconnect::{BackoffSchedule, ReconnectBackoff, ReconnectPolicy};
pub use transport::{Connector, Link, TransportError, WsConnector};
