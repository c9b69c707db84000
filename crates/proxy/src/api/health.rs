//! `GET /health`: liveness plus the state of the editor link.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let info = state.bridge.info();
    let uptime_secs = (chrono::Utc::now() - state.started_at).num_seconds().max(0);

    Json(serde_json::json!({
        "status": "ok",
        "connected": info.state == gb_bridge::ConnectionState::Connected,
        "state": info.state.as_str(),
        "endpoint": info.endpoint,
        "connected_at": info.connected_at,
        "pending": state.bridge.pending_calls(),
        "request_timeout_ms": state.config.bridge.request_timeout_ms,
        "uptime_secs": uptime_secs,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
