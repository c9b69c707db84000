//! `POST /execute`: forward one call to the editor.
//!
//! Body: `{ "method": "<name>", "params": { ... } }` (params optional).
//! Responses:
//! - `200 { "result": ... }`
//! - `400` missing method or malformed body
//! - `502 { "error": { "message", "details" } }` the editor reported an error
//! - `503` editor unreachable or the link dropped mid-call
//! - `504` no answer within the request timeout
//! - `500` anything else

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gb_bridge::BridgeError;
use serde::Deserialize;
use serde_json::Value;

use super::api_error;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return api_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let Some(method) = req.method.filter(|m| !m.trim().is_empty()) else {
        return api_error(StatusCode::BAD_REQUEST, "Method is required");
    };

    let started = Instant::now();
    let outcome = state.bridge.call(&method, req.params).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            tracing::info!(method = %method, elapsed_ms, "execute ok");
            Json(serde_json::json!({ "result": result })).into_response()
        }
        Err(e) => {
            tracing::warn!(method = %method, elapsed_ms, kind = e.kind().as_str(), error = %e, "execute failed");
            error_response(e)
        }
    }
}

fn error_response(err: BridgeError) -> Response {
    match err {
        BridgeError::Remote { message, details } => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "error": { "message": message, "details": details },
            })),
        )
            .into_response(),
        other => api_error(status_for(&other), other.to_string()),
    }
}

/// HTTP status for a failed call.
pub fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::Connection(_) | BridgeError::ConnectionClosed(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        BridgeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        BridgeError::Remote { .. } => StatusCode::BAD_GATEWAY,
        BridgeError::Send(_) | BridgeError::Decode(_) | BridgeError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
