pub mod commands;
pub mod execute;
pub mod health;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router. Layers and state are applied by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/commands", get(commands::list_commands))
        .route("/execute", post(execute::execute))
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use gb_bridge::EditorBridgeBuilder;
    use gb_domain::config::Config;
    use tower::ServiceExt;

    use crate::state::AppState;

    /// App pointed at `endpoint`, which nothing needs to be listening on.
    pub fn app(endpoint: &str) -> Router {
        let bridge = EditorBridgeBuilder::new()
            .endpoint(endpoint)
            .connect_timeout(std::time::Duration::from_millis(500))
            .build()
            .unwrap();
        super::router().with_state(AppState::new(Arc::new(Config::default()), bridge))
    }

    pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        let parsed = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, parsed)
    }
}
