//! `GET /commands`: the catalogue of known editor commands.

use axum::response::{IntoResponse, Json};
use gb_protocol::COMMANDS;

pub async fn list_commands() -> impl IntoResponse {
    Json(serde_json::json!({
        "commands": COMMANDS,
        "count": COMMANDS.len(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    use crate::api::test_support::{app, send};

    #[tokio::test]
    async fn lists_the_catalogue() {
        let req = Request::builder().uri("/commands").body(Body::empty()).unwrap();
        let (status, body) = send(app("ws://127.0.0.1:9/mcp_godot"), req).await;

        assert_eq!(status, StatusCode::OK);
        let commands = body["commands"].as_array().unwrap();
        assert_eq!(commands.len(), gb_protocol::COMMANDS.len());
        assert!(commands
            .iter()
            .any(|c| c["name"] == "select_node" && c["category"] == "node"));
    }
}
