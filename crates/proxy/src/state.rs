use std::sync::Arc;

use chrono::{DateTime, Utc};
use gb_bridge::EditorBridge;
use gb_domain::config::Config;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bridge: EditorBridge,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Arc<Config>, bridge: EditorBridge) -> Self {
        Self {
            config,
            bridge,
            started_at: Utc::now(),
        }
    }
}
