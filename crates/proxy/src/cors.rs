//! Browser access to the proxy, driven by `[server.cors]`.
//!
//! Each configured origin is one of:
//! - `*`: any origin
//! - `http://host:*`: that scheme and host on any numeric port
//! - anything else: matched byte for byte

use axum::http::{header, HeaderValue, Method};
use gb_domain::config::CorsConfig;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginRule {
    Any,
    /// Everything up to and including the `:` before the port.
    AnyPort(String),
    Exact(String),
}

impl OriginRule {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "*" {
            Self::Any
        } else if let Some(prefix) = raw.strip_suffix('*').filter(|p| p.ends_with(':')) {
            Self::AnyPort(prefix.to_string())
        } else {
            Self::Exact(raw.to_string())
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => origin == expected,
            Self::AnyPort(prefix) => origin
                .strip_prefix(prefix.as_str())
                .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        }
    }
}

/// Build the CORS layer for the proxy's routes.
pub fn layer(cfg: &CorsConfig) -> CorsLayer {
    let rules: Vec<OriginRule> = cfg
        .allowed_origins
        .iter()
        .map(|o| OriginRule::parse(o))
        .collect();

    let allow_origin = if rules.contains(&OriginRule::Any) {
        tracing::warn!("CORS allows every origin");
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|origin| rules.iter().any(|rule| rule.matches(origin)))
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
