//! CORS middleware configuration.

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Custom request headers clients send to the Lif API.
const LIF_HEADERS: [&str; 6] = [
    "username",
    "token",
    "access-token",
    "accesstoken",
    "accounts",
    "subject",
];

fn allowed_headers() -> Vec<HeaderName> {
    let mut headers = vec![CONTENT_TYPE, ACCEPT];
    headers.extend(LIF_HEADERS.into_iter().map(HeaderName::from_static));
    headers
}

/// Create a CORS layer from configuration.
///
/// Without configured origins any origin is allowed and credentials are
/// not. With origins, only those origins may send cookies.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let parsed_origins: Vec<HeaderValue> =
        origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, allowing any origin");
        }
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(allowed_headers())
            .allow_credentials(true)
            .allow_origin(parsed_origins)
    }
}
