use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Wildcard CORS unless `PERSONA_CORS_ORIGINS` lists explicit origins.
pub fn cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let base = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    let origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins)
    }
}
