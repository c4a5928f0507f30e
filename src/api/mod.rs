// src/api/mod.rs

pub mod error;
pub mod http;

pub use error::{ApiError, ApiResult};

use axum::Router;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::state::AppState;

/// Full application: the REST API under /api with request tracing and CORS.
pub fn build_app(app_state: Arc<AppState>, cors_origin: &str) -> Router {
    Router::new()
        .nest("/api", http::http_router(app_state))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<axum::http::HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            warn!("Invalid CORS origin '{}' ({}), allowing any origin", origin, e);
            layer.allow_origin(Any)
        }
    }
}
