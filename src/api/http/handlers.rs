// src/api/http/handlers.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

/// Health check handler: answers 503 when the database is unreachable.
pub async fn health_handler(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").execute(&app.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            error!("Health check database ping failed: {}", e);
            "unavailable"
        }
    };
    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database == "ok" { "healthy" } else { "degraded" },
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
            "llm": app.llm.name(),
            "timestamp": Utc::now().to_rfc3339()
        })),
    )
}
