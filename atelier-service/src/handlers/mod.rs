//! HTTP handlers for the atelier backend.

pub mod analytics;
pub mod bills;
pub mod customers;
pub mod finance;
pub mod inventory;
pub mod links;
pub mod maintenance;
pub mod orders;
pub mod settings;
pub mod staff;
pub mod uploads;
pub mod work_descriptions;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "atelier-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready" })),
        ),
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::services::get_metrics(),
    )
}
