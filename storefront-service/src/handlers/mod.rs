pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod oauth;
pub mod orders;
pub mod phonepe;
pub mod razorpay;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// Liveness
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": state.config.service_name,
            "version": state.config.service_version,
        })),
    )
}

/// Readiness: the store must answer.
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Ready to serve traffic"),
        (status = 503, description = "Store unreachable")
    ),
    tag = "Health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.categories.list().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        crate::services::metrics::get_metrics(),
    )
}
