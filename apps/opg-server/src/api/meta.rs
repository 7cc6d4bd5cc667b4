use axum::response::IntoResponse;
use serde_json::json;

/// Health probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Meta",
    description = "Liveness probe; never touches the model.",
    responses(
        (status = 200, description = "Service healthy", body = crate::openapi::HealthOk)
    )
)]
pub async fn health() -> impl IntoResponse {
    crate::responses::json_ok(json!({"status": "ok"}))
}
