use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

pub fn json_ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// Problem-details style error body.
pub fn problem(status: StatusCode, title: &str, detail: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "type": "about:blank",
            "title": title,
            "status": status.as_u16(),
            "detail": detail.into(),
        })),
    )
        .into_response()
}

pub fn not_found(detail: impl Into<String>) -> Response {
    problem(StatusCode::NOT_FOUND, "Not Found", detail)
}

pub fn unprocessable(detail: impl Into<String>) -> Response {
    problem(StatusCode::UNPROCESSABLE_ENTITY, "Unprocessable Entity", detail)
}

pub fn internal(detail: impl Into<String>) -> Response {
    problem(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        detail,
    )
}

/// Rewrite axum's JSON extractor rejection into the problem shape, keeping its status.
pub fn json_rejection(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let title = status.canonical_reason().unwrap_or("Bad Request");
    problem(status, title, rejection.body_text())
}
