use axum::extract::{Path, State};
use axum::response::Response;

use crate::{responses, sessions::SessionSnapshot, AppState};

/// Read the recorded turns of a chat session.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    tag = "Chat",
    params(("session_id" = String, Path, description = "Session key used on the chat channel")),
    responses(
        (status = 200, description = "Session history", body = SessionSnapshot),
        (status = 404, description = "Unknown session", body = crate::openapi::ProblemDetails)
    )
)]
pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.sessions().snapshot(&session_id).await {
        Some(snapshot) => responses::json_ok(snapshot),
        None => responses::not_found(format!("session `{session_id}` not found")),
    }
}
