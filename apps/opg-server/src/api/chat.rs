use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::StreamExt;

use crate::{chat, AppState};

/// Upgrade to the persistent chat channel.
///
/// Clients send `{"message", "session_id"?, "model"?}` as JSON text frames and
/// receive `user_message_received`, `ai_response` or `error` replies.
#[utoipa::path(
    get,
    path = "/ws/chat",
    tag = "Chat",
    responses(
        (status = 101, description = "Switching to WebSocket"),
        (status = 400, description = "Not a WebSocket upgrade request")
    )
)]
pub async fn chat_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (outbound, inbound) = socket.split();
        chat::run_channel(state, inbound, outbound).await;
    })
}
