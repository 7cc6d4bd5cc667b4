//! Persistent chat channel: one JSON message in, an acknowledgement plus an
//! inverted reply (or an error) out, with every turn recorded per session.

use std::fmt::Display;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use opg_core::DEFAULT_SESSION_ID;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::inversion::MutationOptions;
use crate::sessions::Role;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ChannelReply {
    UserMessageReceived {
        message: String,
        session_id: String,
    },
    AiResponse {
        message: String,
        session_id: String,
        history_length: usize,
    },
    Error {
        error: String,
    },
}

impl ChannelReply {
    fn error(msg: impl Into<String>) -> Self {
        ChannelReply::Error { error: msg.into() }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("chat channel closed: {0}")]
pub(crate) struct ChannelClosed(String);

/// Drive one connection until the peer closes it or a frame cannot be read or
/// written. Messages are handled strictly one at a time.
pub(crate) async fn run_channel<S, W>(state: AppState, mut inbound: S, mut outbound: W)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    info!(target: "opg::chat", "chat channel opened");
    while let Some(frame) = inbound.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!(target: "opg::chat", error = %err, "chat channel read failed");
                break;
            }
        };
        let outcome = match frame {
            Message::Text(text) => handle_message(&state, text.as_str(), &mut outbound).await,
            Message::Binary(_) => {
                send(
                    &mut outbound,
                    &ChannelReply::error("binary frames are not supported; send JSON text"),
                )
                .await
            }
            Message::Ping(_) | Message::Pong(_) => Ok(()),
            Message::Close(_) => break,
        };
        if let Err(err) = outcome {
            debug!(target: "opg::chat", error = %err, "stopping chat channel");
            break;
        }
    }
    let _ = outbound.close().await;
    let sessions = state.sessions().session_count().await;
    info!(target: "opg::chat", sessions, "chat channel closed");
}

async fn handle_message<W>(
    state: &AppState,
    text: &str,
    outbound: &mut W,
) -> Result<(), ChannelClosed>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let request: ChannelRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(err) => {
            return send(outbound, &ChannelReply::error(format!("invalid message: {err}"))).await;
        }
    };
    let session_id = request
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
    let model = request
        .model
        .unwrap_or_else(|| state.default_model().to_string());

    state
        .sessions()
        .append(&session_id, Role::User, &request.message)
        .await;
    send(
        outbound,
        &ChannelReply::UserMessageReceived {
            message: request.message.clone(),
            session_id: session_id.clone(),
        },
    )
    .await?;

    let reply = match state
        .inversion()
        .invert(&request.message, &model, &MutationOptions::default())
        .await
    {
        Ok(inverted) => {
            let history_length = state
                .sessions()
                .append(&session_id, Role::Assistant, &inverted)
                .await;
            ChannelReply::AiResponse {
                message: inverted,
                session_id,
                history_length,
            }
        }
        Err(err) => {
            let turns = state.sessions().turn_count(&session_id).await;
            warn!(
                target: "opg::chat",
                session_id = %session_id,
                model = %model,
                turns,
                error = %err,
                "chat turn failed"
            );
            ChannelReply::error(err.to_string())
        }
    };
    send(outbound, &reply).await
}

async fn send<W>(outbound: &mut W, reply: &ChannelReply) -> Result<(), ChannelClosed>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let payload = serde_json::to_string(reply).map_err(|e| ChannelClosed(e.to_string()))?;
    outbound
        .send(Message::Text(payload.into()))
        .await
        .map_err(|e| ChannelClosed(e.to_string()))
}
