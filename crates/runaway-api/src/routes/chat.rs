//! Routes for talking to passengers.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use runaway_core::identity::SessionId;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use runaway_session::application::query_handlers::{self, ConversationView};
use runaway_session::application::turns;
use runaway_session::domain::commands;
use runaway_session::domain::session::Message;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{session_id}/chat/{uid}.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// What the player says.
    pub message: String,
}

/// Response body for a chat turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The passenger that answered.
    pub uid: String,
    /// The reply text.
    pub reply: String,
    /// Base64-encoded mp3 of the reply; empty when speech is unavailable.
    pub audio: String,
    /// When the reply was stored.
    pub timestamp: DateTime<Utc>,
}

/// Response body for the conversation history.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// The passenger.
    pub uid: String,
    /// Messages in insertion order; empty when nothing was said yet.
    pub messages: Vec<Message>,
}

/// POST /{session_id}/chat/{uid}
#[instrument(skip(state, request), fields(session_id = %session_id, uid = %uid))]
async fn send_message(
    State(state): State<AppState>,
    Path((session_id, uid)): Path<(SessionId, String)>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let command = commands::SendChatMessage {
        correlation_id: Uuid::new_v4(),
        session_id,
        uid,
        message: request.message,
    };

    info!(correlation_id = %command.correlation_id, "handling send_chat_message command");

    let outcome = turns::handle_chat_turn(
        &command,
        &state.sessions,
        state.collaborators(),
        state.clock.as_ref(),
    )
    .await?;

    Ok(Json(ChatResponse {
        uid: outcome.uid.to_string(),
        reply: outcome.reply,
        audio: STANDARD.encode(&outcome.audio),
        timestamp: outcome.timestamp,
    }))
}

/// GET /{session_id}/chat/{uid}/history
#[instrument(skip(state), fields(session_id = %session_id, uid = %uid))]
async fn get_history(
    State(state): State<AppState>,
    Path((session_id, uid)): Path<(SessionId, String)>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let conversation = query_handlers::get_conversation(session_id, &uid, &state.sessions).await?;
    let messages = conversation
        .map(|ConversationView { messages, .. }| messages)
        .unwrap_or_default();

    Ok(Json(HistoryResponse { uid, messages }))
}

/// Returns the chat routes, scoped under a session.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{session_id}/chat/{uid}", post(send_message))
        .route("/{session_id}/chat/{uid}/history", get(get_history))
}
