//! Routes for the detective's guessing rounds.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use runaway_core::identity::SessionId;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use runaway_session::application::query_handlers::{self, GuessingProgressView};
use runaway_session::application::turns;
use runaway_session::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{session_id}/guesses.
#[derive(Debug, Deserialize)]
pub struct GuessRequest {
    /// The player's clue.
    pub indication: String,
}

/// Response body for a guessing round. Never carries the passcode.
#[derive(Debug, Serialize)]
pub struct GuessResponse {
    /// The detective's guess.
    pub guess: String,
    /// The detective's reasoning.
    pub thoughts: String,
    /// Closeness to the passcode, in `[0, 1]`.
    pub score: f64,
    /// The wagon the round was played in.
    pub wagon_id: u32,
}

/// POST /{session_id}/guesses
#[instrument(skip(state, request), fields(session_id = %session_id))]
async fn submit_indication(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(request): Json<GuessRequest>,
) -> Result<Json<GuessResponse>, ApiError> {
    let command = commands::SubmitIndication {
        correlation_id: Uuid::new_v4(),
        session_id,
        indication: request.indication,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_indication command");

    let outcome = turns::handle_guess_turn(
        &command,
        &state.sessions,
        state.collaborators(),
        state.clock.as_ref(),
    )
    .await?;

    Ok(Json(GuessResponse {
        guess: outcome.guess,
        thoughts: outcome.thoughts,
        score: outcome.score,
        wagon_id: outcome.wagon_id,
    }))
}

/// GET /{session_id}/guesses
#[instrument(skip(state), fields(session_id = %session_id))]
async fn get_progress(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<GuessingProgressView>, ApiError> {
    let progress = query_handlers::get_guessing_progress(session_id, &state.sessions).await?;
    Ok(Json(progress))
}

/// Returns the guessing routes, scoped under a session.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{session_id}/guesses",
        post(submit_indication).get(get_progress),
    )
}
