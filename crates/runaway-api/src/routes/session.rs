//! Routes for the Session & Wagon Progress bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use runaway_core::identity::SessionId;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use runaway_session::application::query_handlers::{self, SessionView};
use runaway_session::application::command_handlers;
use runaway_session::domain::commands;

use crate::error::ApiError;
use crate::routes::{chat, guess};
use crate::state::AppState;

/// Response body for POST /{session_id}/advance.
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    /// The advanced session.
    pub session_id: SessionId,
    /// Index of the wagon the session is now in.
    pub wagon_id: u32,
    /// Theme of the new wagon.
    pub theme: String,
}

/// Response body for DELETE /{session_id}.
#[derive(Debug, Serialize)]
pub struct TerminateResponse {
    /// The terminated session.
    pub session_id: SessionId,
    /// Always `"terminated"`.
    pub status: &'static str,
}

/// POST /
#[instrument(skip(state))]
async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let command = commands::CreateSession {
        correlation_id: Uuid::new_v4(),
    };

    info!(correlation_id = %command.correlation_id, "handling create_session command");

    let session =
        command_handlers::handle_create_session(&command, &state.sessions, state.catalog.as_ref())
            .await;

    info!(session_id = %session.session_id, "created session");
    (StatusCode::CREATED, Json(SessionView::from(&session)))
}

/// GET /{session_id}
#[instrument(skip(state), fields(session_id = %session_id))]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session_view(session_id, &state.sessions).await?;
    Ok(Json(view))
}

/// DELETE /{session_id}
#[instrument(skip(state), fields(session_id = %session_id))]
async fn terminate_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<TerminateResponse>, ApiError> {
    let command = commands::TerminateSession {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling terminate_session command");

    command_handlers::handle_terminate_session(&command, &state.sessions).await?;

    Ok(Json(TerminateResponse {
        session_id,
        status: "terminated",
    }))
}

/// POST /{session_id}/advance
#[instrument(skip(state), fields(session_id = %session_id))]
async fn advance_wagon(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<AdvanceResponse>, ApiError> {
    let command = commands::AdvanceWagon {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling advance_wagon command");

    let outcome =
        command_handlers::handle_advance_wagon(&command, &state.sessions, state.catalog.as_ref())
            .await?;

    Ok(Json(AdvanceResponse {
        session_id,
        wagon_id: outcome.wagon_id,
        theme: outcome.theme,
    }))
}

/// Returns the router for the session context, including the chat and
/// guessing routes scoped under a session.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{session_id}", get(get_session).delete(terminate_session))
        .route("/{session_id}/advance", post(advance_wagon))
        .merge(chat::router())
        .merge(guess::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use runaway_core::catalog::WagonCatalog;
    use runaway_test_support::{
        FailingWagonCatalog, FixedClock, FixedScorer, RecordingGuessGenerator, StaticWagonCatalog,
        StubDialogueGenerator, StubSpeech,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_state_with(catalog: Arc<dyn WagonCatalog>) -> AppState {
        AppState::new(
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())),
            catalog,
            Arc::new(StubDialogueGenerator::new("Hello.")),
            Arc::new(RecordingGuessGenerator::new("Nostromo", "A ship.")),
            Arc::new(FixedScorer(0.5)),
            Arc::new(StubSpeech(Vec::new())),
        )
    }

    fn test_app_state() -> AppState {
        app_state_with(Arc::new(StaticWagonCatalog::with_wagons(2)))
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    #[tokio::test]
    async fn test_create_session_returns_201_with_view() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, json) = send(app, "POST", "/").await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        Uuid::parse_str(json["session_id"].as_str().unwrap()).unwrap();
        assert_eq!(json["current_wagon"]["wagon_id"], 0);
        assert_eq!(json["current_wagon"]["theme"], "theme-0");
        assert!(json["current_wagon"].get("passcode").is_none());
    }

    #[tokio::test]
    async fn test_create_session_succeeds_without_dataset() {
        let app = router().with_state(app_state_with(Arc::new(FailingWagonCatalog)));

        let (status, json) = send(app, "POST", "/").await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["current_wagon"]["theme"], "");
    }

    #[tokio::test]
    async fn test_get_unknown_session_returns_404() {
        let app = router().with_state(test_app_state());

        let (status, json) = send(app, "GET", &format!("/{}", Uuid::new_v4())).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "session_not_found");
    }

    #[tokio::test]
    async fn test_advance_twice_hits_last_wagon() {
        // Arrange
        let state = test_app_state();
        let session = state.sessions.create().await;
        let app = router().with_state(state);
        let uri = format!("/{}/advance", session.session_id);

        // Act
        let (first_status, first) = send(app.clone(), "POST", &uri).await;
        let (second_status, second) = send(app, "POST", &uri).await;

        // Assert
        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(first["wagon_id"], 1);
        assert_eq!(first["theme"], "theme-1");
        assert_eq!(second_status, StatusCode::BAD_REQUEST);
        assert_eq!(second["error"], "cannot_advance");
    }

    #[tokio::test]
    async fn test_terminate_removes_session() {
        let state = test_app_state();
        let session = state.sessions.create().await;
        let app = router().with_state(state.clone());
        let uri = format!("/{}", session.session_id);

        let (status, json) = send(app.clone(), "DELETE", &uri).await;
        let (again, _) = send(app, "DELETE", &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "terminated");
        assert_eq!(again, StatusCode::NOT_FOUND);
        assert!(state.sessions.is_empty().await);
    }
}
