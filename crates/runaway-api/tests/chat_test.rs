//! Integration tests for passenger conversations.

mod common;

use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

#[tokio::test]
async fn test_chat_round_trip_is_recorded_in_history() {
    // Arrange
    let app = common::build_test_app(common::test_state());
    let session_id = common::create_session(app.clone()).await;
    let uri = format!("/api/v1/sessions/{session_id}/chat/wagon-0-player-2");

    // Act
    let (status, reply) =
        common::post_json(app.clone(), &uri, &json!({ "message": "Where were you?" })).await;
    let (history_status, history) =
        common::get_json(app, &format!("{uri}/history")).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["uid"], "wagon-0-player-2");
    assert_eq!(reply["reply"], "I was in my cabin all night.");
    assert_eq!(reply["audio"], STANDARD.encode(b"ID3-audio"));
    assert!(reply["timestamp"].is_string());

    assert_eq!(history_status, StatusCode::OK);
    assert_eq!(history["uid"], "wagon-0-player-2");
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Where were you?");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "I was in my cabin all night.");
}

#[tokio::test]
async fn test_chat_conversation_shows_in_session_view() {
    let app = common::build_test_app(common::test_state());
    let session_id = common::create_session(app.clone()).await;

    common::post_json(
        app.clone(),
        &format!("/api/v1/sessions/{session_id}/chat/wagon-0-player-1"),
        &json!({ "message": "Hi" }),
    )
    .await;
    let (_, view) = common::get_json(app, &format!("/api/v1/sessions/{session_id}")).await;

    assert!(view.to_string().contains("wagon-0-player-1"));
}

#[tokio::test]
async fn test_chat_with_unknown_passenger_returns_404() {
    let app = common::build_test_app(common::test_state());
    let session_id = common::create_session(app.clone()).await;

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{session_id}/chat/wagon-0-player-42"),
        &json!({ "message": "Hello?" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "passenger_not_found");
}

#[tokio::test]
async fn test_chat_with_unknown_session_returns_404() {
    let app = common::build_test_app(common::test_state());

    let (status, json) = common::post_json(
        app,
        &format!("/api/v1/sessions/{}/chat/wagon-0-player-1", uuid::Uuid::new_v4()),
        &json!({ "message": "Hello?" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "session_not_found");
}
