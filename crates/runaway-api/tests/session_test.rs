//! Integration tests for the session endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_create_then_get_session() {
    // Arrange
    let app = common::build_test_app(common::test_state());
    let session_id = common::create_session(app.clone()).await;

    // Act
    let (status, json) = common::get_json(app, &format!("/api/v1/sessions/{session_id}")).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_id"], session_id.as_str());
    assert_eq!(json["current_wagon"]["wagon_id"], 0);
    assert_eq!(json["current_wagon"]["theme"], "theme-0");
    assert!(!json.to_string().contains("passcode-0"));
}

#[tokio::test]
async fn test_get_session_with_malformed_id_returns_400() {
    let app = common::build_test_app(common::test_state());

    let (status, _) = common::get_json(app, "/api/v1/sessions/not-a-uuid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_advance_through_every_wagon() {
    // Arrange
    let app = common::build_test_app(common::test_state());
    let session_id = common::create_session(app.clone()).await;
    let uri = format!("/api/v1/sessions/{session_id}/advance");

    // Act
    let (first_status, first) = common::post_empty(app.clone(), &uri).await;
    let (second_status, second) = common::post_empty(app.clone(), &uri).await;
    let (third_status, third) = common::post_empty(app.clone(), &uri).await;
    let (_, view) = common::get_json(app, &format!("/api/v1/sessions/{session_id}")).await;

    // Assert
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first["wagon_id"], 1);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(second["wagon_id"], 2);
    assert_eq!(second["theme"], "theme-2");
    assert_eq!(third_status, StatusCode::BAD_REQUEST);
    assert_eq!(third["error"], "cannot_advance");
    assert_eq!(view["current_wagon"]["wagon_id"], 2);
}

#[tokio::test]
async fn test_advance_starts_fresh_conversations() {
    // Arrange
    let app = common::build_test_app(common::test_state());
    let session_id = common::create_session(app.clone()).await;
    let (status, _) = common::post_json(
        app.clone(),
        &format!("/api/v1/sessions/{session_id}/chat/wagon-0-player-1"),
        &json!({ "message": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Act
    let (advance_status, _) =
        common::post_empty(app.clone(), &format!("/api/v1/sessions/{session_id}/advance")).await;
    let (_, history) = common::get_json(
        app.clone(),
        &format!("/api/v1/sessions/{session_id}/chat/wagon-0-player-1/history"),
    )
    .await;
    let (stale_status, stale) = common::post_json(
        app.clone(),
        &format!("/api/v1/sessions/{session_id}/chat/wagon-0-player-1"),
        &json!({ "message": "hello again" }),
    )
    .await;
    let (fresh_status, fresh) = common::post_json(
        app,
        &format!("/api/v1/sessions/{session_id}/chat/wagon-1-player-1"),
        &json!({ "message": "hello" }),
    )
    .await;

    // Assert
    assert_eq!(advance_status, StatusCode::OK);
    assert!(history["messages"].as_array().unwrap().is_empty());
    assert_eq!(stale_status, StatusCode::BAD_REQUEST);
    assert_eq!(stale["error"], "wrong_wagon");
    assert_eq!(fresh_status, StatusCode::OK);
    assert_eq!(fresh["uid"], "wagon-1-player-1");
}

#[tokio::test]
async fn test_terminate_then_operations_return_404() {
    // Arrange
    let app = common::build_test_app(common::test_state());
    let session_id = common::create_session(app.clone()).await;

    // Act
    let (status, json) =
        common::delete_json(app.clone(), &format!("/api/v1/sessions/{session_id}")).await;
    let (get_status, _) =
        common::get_json(app.clone(), &format!("/api/v1/sessions/{session_id}")).await;
    let (chat_status, chat) = common::post_json(
        app,
        &format!("/api/v1/sessions/{session_id}/chat/wagon-0-player-1"),
        &json!({ "message": "anyone there?" }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_id"], session_id.as_str());
    assert_eq!(json["status"], "terminated");
    assert_eq!(get_status, StatusCode::NOT_FOUND);
    assert_eq!(chat_status, StatusCode::NOT_FOUND);
    assert_eq!(chat["error"], "session_not_found");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = common::build_test_app(common::test_state());
    let first = common::create_session(app.clone()).await;
    let second = common::create_session(app.clone()).await;

    common::post_empty(app.clone(), &format!("/api/v1/sessions/{first}/advance")).await;
    let (_, first_view) = common::get_json(app.clone(), &format!("/api/v1/sessions/{first}")).await;
    let (_, second_view) = common::get_json(app, &format!("/api/v1/sessions/{second}")).await;

    assert_ne!(first, second);
    assert_eq!(first_view["current_wagon"]["wagon_id"], 1);
    assert_eq!(second_view["current_wagon"]["wagon_id"], 0);
}
