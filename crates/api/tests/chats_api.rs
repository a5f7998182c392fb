//! Integration tests for the chat REST routes

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use familyflow_api::{config::BroadcastScope, create_router, AppState};
use familyflow_shared::NewMessage;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{test_state, token_for};

struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state = test_state(BroadcastScope::All);
        let router = create_router(state.clone());
        Self { state, router }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            let token = token_for(&self.state, user_id);
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn create_chat(&self, user_id: &str, name: &str) -> String {
        let (status, body) = self
            .request(Method::POST, "/api/v1/chats", Some(user_id), Some(json!({"name": name})))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["chat_id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_routes_require_bearer_token() {
    let app = TestApp::new();

    let (status, body) = app
        .request(Method::POST, "/api/v1/chats", None, Some(json!({"name": "Family"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let request = Request::builder()
        .uri("/api/v1/chats/user")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.request(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_chat_rejects_blank_name() {
    let app = TestApp::new();

    let (status, body) = app
        .request(Method::POST, "/api/v1/chats", Some("mom"), Some(json!({"name": "   "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_add_and_list_participants() {
    let app = TestApp::new();
    let chat_id = app.create_chat("mom", "Family").await;
    let uri = format!("/api/v1/chats/{chat_id}/participants");

    for user_id in ["mom", "kid"] {
        let (status, body) = app
            .request(Method::POST, &uri, Some("mom"), Some(json!({"user_id": user_id})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("Participant added successfully"));
    }

    let (status, body) = app.request(Method::GET, &uri, Some("mom"), None).await;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["mom", "kid"]);
}

#[tokio::test]
async fn test_duplicate_participant_conflicts() {
    let app = TestApp::new();
    let chat_id = app.create_chat("mom", "Family").await;
    let uri = format!("/api/v1/chats/{chat_id}/participants");

    let (status, _) = app
        .request(Method::POST, &uri, Some("mom"), Some(json!({"user_id": "kid"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(Method::POST, &uri, Some("mom"), Some(json!({"user_id": "kid"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_add_participant_to_missing_chat() {
    let app = TestApp::new();

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/chats/does-not-exist/participants",
            Some("mom"),
            Some(json!({"user_id": "kid"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_participants_includes_caller() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/chats/with-participants",
            Some("mom"),
            Some(json!({"name": "Weekend", "participant_ids": ["dad", "kid"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let chat_id = body["chat_id"].as_str().unwrap().to_string();

    let ids = app.state.chat_service.participant_user_ids(&chat_id).await.unwrap();
    assert_eq!(ids, vec!["dad", "kid", "mom"]);

    let (status, body) = app
        .request(Method::GET, "/api/v1/chats/user/participants", Some("kid"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let chats = body.as_array().unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["id"], chat_id.as_str());
    assert_eq!(chats[0]["participants"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_with_participants_ignores_repeated_ids() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/chats/with-participants",
            Some("mom"),
            Some(json!({"name": "Chores", "participant_ids": ["kid", "kid", "mom", "dad", "kid"]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let chat_id = body["chat_id"].as_str().unwrap();

    let ids = app.state.chat_service.participant_user_ids(chat_id).await.unwrap();
    assert_eq!(ids, vec!["kid", "mom", "dad"]);
}

#[tokio::test]
async fn test_user_chats_carry_last_message() {
    let app = TestApp::new();
    let service = &app.state.chat_service;

    let busy = service
        .create_chat_with_participants("Groceries", &["mom".to_string()])
        .await
        .unwrap();
    let quiet = service
        .create_chat_with_participants("Vacation", &["mom".to_string()])
        .await
        .unwrap();

    for content in ["milk", "eggs"] {
        service
            .create_message(NewMessage {
                chat_id: busy.clone(),
                sender_id: "mom".to_string(),
                content: content.to_string(),
            })
            .await
            .unwrap();
    }

    let (status, body) = app.request(Method::GET, "/api/v1/chats/user", Some("mom"), None).await;
    assert_eq!(status, StatusCode::OK);

    let chats = body.as_array().unwrap();
    assert_eq!(chats.len(), 2);

    let find = |id: &str| chats.iter().find(|c| c["id"] == id).unwrap();
    assert_eq!(find(&busy)["last_message"]["content"], "eggs");
    assert!(find(&quiet).get("last_message").is_none());
}

#[tokio::test]
async fn test_message_history_is_oldest_first() {
    let app = TestApp::new();
    let chat_id = app.create_chat("mom", "Family").await;

    for content in ["first", "second", "third"] {
        app.state
            .chat_service
            .create_message(NewMessage {
                chat_id: chat_id.clone(),
                sender_id: "mom".to_string(),
                content: content.to_string(),
            })
            .await
            .unwrap();
    }

    let (status, body) = app
        .request(Method::GET, &format!("/api/v1/chats/{chat_id}/messages"), Some("dad"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let contents: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_history_of_unknown_chat_is_empty() {
    let app = TestApp::new();

    let (status, body) = app
        .request(Method::GET, "/api/v1/chats/nope/messages", Some("mom"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
