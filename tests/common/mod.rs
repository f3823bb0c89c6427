// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use medgen_api::config::Config;
use medgen_api::db::Database;
use medgen_api::middleware::auth::create_jwt;
use medgen_api::routes::create_router;
use medgen_api::services::{ActivityLogFailure, ActivityLogger, KmsService, RealtimeBridge};
use medgen_api::AppState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Test app over the in-memory store with mock KMS.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let db = Database::in_memory(RealtimeBridge::new());
    let state = Arc::new(
        AppState::new(config, db, KmsService::new_mock()).expect("Failed to build app state"),
    );
    (create_router(state.clone()), state)
}

/// Test app whose store fails every call. Activity-log failures are
/// delivered on the returned receiver.
#[allow(dead_code)]
pub fn create_offline_app() -> (Router, Arc<AppState>, UnboundedReceiver<ActivityLogFailure>) {
    let db = Database::new_mock();
    let (logger, failures) = ActivityLogger::spawn_with_failures(db.clone());
    let state = Arc::new(
        AppState::with_activity_logger(Config::test_default(), db, KmsService::new_mock(), logger)
            .expect("Failed to build app state"),
    );
    (create_router(state.clone()), state, failures)
}

/// Bearer token for `user_id`, signed with the app's key.
#[allow(dead_code)]
pub fn token_for(state: &AppState, user_id: &str) -> String {
    create_jwt(
        user_id,
        &format!("{}@example.com", user_id),
        &state.config.jwt_signing_key,
    )
    .unwrap()
}

/// JSON request with an optional bearer token.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Store an active OpenAI key for `user_id` through the API.
#[allow(dead_code)]
pub async fn add_api_key(app: &Router, token: &str) -> Value {
    use tower::ServiceExt;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/api-keys",
            Some(token),
            Some(json!({
                "provider": "openai",
                "key_name": "Personal",
                "key_value": "sk-test-abcdefghijklmnop"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// What the fake completion provider answers.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum FakeReply {
    Content(&'static str),
    Error(StatusCode, &'static str),
}

/// Start a local chat-completions endpoint. Returns its base URL and a hit
/// counter.
#[allow(dead_code)]
pub async fn spawn_fake_provider(reply: FakeReply) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(_body): Json<Value>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                match reply {
                    FakeReply::Content(content) => (
                        StatusCode::OK,
                        Json(json!({
                            "choices": [{ "message": { "role": "assistant", "content": content } }]
                        })),
                    ),
                    FakeReply::Error(status, message) => {
                        (status, Json(json!({ "error": { "message": message } })))
                    }
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), hits)
}

/// Config pointing the completion gateway at `base_url`.
#[allow(dead_code)]
pub fn config_with_provider(base_url: &str) -> Config {
    Config {
        openai_api_url: base_url.to_string(),
        ..Config::test_default()
    }
}
