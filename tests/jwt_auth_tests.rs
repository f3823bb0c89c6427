// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token checks in the auth middleware.
//!
//! Tokens are minted here with `jsonwebtoken` directly so that a change to
//! the claims layout or algorithm on either side shows up as a failure.

use axum::http::StatusCode;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use medgen_api::middleware::auth::decode_jwt;
use serde::Serialize;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, json_request, token_for};

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    email: &'a str,
    exp: i64,
    iat: i64,
}

fn mint(sub: &str, issued_secs_ago: i64, ttl_secs: i64, key: &[u8]) -> String {
    let now = chrono::Utc::now().timestamp();
    let iat = now - issued_secs_ago;
    let claims = TestClaims {
        sub,
        email: "jwt@example.com",
        iat,
        exp: iat + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key),
    )
    .expect("Failed to create JWT")
}

#[test]
fn test_externally_minted_token_decodes() {
    let key = b"test_jwt_key_32_bytes_minimum!!";
    let token = mint("user-9", 0, 3600, key);

    let claims = decode_jwt(&token, key).expect("claims layout should match");
    assert_eq!(claims.sub, "user-9");
    assert_eq!(claims.email, "jwt@example.com");
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn test_middleware_accepts_valid_token() {
    let (app, state) = create_test_app();
    let token = mint("user-9", 0, 3600, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request("GET", "/api/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], "user-9");
}

#[tokio::test]
async fn test_middleware_rejects_expired_token() {
    let (app, state) = create_test_app();
    // Expired an hour ago, well past the default leeway
    let token = mint("user-9", 7200, 3600, &state.config.jwt_signing_key);

    let response = app
        .oneshot(json_request("GET", "/api/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_middleware_rejects_foreign_key() {
    let (app, _state) = create_test_app();
    let token = mint("user-9", 0, 3600, b"some_other_key_that_is_long_enough");

    let response = app
        .oneshot(json_request("GET", "/api/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_middleware_rejects_tampered_token() {
    let (app, state) = create_test_app();
    let mut token = token_for(&state, "user-9");
    token.push('x');

    let response = app
        .oneshot(json_request("GET", "/api/me", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
