// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use validator::Validate;

use crate::error::{Result, ValidationError};
use crate::middleware::auth::{SESSION_COOKIE, SESSION_TTL_SECS};
use crate::services::session::{Credentials, Session, SignUpRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
}

/// HttpOnly session cookie; `Secure` unless the frontend is served over plain http.
fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(state.config.frontend_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .build()
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignUpRequest>,
) -> Result<(CookieJar, Json<Session>)> {
    body.validate().map_err(ValidationError::from)?;

    let display_name = body
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let session = state
        .identity
        .sign_up(&body.credentials, display_name)
        .await?;

    let jar = jar.add(session_cookie(&state, session.access_token.clone()));
    Ok((jar, Json(session)))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<Credentials>,
) -> Result<(CookieJar, Json<Session>)> {
    body.validate().map_err(ValidationError::from)?;

    let session = state.identity.sign_in(&body).await?;

    let jar = jar.add(session_cookie(&state, session.access_token.clone()));
    Ok((jar, Json(session)))
}

async fn sign_out(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(serde_json::json!({ "success": true })))
}
