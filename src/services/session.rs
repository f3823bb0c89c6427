// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sessions and the identity provider.
//!
//! [`IdentityProvider`] checks credentials against the store and issues
//! signed session tokens. [`SessionStore`] holds one caller's current session
//! and notifies listeners when it changes.

use crate::db::{Database, StoreError};
use crate::error::AuthError;
use crate::middleware::auth::{create_jwt, decode_jwt, SESSION_TTL_SECS};
use crate::models::{Credential, User};
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use validator::Validate;

const PBKDF2_ITERATIONS: u32 = 100_000;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub credentials: Credentials,
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
}

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
}

/// Email/password identity backed by the `credentials` collection.
#[derive(Clone)]
pub struct IdentityProvider {
    db: Database,
    jwt_signing_key: Arc<Vec<u8>>,
    rng: SystemRandom,
}

fn transport(e: impl ToString) -> AuthError {
    AuthError::Transport(e.to_string())
}

fn iterations() -> NonZeroU32 {
    NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN)
}

impl IdentityProvider {
    pub fn new(db: Database, jwt_signing_key: Vec<u8>) -> Self {
        Self {
            db,
            jwt_signing_key: Arc::new(jwt_signing_key),
            rng: SystemRandom::new(),
        }
    }

    /// Register a new account and sign it in.
    pub async fn sign_up(
        &self,
        credentials: &Credentials,
        display_name: Option<String>,
    ) -> Result<Session, AuthError> {
        let email = credentials.email.trim().to_lowercase();

        if self.db.get_credential(&email).await.map_err(transport)?.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| transport("random source unavailable"))?;

        let mut hash = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations(),
            &salt,
            credentials.password.as_bytes(),
            &mut hash,
        );

        let user_id = uuid::Uuid::new_v4().to_string();
        let credential = Credential {
            user_id: user_id.clone(),
            email: email.clone(),
            password_hash: hex::encode(hash),
            salt: hex::encode(salt),
            created_at: Utc::now(),
        };
        match self.db.create_credential(&credential).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(AuthError::AlreadyRegistered),
            Err(e) => return Err(transport(e)),
        }

        let user = User::new(&user_id, &email, display_name);
        self.db.create_user(&user).await.map_err(transport)?;

        tracing::info!(user_id = %user_id, "User registered");
        self.issue(user)
    }

    /// Check email and password and start a session.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let email = credentials.email.trim().to_lowercase();

        let credential = self
            .db
            .get_credential(&email)
            .await
            .map_err(transport)?
            .ok_or(AuthError::InvalidCredentials)?;

        let salt = hex::decode(&credential.salt).map_err(|_| AuthError::InvalidCredentials)?;
        let hash =
            hex::decode(&credential.password_hash).map_err(|_| AuthError::InvalidCredentials)?;

        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations(),
            &salt,
            credentials.password.as_bytes(),
            &hash,
        )
        .map_err(|_| {
            tracing::info!(user_id = %credential.user_id, "Sign-in rejected");
            AuthError::InvalidCredentials
        })?;

        let user = self.profile_or_fallback(&credential.user_id, &email).await?;
        tracing::info!(user_id = %user.id, "User signed in");
        self.issue(user)
    }

    /// Rebuild a session from a bearer token.
    pub async fn session_for_token(&self, token: &str) -> Result<Session, AuthError> {
        let claims =
            decode_jwt(token, &self.jwt_signing_key).map_err(|_| AuthError::NotAuthenticated)?;
        let user = self.profile_or_fallback(&claims.sub, &claims.email).await?;
        Ok(Session {
            user,
            access_token: token.to_string(),
            expires_at: DateTime::from_timestamp(claims.exp as i64, 0).unwrap_or_else(Utc::now),
        })
    }

    async fn profile_or_fallback(&self, user_id: &str, email: &str) -> Result<User, AuthError> {
        let profile = self.db.get_user_profile(user_id).await.map_err(transport)?;
        Ok(profile.unwrap_or_else(|| User::fallback(user_id, email)))
    }

    fn issue(&self, user: User) -> Result<Session, AuthError> {
        let access_token =
            create_jwt(&user.id, &user.email, &self.jwt_signing_key).map_err(transport)?;
        Ok(Session {
            user,
            access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(SESSION_TTL_SECS),
        })
    }
}

// ─── Session Store ───────────────────────────────────────────────

type AuthHandler = dyn Fn(AuthEvent, Option<&Session>) + Send + Sync;

/// One caller's session. The session is replaced wholesale on sign-in and
/// sign-out, and every change is delivered to subscribed handlers.
pub struct SessionStore {
    provider: IdentityProvider,
    state: watch::Sender<Option<Session>>,
    handlers: Arc<Mutex<Vec<(u64, Arc<AuthHandler>)>>>,
    next_id: AtomicU64,
}

impl SessionStore {
    pub fn new(provider: IdentityProvider) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            provider,
            state,
            handlers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// Watch the session without a callback.
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let session = self.provider.sign_in(credentials).await?;
        self.replace(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        credentials: &Credentials,
        display_name: Option<String>,
    ) -> Result<Session, AuthError> {
        let session = self.provider.sign_up(credentials, display_name).await?;
        self.replace(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        if self.state.borrow().is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        self.replace(AuthEvent::SignedOut, None);
        Ok(())
    }

    /// Register `handler` for session changes until the subscription is dropped.
    pub fn on_auth_state_change<F>(&self, handler: F) -> AuthSubscription
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push((id, Arc::new(handler)));
        }
        AuthSubscription {
            id,
            handlers: self.handlers.clone(),
        }
    }

    fn replace(&self, event: AuthEvent, session: Option<Session>) {
        self.state.send_replace(session.clone());

        // Snapshot so handlers may unsubscribe from inside a callback
        let handlers: Vec<Arc<AuthHandler>> = match self.handlers.lock() {
            Ok(handlers) => handlers.iter().map(|(_, h)| h.clone()).collect(),
            Err(_) => return,
        };
        for handler in handlers {
            handler(event, session.as_ref());
        }
    }
}

/// Live registration of an auth-state handler.
pub struct AuthSubscription {
    id: u64,
    handlers: Arc<Mutex<Vec<(u64, Arc<AuthHandler>)>>>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.retain(|(id, _)| *id != self.id);
        }
    }
}
