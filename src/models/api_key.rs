// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Third-party API key models.
//!
//! The secret is only ever stored encrypted. Everything that leaves the
//! server (responses, realtime events, logs) carries the masked form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::ValidationError;

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
        }
    }
}

/// Stored record in the `api_keys` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredApiKey {
    pub id: String,
    pub user_id: String,
    pub provider: Provider,
    pub key_name: String,
    /// KMS ciphertext (base64), bound to user and provider
    pub key_value_encrypted: String,
    pub masked_value: String,
    /// SHA-256 prefix of the secret, for log correlation
    pub fingerprint: String,
    pub is_active: bool,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    pub created_at: DateTime<Utc>,
}

/// API key as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ApiKey {
    pub id: String,
    pub provider: Provider,
    pub key_name: String,
    pub masked_value: String,
    pub is_active: bool,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl From<&StoredApiKey> for ApiKey {
    fn from(stored: &StoredApiKey) -> Self {
        Self {
            id: stored.id.clone(),
            provider: stored.provider,
            key_name: stored.key_name.clone(),
            masked_value: stored.masked_value.clone(),
            is_active: stored.is_active,
            created_at: stored.created_at,
        }
    }
}

/// Body of `POST /api/api-keys`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "key_matches_provider"))]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewApiKey {
    pub provider: Provider,
    #[validate(
        length(max = 100),
        custom(function = "not_blank", message = "Please provide both a name and value for your API key.")
    )]
    pub key_name: String,
    #[validate(custom(function = "not_blank", message = "Please provide both a name and value for your API key."))]
    pub key_value: String,
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

fn key_matches_provider(key: &NewApiKey) -> Result<(), validator::ValidationError> {
    match key.provider {
        Provider::OpenAi if !key.key_value.trim().starts_with("sk-") => {
            let mut err = validator::ValidationError::new("key_format");
            err.message = Some("OpenAI keys should start with 'sk-'".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl NewApiKey {
    /// Run the derived checks, reporting the first message.
    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .find_map(|e| e.message.clone());
            match message {
                Some(m) => ValidationError::new(m.to_string()),
                None => ValidationError::from(errors),
            }
        })
    }
}

/// Body of `PATCH /api/api-keys/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyToggle {
    pub is_active: bool,
}

/// Show the first and last four characters; short secrets are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

/// Short, non-reversible identifier for a secret.
pub fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    hex::encode(&digest[..6])
}
