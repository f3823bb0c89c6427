// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud KMS encryption for stored API-key secrets.
//!
//! Secrets are encrypted directly by KMS (no envelope keys). Each ciphertext
//! carries additional authenticated data naming its owner and provider, so a
//! ciphertext copied onto another user's record fails to decrypt.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use google_cloud_googleapis::cloud::kms::v1::{DecryptRequest, EncryptRequest};
use google_cloud_kms::client::{Client, ClientConfig};
use std::sync::Arc;

/// Key ring holding the API-key encryption key.
const KEY_RING: &str = "medgen";

/// Additional authenticated data for an API key secret.
pub fn api_key_aad(user_id: &str, provider: &str) -> String {
    format!("user:{}:provider:{}", user_id, provider)
}

fn kms_error(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::Internal(anyhow::anyhow!("KMS {}: {}", what, e))
}

#[derive(Clone)]
enum Backend {
    Cloud(Arc<Client>),
    /// Reversible local encoding; only constructible in debug builds.
    #[cfg(debug_assertions)]
    Mock,
}

/// Encrypts and decrypts secrets with a single KMS key.
#[derive(Clone)]
pub struct KmsService {
    /// projects/{project}/locations/{location}/keyRings/{ring}/cryptoKeys/{key}
    key_path: String,
    backend: Backend,
}

impl KmsService {
    /// Connect to Cloud KMS using ambient GCP credentials.
    pub async fn new(project_id: &str, location: &str, key_name: &str) -> Result<Self, AppError> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| kms_error("auth config", e))?;
        let client = Client::new(config)
            .await
            .map_err(|e| kms_error("client init", e))?;

        Ok(Self {
            key_path: format!(
                "projects/{}/locations/{}/keyRings/{}/cryptoKeys/{}",
                project_id, location, KEY_RING, key_name
            ),
            backend: Backend::Cloud(Arc::new(client)),
        })
    }

    /// Offline service for development and tests.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            key_path: "mock".to_string(),
            backend: Backend::Mock,
        }
    }

    /// Encrypt `plaintext` bound to `aad`; returns base64 ciphertext.
    pub async fn encrypt(&self, plaintext: &str, aad: &str) -> Result<String, AppError> {
        let client = match &self.backend {
            Backend::Cloud(client) => client,
            #[cfg(debug_assertions)]
            Backend::Mock => return Ok(mock::seal(plaintext, aad)),
        };

        let request = EncryptRequest {
            name: self.key_path.clone(),
            plaintext: plaintext.as_bytes().to_vec(),
            additional_authenticated_data: aad.as_bytes().to_vec(),
            ..Default::default()
        };
        let response = client
            .encrypt(request, None)
            .await
            .map_err(|e| kms_error("encrypt failed", e))?;

        Ok(BASE64.encode(response.ciphertext))
    }

    /// Decrypt output of [`encrypt`](Self::encrypt). Fails unless `aad` matches.
    pub async fn decrypt(&self, ciphertext_b64: &str, aad: &str) -> Result<String, AppError> {
        let client = match &self.backend {
            Backend::Cloud(client) => client,
            #[cfg(debug_assertions)]
            Backend::Mock => return mock::open(ciphertext_b64, aad),
        };

        let ciphertext = BASE64
            .decode(ciphertext_b64)
            .map_err(|e| kms_error("ciphertext is not base64", e))?;
        let request = DecryptRequest {
            name: self.key_path.clone(),
            ciphertext,
            additional_authenticated_data: aad.as_bytes().to_vec(),
            ..Default::default()
        };
        let response = client
            .decrypt(request, None)
            .await
            .map_err(|e| kms_error("decrypt failed", e))?;

        String::from_utf8(response.plaintext).map_err(|e| kms_error("plaintext is not UTF-8", e))
    }
}

#[cfg(debug_assertions)]
mod mock {
    use super::{kms_error, BASE64};
    use crate::error::AppError;
    use base64::Engine as _;

    pub(super) fn seal(plaintext: &str, aad: &str) -> String {
        BASE64.encode(format!("{}\n{}", aad, plaintext))
    }

    pub(super) fn open(ciphertext_b64: &str, aad: &str) -> Result<String, AppError> {
        let bytes = BASE64
            .decode(ciphertext_b64)
            .map_err(|e| kms_error("mock ciphertext is not base64", e))?;
        let text = String::from_utf8(bytes).map_err(|e| kms_error("mock plaintext is not UTF-8", e))?;
        match text.split_once('\n') {
            Some((bound, plaintext)) if bound == aad => Ok(plaintext.to_string()),
            _ => Err(kms_error("decrypt failed", "AAD mismatch (mock)")),
        }
    }
}
