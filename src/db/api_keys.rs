// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API key operations. Secrets are encrypted with KMS before they reach the store.

use super::{collections, data_error, new_id, Database, Query};
use crate::error::AppError;
use crate::models::api_key::{fingerprint, mask_secret};
use crate::models::{ApiKey, NewApiKey, Provider, StoredApiKey};
use crate::services::kms::{api_key_aad, KmsService};
use crate::services::realtime::ChangeEvent;

const ENTITY: &str = "api_key";

impl Database {
    async fn stored_api_keys(
        &self,
        query: Query,
    ) -> Result<Vec<StoredApiKey>, AppError> {
        self.query(collections::API_KEYS, query)
            .await
            .map_err(|e| data_error("list", ENTITY, e))
    }

    async fn owned_api_key(&self, user_id: &str, id: &str) -> Result<StoredApiKey, AppError> {
        self.get::<StoredApiKey>(collections::API_KEYS, id)
            .await
            .map_err(|e| data_error("get", ENTITY, e))?
            .filter(|key| key.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("API key {} not found", id)))
    }

    /// All of the user's keys, newest first, masked.
    pub async fn list_api_keys(&self, user_id: &str) -> Result<Vec<ApiKey>, AppError> {
        let query = Query::new().eq("user_id", user_id).order_desc("created_at");
        let keys = self.stored_api_keys(query).await?;
        Ok(keys.iter().map(ApiKey::from).collect())
    }

    /// Validate, encrypt and store a new active key.
    pub async fn create_api_key(
        &self,
        kms: &KmsService,
        user_id: &str,
        new: NewApiKey,
    ) -> Result<ApiKey, AppError> {
        new.check()?;

        let secret = new.key_value.trim();
        let encrypted = kms
            .encrypt(secret, &api_key_aad(user_id, new.provider.as_str()))
            .await?;

        let stored = StoredApiKey {
            id: new_id(),
            user_id: user_id.to_string(),
            provider: new.provider,
            key_name: new.key_name.trim().to_string(),
            key_value_encrypted: encrypted,
            masked_value: mask_secret(secret),
            fingerprint: fingerprint(secret),
            is_active: true,
            created_at: chrono::Utc::now(),
        };

        self.put(collections::API_KEYS, &stored.id, &stored)
            .await
            .map_err(|e| data_error("insert", ENTITY, e))?;

        tracing::info!(
            user_id,
            provider = stored.provider.as_str(),
            fingerprint = %stored.fingerprint,
            "API key added"
        );

        let view = ApiKey::from(&stored);
        self.publish(collections::API_KEYS, ChangeEvent::Insert, user_id, Some(&view), None);
        Ok(view)
    }

    /// Flip a key's active flag.
    pub async fn set_api_key_active(
        &self,
        user_id: &str,
        id: &str,
        active: bool,
    ) -> Result<ApiKey, AppError> {
        let mut stored = self.owned_api_key(user_id, id).await?;
        let before = ApiKey::from(&stored);
        stored.is_active = active;

        self.put(collections::API_KEYS, id, &stored)
            .await
            .map_err(|e| data_error("update", ENTITY, e))?;

        tracing::info!(user_id, fingerprint = %stored.fingerprint, active, "API key toggled");

        let view = ApiKey::from(&stored);
        self.publish(
            collections::API_KEYS,
            ChangeEvent::Update,
            user_id,
            Some(&view),
            Some(&before),
        );
        Ok(view)
    }

    /// Permanently remove a key.
    pub async fn delete_api_key(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let stored = self.owned_api_key(user_id, id).await?;

        self.remove(collections::API_KEYS, id)
            .await
            .map_err(|e| data_error("delete", ENTITY, e))?;

        tracing::info!(user_id, fingerprint = %stored.fingerprint, "API key deleted");

        let view = ApiKey::from(&stored);
        self.publish(collections::API_KEYS, ChangeEvent::Delete, user_id, None, Some(&view));
        Ok(())
    }

    /// Decrypted secret of the user's newest active key for `provider`.
    pub async fn active_api_key(
        &self,
        kms: &KmsService,
        user_id: &str,
        provider: Provider,
    ) -> Result<Option<String>, AppError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("provider", provider.as_str())
            .eq_bool("is_active", true)
            .order_desc("created_at")
            .limit(1);

        let Some(stored) = self.stored_api_keys(query).await?.into_iter().next() else {
            return Ok(None);
        };

        let secret = kms
            .decrypt(
                &stored.key_value_encrypted,
                &api_key_aad(user_id, provider.as_str()),
            )
            .await?;
        Ok(Some(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::RealtimeBridge;

    fn new_key(name: &str, value: &str) -> NewApiKey {
        NewApiKey {
            provider: Provider::OpenAi,
            key_name: name.into(),
            key_value: value.into(),
        }
    }

    #[tokio::test]
    async fn test_create_masks_and_encrypts() {
        let db = Database::in_memory(RealtimeBridge::new());
        let kms = KmsService::new_mock();

        let key = db
            .create_api_key(&kms, "u1", new_key("Main", "sk-abcdefghijkl"))
            .await
            .unwrap();
        assert_eq!(key.masked_value, "sk-a*******ijkl");
        assert!(key.is_active);

        let stored: StoredApiKey = db.get(collections::API_KEYS, &key.id).await.unwrap().unwrap();
        assert!(!stored.key_value_encrypted.contains("sk-abcdefghijkl"));

        let secret = db.active_api_key(&kms, "u1", Provider::OpenAi).await.unwrap();
        assert_eq!(secret.as_deref(), Some("sk-abcdefghijkl"));
    }

    #[tokio::test]
    async fn test_invalid_prefix_rejected_before_store() {
        let db = Database::new_mock();
        let kms = KmsService::new_mock();
        let err = db
            .create_api_key(&kms, "u1", new_key("Main", "abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_newest_active_key_wins() {
        let db = Database::in_memory(RealtimeBridge::new());
        let kms = KmsService::new_mock();

        let old = db
            .create_api_key(&kms, "u1", new_key("Old", "sk-old-000000"))
            .await
            .unwrap();
        let new = db
            .create_api_key(&kms, "u1", new_key("New", "sk-new-111111"))
            .await
            .unwrap();

        let secret = db.active_api_key(&kms, "u1", Provider::OpenAi).await.unwrap();
        assert_eq!(secret.as_deref(), Some("sk-new-111111"));

        db.set_api_key_active("u1", &new.id, false).await.unwrap();
        let secret = db.active_api_key(&kms, "u1", Provider::OpenAi).await.unwrap();
        assert_eq!(secret.as_deref(), Some("sk-old-000000"));

        db.delete_api_key("u1", &old.id).await.unwrap();
        assert!(db
            .active_api_key(&kms, "u1", Provider::OpenAi)
            .await
            .unwrap()
            .is_none());
        assert_eq!(db.list_api_keys("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_users_key_not_found() {
        let db = Database::in_memory(RealtimeBridge::new());
        let kms = KmsService::new_mock();
        let key = db
            .create_api_key(&kms, "u1", new_key("Main", "sk-abcdefghijkl"))
            .await
            .unwrap();

        let err = db.set_api_key_active("u2", &key.id, false).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = db.delete_api_key("u2", &key.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
