// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User profile and credential models for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// User profile stored in the `users` collection (document ID = user ID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Free-form profile data (age, preferences, ...)
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, unknown>"))]
    pub metadata: Map<String, Value>,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: &str, email: &str, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            email: email.to_string(),
            display_name,
            avatar_url: None,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Profile shown when no row has been written yet.
    pub fn fallback(id: &str, email: &str) -> Self {
        let name = email.split('@').next().filter(|s| !s.is_empty()).unwrap_or("User");
        let mut user = Self::new(id, email, Some(name.to_string()));
        user.avatar_url = Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            email
        ));
        user
    }

    /// Apply a partial update. Metadata keys are merged, not replaced.
    pub fn apply(&mut self, update: UserProfileUpdate) {
        if let Some(name) = update.display_name {
            self.display_name = Some(name);
        }
        if let Some(url) = update.avatar_url {
            self.avatar_url = Some(url);
        }
        if let Some(metadata) = update.metadata {
            for (k, v) in metadata {
                if v.is_null() {
                    self.metadata.remove(&k);
                } else {
                    self.metadata.insert(k, v);
                }
            }
        }
        self.updated_at = Utc::now();
    }
}

/// Body of `PUT /api/me`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "Record<string, unknown>"))]
    pub metadata: Option<Map<String, Value>>,
}

/// Password credential, keyed by normalized email in the `credentials` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: String,
    pub email: String,
    /// PBKDF2-HMAC-SHA256 output (hex)
    pub password_hash: String,
    /// Random salt (hex)
    pub salt: String,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_profile() {
        let user = User::fallback("u1", "jane.doe@example.com");
        assert_eq!(user.display_name.as_deref(), Some("jane.doe"));
        assert_eq!(
            user.avatar_url.as_deref(),
            Some("https://api.dicebear.com/7.x/avataaars/svg?seed=jane.doe@example.com")
        );
    }

    #[test]
    fn test_apply_merges_metadata() {
        let mut user = User::new("u1", "a@b.c", None);
        user.metadata.insert("age".into(), json!(30));
        user.metadata.insert("city".into(), json!("Paris"));

        let mut metadata = Map::new();
        metadata.insert("age".into(), json!(31));
        metadata.insert("city".into(), Value::Null);
        user.apply(UserProfileUpdate {
            display_name: Some("Ann".into()),
            avatar_url: None,
            metadata: Some(metadata),
        });

        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert_eq!(user.metadata.get("age"), Some(&json!(31)));
        assert!(!user.metadata.contains_key("city"));
    }
}
