// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile, credential, medical history and health stats operations.

use super::{collections, data_error, new_id, Database, Query, StoreError};
use crate::error::{AppError, ValidationError};
use crate::models::{
    Credential, HealthStats, HealthStatsUpdate, MedicalHistoryItem, NewMedicalHistoryItem, User,
    UserProfileUpdate,
};
use crate::services::realtime::ChangeEvent;
use validator::Validate;

impl Database {
    // ─── User Profile ────────────────────────────────────────────

    /// Stored profile, or `None` if the user never wrote one.
    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get(collections::USERS, user_id)
            .await
            .map_err(|e| data_error("get", "user", e))
    }

    /// Merge `update` into the stored profile, creating it if needed.
    pub async fn upsert_user_profile(
        &self,
        user_id: &str,
        email: &str,
        update: UserProfileUpdate,
    ) -> Result<User, AppError> {
        update.validate().map_err(ValidationError::from)?;

        let existing = self.get_user_profile(user_id).await?;
        let mut user = existing
            .clone()
            .unwrap_or_else(|| User::new(user_id, email, None));
        user.apply(update);

        self.put(collections::USERS, user_id, &user)
            .await
            .map_err(|e| data_error("upsert", "user", e))?;

        let event = if existing.is_some() {
            ChangeEvent::Update
        } else {
            ChangeEvent::Insert
        };
        self.publish(collections::USERS, event, user_id, Some(&user), existing.as_ref());
        Ok(user)
    }

    /// Insert a profile row during sign-up.
    pub async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.put(collections::USERS, &user.id, user).await?;
        self.publish(collections::USERS, ChangeEvent::Insert, &user.id, Some(user), None);
        Ok(())
    }

    // ─── Credentials ─────────────────────────────────────────────

    /// Credentials are keyed by lowercased email.
    pub async fn get_credential(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        self.get(collections::CREDENTIALS, &email.to_lowercase()).await
    }

    /// Store a new credential; an existing one for the same email is a conflict.
    pub async fn create_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        self.create(
            collections::CREDENTIALS,
            &credential.email.to_lowercase(),
            credential,
        )
        .await
    }

    // ─── Medical History ─────────────────────────────────────────

    /// History items, most recent diagnosis first.
    pub async fn list_medical_history(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<MedicalHistoryItem>, AppError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_desc("diagnosis_date")
            .limit_opt(limit);
        self.query(collections::MEDICAL_HISTORY, query)
            .await
            .map_err(|e| data_error("list", "medical_history", e))
    }

    pub async fn add_medical_history_item(
        &self,
        user_id: &str,
        new: NewMedicalHistoryItem,
    ) -> Result<MedicalHistoryItem, AppError> {
        new.validate().map_err(ValidationError::from)?;

        let item = MedicalHistoryItem {
            id: new_id(),
            user_id: user_id.to_string(),
            condition: new.condition.trim().to_string(),
            diagnosis_date: new.diagnosis_date,
            created_at: chrono::Utc::now(),
        };
        self.put(collections::MEDICAL_HISTORY, &item.id, &item)
            .await
            .map_err(|e| data_error("insert", "medical_history", e))?;

        self.publish(
            collections::MEDICAL_HISTORY,
            ChangeEvent::Insert,
            user_id,
            Some(&item),
            None,
        );
        Ok(item)
    }

    /// Remove one of the user's history items.
    pub async fn delete_medical_history_item(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        let item: MedicalHistoryItem = self
            .get(collections::MEDICAL_HISTORY, id)
            .await
            .map_err(|e| data_error("get", "medical_history", e))?
            .filter(|item: &MedicalHistoryItem| item.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Medical history item {} not found", id)))?;

        self.remove(collections::MEDICAL_HISTORY, id)
            .await
            .map_err(|e| data_error("delete", "medical_history", e))?;

        self.publish(
            collections::MEDICAL_HISTORY,
            ChangeEvent::Delete,
            user_id,
            None,
            Some(&item),
        );
        Ok(())
    }

    // ─── Health Stats ────────────────────────────────────────────

    pub async fn get_health_stats(&self, user_id: &str) -> Result<Option<HealthStats>, AppError> {
        self.get(collections::HEALTH_STATS, user_id)
            .await
            .map_err(|e| data_error("get", "health_stats", e))
    }

    /// Merge `update` into the user's single stats row.
    pub async fn upsert_health_stats(
        &self,
        user_id: &str,
        update: HealthStatsUpdate,
    ) -> Result<HealthStats, AppError> {
        update.validate().map_err(ValidationError::from)?;

        let existing = self.get_health_stats(user_id).await?;
        let mut stats = existing
            .clone()
            .unwrap_or_else(|| HealthStats::empty(user_id));
        stats.apply(update);

        self.put(collections::HEALTH_STATS, user_id, &stats)
            .await
            .map_err(|e| data_error("upsert", "health_stats", e))?;

        let event = if existing.is_some() {
            ChangeEvent::Update
        } else {
            ChangeEvent::Insert
        };
        self.publish(collections::HEALTH_STATS, event, user_id, Some(&stats), existing.as_ref());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::RealtimeBridge;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_profile_upsert_creates_then_merges() {
        let db = Database::in_memory(RealtimeBridge::new());
        assert!(db.get_user_profile("u1").await.unwrap().is_none());

        db.upsert_user_profile(
            "u1",
            "a@b.c",
            UserProfileUpdate {
                display_name: Some("Ann".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let user = db
            .upsert_user_profile(
                "u1",
                "a@b.c",
                UserProfileUpdate {
                    avatar_url: Some("https://example.com/a.png".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(user.display_name.as_deref(), Some("Ann"));
        assert_eq!(user.avatar_url.as_deref(), Some("https://example.com/a.png"));
        let stored = db.get_user_profile("u1").await.unwrap().unwrap();
        assert_eq!(stored.display_name, user.display_name);
        assert_eq!(stored.email, "a@b.c");
    }

    #[tokio::test]
    async fn test_medical_history_order_and_delete() {
        let db = Database::in_memory(RealtimeBridge::new());
        for (condition, d) in [("Asthma", date(2019, 5, 1)), ("Flu", date(2024, 1, 10))] {
            db.add_medical_history_item(
                "u1",
                NewMedicalHistoryItem {
                    condition: condition.into(),
                    diagnosis_date: d,
                },
            )
            .await
            .unwrap();
        }

        let items = db.list_medical_history("u1", None).await.unwrap();
        assert_eq!(items[0].condition, "Flu");
        assert_eq!(items[1].condition, "Asthma");

        // Another user cannot delete it
        let err = db
            .delete_medical_history_item("u2", &items[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        db.delete_medical_history_item("u1", &items[0].id).await.unwrap();
        assert_eq!(db.list_medical_history("u1", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_medical_history_requires_condition() {
        let db = Database::in_memory(RealtimeBridge::new());
        let err = db
            .add_medical_history_item(
                "u1",
                NewMedicalHistoryItem {
                    condition: String::new(),
                    diagnosis_date: date(2020, 1, 1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_health_stats_single_row() {
        let db = Database::in_memory(RealtimeBridge::new());
        db.upsert_health_stats(
            "u1",
            HealthStatsUpdate {
                heart_rate: Some(70),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        db.upsert_health_stats(
            "u1",
            HealthStatsUpdate {
                heart_rate: Some(65),
                blood_pressure: Some("118/76".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = db.get_health_stats("u1").await.unwrap().unwrap();
        assert_eq!(stats.heart_rate, Some(65));
        assert_eq!(stats.blood_pressure.as_deref(), Some("118/76"));
    }
}
