// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log operations. Activities are created once and never updated.

use super::{collections, data_error, new_id, Database, Query};
use crate::error::{AppError, ValidationError};
use crate::models::{Activity, ActivityType, NewActivity};
use crate::services::realtime::ChangeEvent;
use validator::Validate;

const ENTITY: &str = "activity";

impl Database {
    /// Most recent activities for a user.
    pub async fn list_activities(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Activity>, AppError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_desc("created_at")
            .limit_opt(limit);
        self.query(collections::ACTIVITIES, query)
            .await
            .map_err(|e| data_error("list", ENTITY, e))
    }

    /// Most recent activities of one type.
    pub async fn list_activities_by_type(
        &self,
        user_id: &str,
        activity_type: ActivityType,
        limit: Option<u32>,
    ) -> Result<Vec<Activity>, AppError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .eq("type", activity_type.as_str())
            .order_desc("created_at")
            .limit_opt(limit);
        self.query(collections::ACTIVITIES, query)
            .await
            .map_err(|e| data_error("list", ENTITY, e))
    }

    /// Append an activity. The store assigns id and timestamp.
    pub async fn create_activity(&self, new: NewActivity) -> Result<Activity, AppError> {
        new.validate().map_err(ValidationError::from)?;

        let activity = new.into_activity(new_id(), chrono::Utc::now());
        self.put(collections::ACTIVITIES, &activity.id, &activity)
            .await
            .map_err(|e| data_error("insert", ENTITY, e))?;

        tracing::debug!(
            user_id = %activity.user_id,
            activity_type = activity.activity_type.as_str(),
            "Activity recorded"
        );
        self.publish(
            collections::ACTIVITIES,
            ChangeEvent::Insert,
            &activity.user_id,
            Some(&activity),
            None,
        );
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataAccessError;
    use crate::services::realtime::RealtimeBridge;

    #[tokio::test]
    async fn test_list_newest_first_and_scoped() {
        let db = Database::in_memory(RealtimeBridge::new());
        for title in ["first", "second", "third"] {
            db.create_activity(NewActivity::completed("u1", title, "", ActivityType::Chat))
                .await
                .unwrap();
        }
        db.create_activity(NewActivity::completed("u2", "other", "", ActivityType::Chat))
            .await
            .unwrap();

        let list = db.list_activities("u1", Some(2)).await.unwrap();
        let titles: Vec<_> = list.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["third", "second"]);
    }

    #[tokio::test]
    async fn test_list_by_type() {
        let db = Database::in_memory(RealtimeBridge::new());
        db.create_activity(NewActivity::chat("u1", "hello")).await.unwrap();
        db.create_activity(NewActivity::image_analysis("u1", "scan.png"))
            .await
            .unwrap();

        let analyses = db
            .list_activities_by_type("u1", ActivityType::Analysis, None)
            .await
            .unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].description, "Analysis of scan.png");
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let db = Database::in_memory(RealtimeBridge::new());
        let err = db
            .create_activity(NewActivity::completed("u1", "", "", ActivityType::Chat))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_offline_store_returns_data_access_error() {
        let db = Database::new_mock();
        let err = db.create_activity(NewActivity::chat("u1", "hi")).await.unwrap_err();
        match err {
            AppError::DataAccess(DataAccessError {
                operation, entity, ..
            }) => {
                assert_eq!(operation, "insert");
                assert_eq!(entity, "activity");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
