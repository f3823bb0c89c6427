// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity log model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Which feature produced an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Diagnosis,
    Chat,
    Analysis,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Diagnosis => "diagnosis",
            Self::Chat => "chat",
            Self::Analysis => "analysis",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diagnosis" => Ok(Self::Diagnosis),
            "chat" => Ok(Self::Chat),
            "analysis" => Ok(Self::Analysis),
            other => Err(format!("unknown activity type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityStatus {
    Completed,
    InProgress,
    Pending,
}

/// Stored activity record. Created once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    /// Document ID
    pub id: String,
    /// Owner
    pub user_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// An activity waiting to be written. The store assigns id and timestamp.
#[derive(Debug, Clone, Validate)]
pub struct NewActivity {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub description: String,
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
}

impl NewActivity {
    pub fn completed(
        user_id: &str,
        title: &str,
        description: impl Into<String>,
        activity_type: ActivityType,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: description.into(),
            activity_type,
            status: ActivityStatus::Completed,
        }
    }

    /// Chat entries carry the first 100 characters of the question.
    pub fn chat(user_id: &str, query: &str) -> Self {
        let mut description: String = query.chars().take(100).collect();
        if query.chars().count() > 100 {
            description.push_str("...");
        }
        Self::completed(user_id, "AI Chat Session", description, ActivityType::Chat)
    }

    pub fn diagnosis(user_id: &str, symptom_names: &[String]) -> Self {
        Self::completed(
            user_id,
            "AI Diagnosis",
            format!("Diagnosis for {}.", symptom_names.join(", ")),
            ActivityType::Diagnosis,
        )
    }

    pub fn image_analysis(user_id: &str, file_name: &str) -> Self {
        Self::completed(
            user_id,
            "Image Analysis",
            format!("Analysis of {}", file_name),
            ActivityType::Analysis,
        )
    }

    pub fn dataset(user_id: &str, count: usize, dataset_type: &str) -> Self {
        Self::completed(
            user_id,
            "Dataset Generation",
            format!("Generated {} {} records", count, dataset_type),
            ActivityType::Analysis,
        )
    }

    pub fn drug_discovery(user_id: &str, count: usize, method: &str) -> Self {
        Self::completed(
            user_id,
            "Drug Discovery",
            format!("Generated {} drug candidates via {}", count, method),
            ActivityType::Analysis,
        )
    }

    /// Materialize into a stored record.
    pub fn into_activity(self, id: String, created_at: DateTime<Utc>) -> Activity {
        Activity {
            id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            activity_type: self.activity_type,
            status: self.status,
            created_at,
        }
    }
}
