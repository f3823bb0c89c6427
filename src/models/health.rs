// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Medical history and health stats models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// One diagnosed condition in a user's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MedicalHistoryItem {
    pub id: String,
    pub user_id: String,
    pub condition: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub diagnosis_date: NaiveDate,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/medical-history`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewMedicalHistoryItem {
    #[validate(length(min = 1, max = 200, message = "condition is required"))]
    pub condition: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub diagnosis_date: NaiveDate,
}

/// Latest vitals, one row per user (document ID = user ID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthStats {
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub last_checkup: Option<NaiveDate>,
    /// e.g. "120/80"
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u32>,
    /// Kilograms
    pub weight: Option<f64>,
    #[serde(with = "crate::time_utils::rfc3339_millis")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl HealthStats {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            last_checkup: None,
            blood_pressure: None,
            heart_rate: None,
            weight: None,
            updated_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, update: HealthStatsUpdate) {
        if update.last_checkup.is_some() {
            self.last_checkup = update.last_checkup;
        }
        if update.blood_pressure.is_some() {
            self.blood_pressure = update.blood_pressure;
        }
        if update.heart_rate.is_some() {
            self.heart_rate = update.heart_rate;
        }
        if update.weight.is_some() {
            self.weight = update.weight;
        }
        self.updated_at = Utc::now();
    }
}

/// Body of `PUT /api/health-stats`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthStatsUpdate {
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub last_checkup: Option<NaiveDate>,
    #[validate(length(min = 3, max = 16))]
    pub blood_pressure: Option<String>,
    #[validate(range(min = 20, max = 250))]
    pub heart_rate: Option<u32>,
    #[validate(range(min = 0.5, max = 700.0))]
    pub weight: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut stats = HealthStats::empty("u1");
        stats.apply(HealthStatsUpdate {
            heart_rate: Some(72),
            blood_pressure: Some("120/80".into()),
            ..Default::default()
        });
        stats.apply(HealthStatsUpdate {
            weight: Some(70.5),
            ..Default::default()
        });
        assert_eq!(stats.heart_rate, Some(72));
        assert_eq!(stats.blood_pressure.as_deref(), Some("120/80"));
        assert_eq!(stats.weight, Some(70.5));
    }

    #[test]
    fn test_update_validation() {
        let bad = HealthStatsUpdate {
            heart_rate: Some(400),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
