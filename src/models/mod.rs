// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod api_key;
pub mod health;
pub mod report;
pub mod user;

pub use activity::{Activity, ActivityStatus, ActivityType, NewActivity};
pub use api_key::{ApiKey, ApiKeyToggle, NewApiKey, Provider, StoredApiKey};
pub use health::{HealthStats, HealthStatsUpdate, MedicalHistoryItem, NewMedicalHistoryItem};
pub use report::{filter_reports, Report, ReportDraft, ReportStatus, ShareReportRequest};
pub use user::{Credential, User, UserProfileUpdate};
