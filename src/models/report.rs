// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Health report model and the sample reports shown to new users.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Completed,
    Pending,
    Reviewed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Report {
    pub id: String,
    /// `None` for sample reports
    pub user_id: Option<String>,
    pub title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub date: NaiveDate,
    /// Free-form category ("Physical", "Laboratory", ...)
    #[serde(rename = "type")]
    pub report_type: String,
    pub doctor: String,
    pub status: ReportStatus,
    pub summary: String,
}

/// Body of `POST /api/reports`. Every field falls back to a default.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50))]
    pub report_type: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub doctor: Option<String>,
    #[validate(length(max = 5000))]
    pub summary: Option<String>,
}

impl ReportDraft {
    pub fn into_report(self, id: String, user_id: &str, today: NaiveDate) -> Report {
        Report {
            id,
            user_id: Some(user_id.to_string()),
            title: self.title.unwrap_or_else(|| "New Health Report".to_string()),
            date: self.date.unwrap_or(today),
            report_type: self.report_type.unwrap_or_else(|| "General".to_string()),
            doctor: self.doctor.unwrap_or_else(|| "Dr. AI Assistant".to_string()),
            status: ReportStatus::Completed,
            summary: self.summary.unwrap_or_else(|| {
                "This report was generated by the AI assistant based on provided information."
                    .to_string()
            }),
        }
    }
}

/// Body of `POST /api/reports/{id}/share`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ShareReportRequest {
    #[validate(email(message = "A valid recipient email is required"))]
    pub email: String,
}

/// Keep reports matching a type tab ("all" or empty matches everything) and a
/// case-insensitive search over title, doctor and summary.
pub fn filter_reports(
    reports: Vec<Report>,
    report_type: Option<&str>,
    search: Option<&str>,
) -> Vec<Report> {
    let report_type = report_type.filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("all"));
    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    reports
        .into_iter()
        .filter(|r| report_type.map_or(true, |t| r.report_type.eq_ignore_ascii_case(t)))
        .filter(|r| {
            needle.as_deref().map_or(true, |n| {
                r.title.to_lowercase().contains(n)
                    || r.doctor.to_lowercase().contains(n)
                    || r.summary.to_lowercase().contains(n)
            })
        })
        .collect()
}

fn sample(
    id: &str,
    title: &str,
    (y, m, d): (i32, u32, u32),
    report_type: &str,
    doctor: &str,
    status: ReportStatus,
    summary: &str,
) -> Report {
    Report {
        id: id.to_string(),
        user_id: None,
        title: title.to_string(),
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        report_type: report_type.to_string(),
        doctor: doctor.to_string(),
        status,
        summary: summary.to_string(),
    }
}

/// Reports served until the user has any of their own, newest first.
pub fn sample_reports() -> Vec<Report> {
    vec![
        sample(
            "rep-001",
            "Annual Physical Examination",
            (2023, 12, 15),
            "Physical",
            "Dr. Sarah Johnson",
            ReportStatus::Completed,
            "Overall health is good. Blood pressure slightly elevated. Recommended lifestyle changes and follow-up in 3 months.",
        ),
        sample(
            "rep-002",
            "Blood Work Analysis",
            (2023, 11, 28),
            "Laboratory",
            "Dr. Michael Chen",
            ReportStatus::Reviewed,
            "Cholesterol levels within normal range. Vitamin D deficiency detected. Recommended supplements and dietary changes.",
        ),
        sample(
            "rep-003",
            "Cardiac Evaluation",
            (2023, 10, 5),
            "Specialist",
            "Dr. Emily Rodriguez",
            ReportStatus::Completed,
            "ECG shows normal heart rhythm. Stress test results normal. No significant cardiac concerns at this time.",
        ),
        sample(
            "rep-004",
            "Allergy Testing Results",
            (2023, 9, 12),
            "Laboratory",
            "Dr. James Wilson",
            ReportStatus::Reviewed,
            "Positive reaction to pollen and dust mites. Prescribed antihistamines and provided allergen avoidance strategies.",
        ),
        sample(
            "rep-005",
            "MRI Scan - Lower Back",
            (2023, 8, 20),
            "Imaging",
            "Dr. Lisa Thompson",
            ReportStatus::Pending,
            "Images taken successfully. Awaiting radiologist review and final report.",
        ),
    ]
}
