// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health report operations.
//!
//! Users without stored reports see the sample set, so the reports page is
//! never empty on first visit.

use super::{collections, data_error, new_id, Database, Query};
use crate::error::{AppError, ValidationError};
use crate::models::report::{sample_reports, ShareReportRequest};
use crate::models::{Report, ReportDraft};
use crate::services::realtime::ChangeEvent;
use validator::Validate;

const ENTITY: &str = "report";

impl Database {
    /// The user's reports, newest first, falling back to the samples.
    pub async fn list_reports(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<Report>, AppError> {
        let query = Query::new()
            .eq("user_id", user_id)
            .order_desc("date")
            .limit_opt(limit);
        let reports: Vec<Report> = self
            .query(collections::REPORTS, query)
            .await
            .map_err(|e| data_error("list", ENTITY, e))?;

        if !reports.is_empty() {
            return Ok(reports);
        }

        let mut samples = sample_reports();
        if let Some(n) = limit {
            samples.truncate(n as usize);
        }
        Ok(samples)
    }

    /// One of the user's reports, or a sample report by its id.
    pub async fn get_report(&self, user_id: &str, id: &str) -> Result<Option<Report>, AppError> {
        let stored: Option<Report> = self
            .get(collections::REPORTS, id)
            .await
            .map_err(|e| data_error("get", ENTITY, e))?;

        if let Some(report) = stored {
            return Ok((report.user_id.as_deref() == Some(user_id)).then_some(report));
        }
        Ok(sample_reports().into_iter().find(|r| r.id == id))
    }

    /// Store a report built from `draft`, filling defaults.
    pub async fn create_report(&self, user_id: &str, draft: ReportDraft) -> Result<Report, AppError> {
        draft.validate().map_err(ValidationError::from)?;

        let report = draft.into_report(new_id(), user_id, crate::time_utils::today());
        self.put(collections::REPORTS, &report.id, &report)
            .await
            .map_err(|e| data_error("insert", ENTITY, e))?;

        self.publish(collections::REPORTS, ChangeEvent::Insert, user_id, Some(&report), None);
        Ok(report)
    }

    /// Record a share request. Delivery is not implemented; the request is logged.
    pub async fn share_report(
        &self,
        user_id: &str,
        id: &str,
        request: ShareReportRequest,
    ) -> Result<bool, AppError> {
        request.validate().map_err(ValidationError::from)?;

        if self.get_report(user_id, id).await?.is_none() {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }

        tracing::info!(user_id, report_id = id, "Report share requested");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::RealtimeBridge;

    #[tokio::test]
    async fn test_samples_until_first_report() {
        let db = Database::in_memory(RealtimeBridge::new());
        let reports = db.list_reports("u1", None).await.unwrap();
        assert_eq!(reports.len(), 5);
        assert_eq!(reports[0].id, "rep-001");

        let created = db.create_report("u1", ReportDraft::default()).await.unwrap();
        let reports = db.list_reports("u1", None).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, created.id);

        // Samples stay reachable by id
        assert!(db.get_report("u1", "rep-003").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reports_are_private() {
        let db = Database::in_memory(RealtimeBridge::new());
        let created = db.create_report("u1", ReportDraft::default()).await.unwrap();
        assert!(db.get_report("u2", &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_share_validates_email() {
        let db = Database::in_memory(RealtimeBridge::new());
        let err = db
            .share_report(
                "u1",
                "rep-001",
                ShareReportRequest {
                    email: "not-an-email".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let ok = db
            .share_report(
                "u1",
                "rep-001",
                ShareReportRequest {
                    email: "doctor@example.com".into(),
                },
            )
            .await
            .unwrap();
        assert!(ok);
    }
}
