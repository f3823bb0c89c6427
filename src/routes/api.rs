// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data routes for authenticated users: profile, activities, medical
//! history, health stats, reports and API keys.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    filter_reports, Activity, ActivityType, ApiKey, ApiKeyToggle, HealthStats, HealthStatsUpdate,
    MedicalHistoryItem, NewApiKey, NewMedicalHistoryItem, Report, ReportDraft, ShareReportRequest,
    User, UserProfileUpdate,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Largest page any list endpoint returns.
const MAX_LIST_LIMIT: u32 = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/activities", get(get_activities))
        .route(
            "/api/medical-history",
            get(get_medical_history).post(add_medical_history),
        )
        .route("/api/medical-history/{id}", delete(delete_medical_history))
        .route(
            "/api/health-stats",
            get(get_health_stats).put(update_health_stats),
        )
        .route("/api/reports", get(get_reports).post(create_report))
        .route("/api/reports/{id}", get(get_report))
        .route("/api/reports/{id}/share", post(share_report))
        .route("/api/api-keys", get(get_api_keys).post(create_api_key))
        .route(
            "/api/api-keys/{id}",
            patch(toggle_api_key).delete(delete_api_key),
        )
}

fn clamp_limit(limit: Option<u32>) -> Option<u32> {
    limit.map(|l| l.clamp(1, MAX_LIST_LIMIT))
}

/// Generic acknowledgement body.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SuccessResponse {
    pub success: bool,
}

// ─── User Profile ────────────────────────────────────────────

/// Stored profile, or one derived from the email when none exists yet.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state.db.get_user_profile(&user.user_id).await?;
    Ok(Json(
        profile.unwrap_or_else(|| User::fallback(&user.user_id, &user.email)),
    ))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<UserProfileUpdate>,
) -> Result<Json<User>> {
    let profile = state
        .db
        .upsert_user_profile(&user.user_id, &user.email, update)
        .await?;
    Ok(Json(profile))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ActivitiesQuery {
    #[serde(rename = "type")]
    activity_type: Option<String>,
    limit: Option<u32>,
}

async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<Vec<Activity>>> {
    let limit = clamp_limit(params.limit);
    let activities = match params.activity_type.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => {
            let activity_type: ActivityType = t.parse().map_err(AppError::BadRequest)?;
            state
                .db
                .list_activities_by_type(&user.user_id, activity_type, limit)
                .await?
        }
        None => state.db.list_activities(&user.user_id, limit).await?,
    };
    Ok(Json(activities))
}

// ─── Medical History ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<u32>,
}

async fn get_medical_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<MedicalHistoryItem>>> {
    let items = state
        .db
        .list_medical_history(&user.user_id, clamp_limit(params.limit))
        .await?;
    Ok(Json(items))
}

async fn add_medical_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewMedicalHistoryItem>,
) -> Result<(StatusCode, Json<MedicalHistoryItem>)> {
    let item = state
        .db
        .add_medical_history_item(&user.user_id, new)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_medical_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state
        .db
        .delete_medical_history_item(&user.user_id, &id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ─── Health Stats ────────────────────────────────────────────

/// `null` until the user records their first vitals.
async fn get_health_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Option<HealthStats>>> {
    Ok(Json(state.db.get_health_stats(&user.user_id).await?))
}

async fn update_health_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<HealthStatsUpdate>,
) -> Result<Json<HealthStats>> {
    let stats = state
        .db
        .upsert_health_stats(&user.user_id, update)
        .await?;
    Ok(Json(stats))
}

// ─── Reports ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReportsQuery {
    #[serde(rename = "type")]
    report_type: Option<String>,
    q: Option<String>,
    limit: Option<u32>,
}

async fn get_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ReportsQuery>,
) -> Result<Json<Vec<Report>>> {
    // Filter the full list; the limit applies to matches
    let reports = state.db.list_reports(&user.user_id, None).await?;
    let mut matched = filter_reports(reports, params.report_type.as_deref(), params.q.as_deref());
    if let Some(limit) = clamp_limit(params.limit) {
        matched.truncate(limit as usize);
    }
    Ok(Json(matched))
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Report>> {
    let report = state
        .db
        .get_report(&user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;
    Ok(Json(report))
}

async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<ReportDraft>,
) -> Result<(StatusCode, Json<Report>)> {
    let report = state.db.create_report(&user.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn share_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<ShareReportRequest>,
) -> Result<Json<SuccessResponse>> {
    let success = state.db.share_report(&user.user_id, &id, request).await?;
    Ok(Json(SuccessResponse { success }))
}

// ─── API Keys ────────────────────────────────────────────────

/// Keys are listed masked; the secret never leaves the server.
async fn get_api_keys(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ApiKey>>> {
    Ok(Json(state.db.list_api_keys(&user.user_id).await?))
}

async fn create_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(new): Json<NewApiKey>,
) -> Result<(StatusCode, Json<ApiKey>)> {
    let key = state
        .db
        .create_api_key(&state.kms, &user.user_id, new)
        .await?;
    Ok((StatusCode::CREATED, Json(key)))
}

async fn toggle_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(toggle): Json<ApiKeyToggle>,
) -> Result<Json<ApiKey>> {
    let key = state
        .db
        .set_api_key_active(&user.user_id, &id, toggle.is_active)
        .await?;
    Ok(Json(key))
}

async fn delete_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_api_key(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
