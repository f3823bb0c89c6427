// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI tool routes and their downloads.

use crate::error::{AppError, Result};
use crate::generators::dataset::{self, DatasetConfig, DatasetType, Row};
use crate::generators::diagnosis::{self, DiagnosisInput, DiagnosisResult, FollowUpQuestion, Symptom};
use crate::generators::drug::{self, DrugCandidate, DrugRequest};
use crate::generators::image::{self, AnalysisResult, AnalyzeImageRequest};
use crate::generators::{Export, ExportError, ExportFormat};
use crate::middleware::auth::AuthUser;
use crate::services::assistant::{ChatReply, DatasetOutcome, DiagnosisOutcome, DrugOutcome, ImageOutcome};
use crate::time_utils;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/diagnosis", post(diagnose))
        .route("/api/diagnosis/symptoms", get(list_symptoms))
        .route("/api/diagnosis/follow-up", post(follow_up))
        .route("/api/diagnosis/report", post(diagnosis_report))
        .route("/api/image-analysis", post(analyze_image))
        .route("/api/image-analysis/report", post(image_report))
        .route("/api/datasets", post(generate_dataset))
        .route("/api/datasets/presets/{type}", get(dataset_preset))
        .route("/api/datasets/export", post(export_dataset))
        .route("/api/drug-candidates", post(discover_drugs))
        .route("/api/drug-candidates/export", post(export_drugs))
}

impl IntoResponse for Export {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        let mut response = self.body.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

#[derive(Deserialize)]
pub struct FormatQuery {
    #[serde(default)]
    format: ExportFormat,
}

fn encoding_error(e: ExportError) -> AppError {
    AppError::Internal(anyhow::anyhow!("Export encoding failed: {}", e))
}

// ─── Chat ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChatRequest {
    message: String,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    Ok(Json(state.assistant.chat(&user.user_id, &body.message).await?))
}

// ─── Diagnosis ───────────────────────────────────────────────

async fn list_symptoms() -> Json<Vec<Symptom>> {
    Json(diagnosis::SYMPTOMS.to_vec())
}

#[derive(Deserialize)]
pub struct FollowUpRequest {
    symptom_ids: Vec<String>,
}

/// Questions to ask for the selected symptoms, in catalog order.
async fn follow_up(Json(body): Json<FollowUpRequest>) -> Result<Json<Vec<FollowUpQuestion>>> {
    let symptoms = diagnosis::selected_symptoms(&body.symptom_ids)?;
    Ok(Json(diagnosis::questions_for(&symptoms)))
}

async fn diagnose(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<DiagnosisInput>,
) -> Result<Json<DiagnosisOutcome>> {
    Ok(Json(state.assistant.diagnose(&user.user_id, &input).await?))
}

#[derive(Deserialize)]
pub struct DiagnosisReportRequest {
    #[serde(flatten)]
    input: DiagnosisInput,
    results: Vec<DiagnosisResult>,
}

async fn diagnosis_report(Json(body): Json<DiagnosisReportRequest>) -> Result<Export> {
    let checked = body.input.check()?;
    if body.results.is_empty() {
        return Err(AppError::BadRequest("No diagnosis results to report".to_string()));
    }
    let text = diagnosis::render_report(time_utils::today(), &checked, &body.results);
    Ok(Export::text(
        diagnosis::report_filename(time_utils::epoch_millis()),
        text,
    ))
}

// ─── Image Analysis ──────────────────────────────────────────

async fn analyze_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AnalyzeImageRequest>,
) -> Result<Json<ImageOutcome>> {
    Ok(Json(
        state.assistant.analyze_image(&user.user_id, &request).await?,
    ))
}

async fn image_report(Json(result): Json<AnalysisResult>) -> Export {
    Export::text(
        image::report_filename(time_utils::epoch_millis()),
        image::render_report(time_utils::today(), &result),
    )
}

// ─── Datasets ────────────────────────────────────────────────

async fn dataset_preset(Path(data_type): Path<DatasetType>) -> Json<DatasetConfig> {
    Json(dataset::preset(data_type))
}

async fn generate_dataset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(config): Json<DatasetConfig>,
) -> Result<Json<DatasetOutcome>> {
    Ok(Json(state.assistant.generate_dataset(&user.user_id, config)?))
}

#[derive(Deserialize)]
pub struct DatasetExportRequest {
    config: DatasetConfig,
    /// Previously generated rows; generated fresh when absent.
    #[serde(default)]
    rows: Option<Vec<Row>>,
}

async fn export_dataset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FormatQuery>,
    Json(body): Json<DatasetExportRequest>,
) -> Result<Export> {
    let (config, rows) = match body.rows {
        Some(rows) => {
            body.config.check()?;
            (body.config, rows)
        }
        None => {
            let outcome = state.assistant.generate_dataset(&user.user_id, body.config)?;
            (outcome.config, outcome.rows)
        }
    };

    dataset::export(&config, &rows, params.format, time_utils::epoch_millis())
        .map_err(encoding_error)
}

// ─── Drug Candidates ─────────────────────────────────────────

async fn discover_drugs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<DrugRequest>,
) -> Result<Json<DrugOutcome>> {
    Ok(Json(
        state.assistant.discover_drugs(&user.user_id, &request).await?,
    ))
}

#[derive(Deserialize)]
pub struct DrugExportRequest {
    candidates: Vec<DrugCandidate>,
}

async fn export_drugs(
    Query(params): Query<FormatQuery>,
    Json(body): Json<DrugExportRequest>,
) -> Result<Export> {
    if body.candidates.is_empty() {
        return Err(AppError::BadRequest("No candidates to export".to_string()));
    }
    drug::export(&body.candidates, params.format).map_err(encoding_error)
}
