// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Feature flows: chat, diagnosis, image analysis, drug discovery and
//! dataset generation.
//!
//! Each flow asks the completion gateway first and falls back to the local
//! generators when that fails. The result is always returned; the activity
//! record is queued afterwards and its outcome never reaches the caller.

use crate::error::{GatewayError, ValidationError};
use crate::generators::chat;
use crate::generators::dataset::{self, DatasetConfig, Row};
use crate::generators::diagnosis::{self, DiagnosisInput, DiagnosisResult};
use crate::generators::drug::{self, DrugCandidate, DrugRequest};
use crate::generators::image::{self, AnalysisResult, AnalyzeImageRequest};
use crate::models::NewActivity;
use crate::services::activity_log::ActivityLogger;
use crate::services::completion::CompletionGateway;
use crate::services::task::{Task, TaskError};
use crate::services::wizard::{DiagnosisStep, DrugStep, ImageStep, Wizard};
use crate::time_utils;
use serde::Serialize;
use std::time::Duration;

/// Extra time given to a gateway task beyond the HTTP timeout.
const TASK_GRACE: Duration = Duration::from_secs(5);

type Completion = Result<String, GatewayError>;

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ai,
    Fallback,
}

/// Why the completion provider was not used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiNotice {
    pub error: String,
    pub missing_credential: bool,
}

impl From<&GatewayError> for AiNotice {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: err.to_string(),
            missing_credential: matches!(err, GatewayError::MissingCredential),
        }
    }
}

impl From<TaskError> for AiNotice {
    fn from(err: TaskError) -> Self {
        Self {
            error: err.to_string(),
            missing_credential: false,
        }
    }
}

fn settle(outcome: Result<Completion, TaskError>) -> Result<String, AiNotice> {
    match outcome {
        Ok(Ok(content)) => Ok(content),
        Ok(Err(e)) => Err(AiNotice::from(&e)),
        Err(e) => Err(AiNotice::from(e)),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub content: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<AiNotice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisOutcome {
    pub step: DiagnosisStep,
    pub results: Vec<DiagnosisResult>,
    /// Unparsed provider text, shown beside the parsed results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_text: Option<String>,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<AiNotice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageOutcome {
    pub step: ImageStep,
    pub analysis: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<AiNotice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrugOutcome {
    pub step: DrugStep,
    pub candidates: Vec<DrugCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<AiNotice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOutcome {
    pub config: DatasetConfig,
    pub row_count: usize,
    pub rows: Vec<Row>,
}

#[derive(Clone)]
pub struct Assistant {
    gateway: CompletionGateway,
    activity_log: ActivityLogger,
    deadline: Duration,
}

impl Assistant {
    pub fn new(gateway: CompletionGateway, activity_log: ActivityLogger, completion_timeout: Duration) -> Self {
        Self {
            gateway,
            activity_log,
            deadline: completion_timeout + TASK_GRACE,
        }
    }

    /// Answer a chat message, with a keyword reply as fallback.
    pub async fn chat(&self, user_id: &str, message: &str) -> Result<ChatReply, ValidationError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::new("Message must not be empty"));
        }

        let gateway = self.gateway.clone();
        let (user, query) = (user_id.to_string(), message.to_string());
        let task = Task::spawn(async move { gateway.generate_medical_response(&user, &query).await });

        let reply = match settle(task.join_timeout(self.deadline).await) {
            Ok(content) => ChatReply {
                content,
                source: Source::Ai,
                notice: None,
            },
            Err(notice) => {
                tracing::debug!(user_id, error = %notice.error, "Chat falling back to canned reply");
                ChatReply {
                    content: chat::canned_reply(message).to_string(),
                    source: Source::Fallback,
                    notice: Some(notice),
                }
            }
        };

        self.activity_log.log(NewActivity::chat(user_id, message));
        Ok(reply)
    }

    /// Run the diagnosis wizard to its results step.
    pub async fn diagnose(&self, user_id: &str, input: &DiagnosisInput) -> Result<DiagnosisOutcome, ValidationError> {
        let mut wizard: Wizard<DiagnosisStep, Completion> = Wizard::new();
        let checked = input.check()?;
        wizard.advance()?;

        let gateway = self.gateway.clone();
        let user = user_id.to_string();
        let names = checked.symptom_names();
        let answers = checked.prompt_answers();
        wizard.start(Task::spawn(async move {
            gateway.generate_diagnosis(&user, &names, &answers).await
        }));

        let outcome = settle(wizard.complete(self.deadline).await);
        let (results, diagnosis_text, source, notice) = match outcome {
            Ok(text) => (diagnosis::parse_ai_diagnosis(&text), Some(text), Source::Ai, None),
            Err(notice) => {
                let key = diagnosis::fallback_key(&checked.symptom_ids());
                tracing::debug!(user_id, key = %key, error = %notice.error, "Using canned diagnosis");
                (diagnosis::canned_results(&key), None, Source::Fallback, Some(notice))
            }
        };

        self.activity_log
            .log(NewActivity::diagnosis(user_id, &checked.symptom_names()));

        Ok(DiagnosisOutcome {
            step: DiagnosisStep::Results,
            results,
            diagnosis_text,
            source,
            notice,
        })
    }

    /// Analyze an uploaded image, attaching commentary when available.
    pub async fn analyze_image(&self, user_id: &str, request: &AnalyzeImageRequest) -> Result<ImageOutcome, ValidationError> {
        let mut wizard: Wizard<ImageStep, Completion> = Wizard::new();
        let (image_type, file_name) = request.check()?;
        wizard.advance()?;

        let mut analysis = image::canned_analysis(image_type);

        let gateway = self.gateway.clone();
        let user = user_id.to_string();
        let findings = analysis.findings.clone();
        wizard.start(Task::spawn(async move {
            gateway
                .analyze_medical_image(&user, image_type.display_name(), &findings)
                .await
        }));

        let notice = match settle(wizard.complete(self.deadline).await) {
            Ok(text) => {
                analysis.ai_interpretation = Some(text);
                None
            }
            Err(notice) => Some(notice),
        };

        self.activity_log
            .log(NewActivity::image_analysis(user_id, file_name));

        Ok(ImageOutcome {
            step: ImageStep::Results,
            analysis,
            notice,
        })
    }

    /// Generate drug candidates, with provider insights when available.
    pub async fn discover_drugs(&self, user_id: &str, request: &DrugRequest) -> Result<DrugOutcome, ValidationError> {
        let mut wizard: Wizard<DrugStep, Completion> = Wizard::new();
        let (input, count) = request.check()?;
        wizard.advance()?;

        let gateway = self.gateway.clone();
        let user = user_id.to_string();
        let (task_input, method) = (input.to_string(), request.method.as_str());
        wizard.start(Task::spawn(async move {
            gateway.generate_drug_info(&user, &task_input, method).await
        }));

        let candidates = {
            let mut rng = rand::thread_rng();
            drug::generate(request.method, input, count, time_utils::epoch_millis(), &mut rng)
        };

        let (insights, notice) = match settle(wizard.complete(self.deadline).await) {
            Ok(text) => (Some(text), None),
            Err(notice) => (None, Some(notice)),
        };

        self.activity_log
            .log(NewActivity::drug_discovery(user_id, candidates.len(), method));

        Ok(DrugOutcome {
            step: DrugStep::Results,
            candidates,
            insights,
            notice,
        })
    }

    /// Fabricate a dataset from `config`.
    pub fn generate_dataset(&self, user_id: &str, config: DatasetConfig) -> Result<DatasetOutcome, ValidationError> {
        config.check()?;

        let rows = {
            let mut rng = rand::thread_rng();
            dataset::generate(&config, time_utils::today(), &mut rng)
        };

        self.activity_log.log(NewActivity::dataset(
            user_id,
            rows.len(),
            config.data_type.as_str(),
        ));

        Ok(DatasetOutcome {
            row_count: rows.len(),
            config,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Database;
    use crate::generators::dataset::{preset, DatasetType};
    use crate::generators::drug::GenerationMethod;
    use crate::generators::image::ImageType;
    use crate::services::kms::KmsService;
    use crate::services::realtime::RealtimeBridge;
    use std::collections::HashMap;

    /// Assistant over an offline store: no key lookups and no activity writes succeed.
    fn offline_assistant() -> (Assistant, tokio::sync::mpsc::UnboundedReceiver<crate::services::activity_log::ActivityLogFailure>) {
        let config = Config::test_default();
        let db = Database::new_mock();
        let gateway = CompletionGateway::new(&config, db.clone(), KmsService::new_mock()).unwrap();
        let (logger, failures) = ActivityLogger::spawn_with_failures(db);
        (Assistant::new(gateway, logger, config.completion_timeout), failures)
    }

    #[tokio::test]
    async fn test_chat_falls_back_without_key() {
        let (assistant, mut failures) = offline_assistant();
        let reply = assistant.chat("u1", "I have a fever").await.unwrap();
        assert_eq!(reply.source, Source::Fallback);
        assert!(reply.content.starts_with("A fever"));
        assert!(reply.notice.unwrap().missing_credential);

        // The failed activity write is reported but did not affect the reply
        let failure = failures.recv().await.unwrap();
        assert_eq!(failure.activity.title, "AI Chat Session");
    }

    #[tokio::test]
    async fn test_diagnosis_uses_canned_bundle() {
        let (assistant, _failures) = offline_assistant();
        let input = DiagnosisInput {
            symptom_ids: vec!["2".into(), "1".into()],
            answers: HashMap::from([
                ("h1".to_string(), "4-7 (Moderate)".to_string()),
                ("h2".to_string(), "1-3 days".to_string()),
                ("h3".to_string(), "All over".to_string()),
                ("f1".to_string(), "I haven't measured".to_string()),
                ("f2".to_string(), "1-3 days".to_string()),
                ("f3".to_string(), "Constant".to_string()),
            ]),
            additional_info: None,
        };
        let outcome = assistant.diagnose("u1", &input).await.unwrap();
        assert_eq!(outcome.step, DiagnosisStep::Results);
        assert_eq!(outcome.source, Source::Fallback);
        assert_eq!(outcome.results[0].condition, "Common Cold");
        assert!(outcome.diagnosis_text.is_none());
    }

    #[tokio::test]
    async fn test_validation_happens_first() {
        let (assistant, _failures) = offline_assistant();
        assert!(assistant.chat("u1", "   ").await.is_err());
        assert!(assistant.diagnose("u1", &DiagnosisInput::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_image_and_drug_flows_reach_results() {
        let (assistant, _failures) = offline_assistant();
        let image = assistant
            .analyze_image(
                "u1",
                &AnalyzeImageRequest {
                    image_type: Some(ImageType::Report),
                    file_name: "labs.pdf".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(image.step, ImageStep::Results);
        assert!(image.analysis.ai_interpretation.is_none());

        let drugs = assistant
            .discover_drugs(
                "u1",
                &DrugRequest {
                    method: GenerationMethod::Protein,
                    input: "EGFR".into(),
                    count: Some(4),
                },
            )
            .await
            .unwrap();
        assert_eq!(drugs.step, DrugStep::Results);
        assert_eq!(drugs.candidates.len(), 4);
        assert!(drugs.insights.is_none());
    }

    #[tokio::test]
    async fn test_dataset_flow() {
        let (assistant, _failures) = offline_assistant();
        let mut config = preset(DatasetType::LabResults);
        config.size = 12;
        let outcome = assistant.generate_dataset("u1", config).unwrap();
        assert_eq!(outcome.row_count, 12);
    }
}
