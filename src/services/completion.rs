// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat-completion gateway.
//!
//! Looks up the caller's active provider key, posts a chat-completion request
//! and turns every failure into a [`GatewayError`] value. Nothing here panics
//! or returns an `AppError`; feature flows decide how to fall back.

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, GatewayError};
use crate::models::Provider;
use crate::services::kms::KmsService;
use serde::{Deserialize, Serialize};

const GENERIC_ERROR: &str = "Error calling OpenAI API";

const MEDICAL_PROMPT: &str = "You are an AI medical assistant for Medgen AI. Provide helpful, accurate, and concise information about medical topics. \n  Always include a disclaimer that you're not a substitute for professional medical advice. \n  If asked about serious symptoms, always recommend consulting a healthcare professional.";

const IMAGE_PROMPT: &str = "You are an AI medical image analysis assistant for Medgen AI. Based on the image type and findings provided, generate a detailed analysis and interpretation.";

const DIAGNOSIS_PROMPT: &str = "You are an AI medical diagnosis assistant for Medgen AI. Based on the symptoms and additional information provided, suggest possible conditions and recommendations. Always include a disclaimer about consulting healthcare professionals.";

const DRUG_PROMPT: &str = "You are an AI pharmaceutical assistant for Medgen AI's drug discovery feature. Based on the input provided, generate information about potential drug compounds, their properties, and possible applications. Include appropriate disclaimers about the theoretical nature of this information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Per-call overrides. `model: None` uses the configured model.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

impl CompletionOptions {
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            ..Default::default()
        }
    }
}

// ─── Provider wire format ────────────────────────────────────────

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: Option<ProviderErrorDetail>,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

/// Gateway result as sent to clients: content or error, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompletionReply {
    Content {
        content: String,
    },
    Error {
        error: String,
        missing_credential: bool,
    },
}

impl From<Result<String, GatewayError>> for CompletionReply {
    fn from(result: Result<String, GatewayError>) -> Self {
        match result {
            Ok(content) => Self::Content { content },
            Err(err) => Self::Error {
                missing_credential: err == GatewayError::MissingCredential,
                error: err.to_string(),
            },
        }
    }
}

/// Chat-completion client bound to the key store.
#[derive(Clone)]
pub struct CompletionGateway {
    http: reqwest::Client,
    base_url: String,
    model: String,
    db: Database,
    kms: KmsService,
}

impl CompletionGateway {
    pub fn new(config: &Config, db: Database, kms: KmsService) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.completion_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.openai_api_url.clone(),
            model: config.openai_model.clone(),
            db,
            kms,
        })
    }

    /// Run one chat completion for `user_id` with their active key.
    pub async fn call_completion(
        &self,
        user_id: &str,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<String, GatewayError> {
        let api_key = match self
            .db
            .active_api_key(&self.kms, user_id, Provider::OpenAi)
            .await
        {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "API key lookup failed");
                None
            }
        };

        let Some(api_key) = api_key else {
            tracing::debug!(user_id, "No active API key, skipping completion call");
            return Err(GatewayError::MissingCredential);
        };

        let body = CompletionRequest {
            model: options.model.as_deref().unwrap_or(&self.model),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(user_id, error = %e, "Completion request failed");
                GatewayError::Provider(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            tracing::warn!(user_id, status = status.as_u16(), "Completion provider error");
            return Err(GatewayError::Provider(message));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Provider(format!("Invalid completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::Provider(GENERIC_ERROR.to_string()))
    }

    // ─── Prompt wrappers ─────────────────────────────────────────

    pub async fn generate_medical_response(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<String, GatewayError> {
        let messages = [ChatMessage::system(MEDICAL_PROMPT), ChatMessage::user(query)];
        self.call_completion(user_id, &messages, CompletionOptions::default())
            .await
    }

    pub async fn analyze_medical_image(
        &self,
        user_id: &str,
        image_type: &str,
        findings: &[String],
    ) -> Result<String, GatewayError> {
        let messages = [
            ChatMessage::system(IMAGE_PROMPT),
            ChatMessage::user(image_prompt(image_type, findings)),
        ];
        self.call_completion(user_id, &messages, CompletionOptions::with_max_tokens(800))
            .await
    }

    /// `answers` are (question, answer) pairs in display order.
    pub async fn generate_diagnosis(
        &self,
        user_id: &str,
        symptoms: &[String],
        answers: &[(String, String)],
    ) -> Result<String, GatewayError> {
        let messages = [
            ChatMessage::system(DIAGNOSIS_PROMPT),
            ChatMessage::user(diagnosis_prompt(symptoms, answers)),
        ];
        self.call_completion(user_id, &messages, CompletionOptions::with_max_tokens(1000))
            .await
    }

    pub async fn generate_drug_info(
        &self,
        user_id: &str,
        input: &str,
        method: &str,
    ) -> Result<String, GatewayError> {
        let messages = [
            ChatMessage::system(DRUG_PROMPT),
            ChatMessage::user(format!(
                "Method: {}\nInput: {}\n\nPlease provide information about potential drug compounds based on this input.",
                method, input
            )),
        ];
        self.call_completion(user_id, &messages, CompletionOptions::with_max_tokens(1000))
            .await
    }
}

fn image_prompt(image_type: &str, findings: &[String]) -> String {
    format!(
        "Image Type: {}\nFindings: {}\n\nPlease provide a detailed analysis and interpretation of these findings.",
        image_type,
        findings.join("\n- ")
    )
}

fn diagnosis_prompt(symptoms: &[String], answers: &[(String, String)]) -> String {
    let formatted: Vec<String> = answers
        .iter()
        .map(|(q, a)| format!("{}: {}", q, a))
        .collect();
    format!(
        "Symptoms: {}\n\nAdditional Information:\n{}\n\nPlease provide potential diagnoses based on these symptoms and information.",
        symptoms.join(", "),
        formatted.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::RealtimeBridge;

    #[test]
    fn test_diagnosis_prompt_layout() {
        let prompt = diagnosis_prompt(
            &["Headache".into(), "Fever".into()],
            &[("How long?".into(), "1-3 days".into())],
        );
        assert_eq!(
            prompt,
            "Symptoms: Headache, Fever\n\nAdditional Information:\nHow long?: 1-3 days\n\nPlease provide potential diagnoses based on these symptoms and information."
        );
    }

    #[test]
    fn test_image_prompt_joins_findings() {
        let prompt = image_prompt("X-Ray", &["a".into(), "b".into()]);
        assert!(prompt.starts_with("Image Type: X-Ray\nFindings: a\n- b\n\n"));
    }

    #[test]
    fn test_reply_is_exclusive() {
        let ok = serde_json::to_value(CompletionReply::from(Ok("hi".to_string()))).unwrap();
        assert_eq!(ok, serde_json::json!({"content": "hi"}));

        let err = serde_json::to_value(CompletionReply::from(Err(GatewayError::MissingCredential)))
            .unwrap();
        assert!(err.get("content").is_none());
        assert_eq!(err["missing_credential"], true);
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let db = Database::in_memory(RealtimeBridge::new());
        let gateway =
            CompletionGateway::new(&Config::test_default(), db, KmsService::new_mock()).unwrap();
        let err = gateway
            .generate_medical_response("u1", "hello")
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::MissingCredential);
    }
}
