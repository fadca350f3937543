//! Remote extraction adapter for OpenAI-compatible chat-completion APIs.
//!
//! Each operation sends the labeled transcript with a fixed system prompt
//! and parses the reply into the fixed schema. A reply that cannot be
//! parsed into the schema earns one retry with the same input; service
//! failures and tone labels outside the allowed enumeration are surfaced
//! immediately, without retry.

use super::extractor::InsightExtractor;
use super::{Issue, Tone, ToneLabel};
use crate::config::ExtractionConfig;
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const ISSUES_SYSTEM_PROMPT: &str = "You are an expert at analyzing customer service calls. \
Extract all issues, complaints, and problems the customer mentioned. \
Each issue needs a short title, a more detailed description, and an evidence \
list of exact quotes from the transcript — quote, never invent. Group related \
complaints into single issues and ignore agent statements and positive feedback. \
Respond with a JSON object: {\"issues\": [{\"title\": ..., \"details\": ..., \"evidence\": [...]}]}. \
JSON only, no other text.";

const TONE_SYSTEM_PROMPT: &str = "You are an expert at analyzing customer service calls. \
Classify the customer's overall emotional tone as exactly one of: \
Calm (composed, polite), Frustrated (annoyance, repeated complaints, impatience), \
Angry (strong negative emotion, harsh language), Anxious (worry, uncertainty, concern). \
Judge only the customer's statements, not the agent's. \
Respond with a JSON object: {\"label\": ..., \"confidence\": <0.0-1.0>, \"evidence\": [2-3 short quotes]}. \
JSON only, no other text.";

// OpenAI-compatible request/response shapes
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[derive(Deserialize)]
struct IssuesPayload {
    #[serde(default)]
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct TonePayload {
    label: String,
    confidence: f64,
    #[serde(default)]
    evidence: Vec<String>,
}

/// Whether a failed extraction attempt may be retried with the same input.
enum ExtractFailure {
    /// Schema mismatch in an otherwise successful reply. Retried once:
    /// the model is nondeterministic, the same input may parse next time.
    Retryable(AnalyzerError),
    /// Service failure or contract violation. Surfaced without retry.
    Fatal(AnalyzerError),
}

/// Extractor backed by an OpenAI-compatible `chat/completions` endpoint.
pub struct RemoteExtractor {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    retry_backoff: Duration,
    client: reqwest::Client,
}

impl RemoteExtractor {
    pub fn new(config: &ExtractionConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AnalyzerError::internal(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            client,
        })
    }

    /// One chat-completion round trip; returns the raw assistant content.
    async fn complete(&self, system: &'static str, transcript: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Call transcript:\n\n{}", transcript),
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalyzerError::extraction("extraction service timed out")
                } else {
                    AnalyzerError::extraction(format!("extraction service unreachable: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::extraction(format!(
                "extraction service returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AnalyzerError::extraction(format!("malformed extraction response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AnalyzerError::extraction("extraction response has no choices"))?;

        Ok(strip_code_fences(&content).to_string())
    }

    async fn issues_once(&self, transcript: &str) -> std::result::Result<Vec<Issue>, ExtractFailure> {
        let content = self
            .complete(ISSUES_SYSTEM_PROMPT, transcript)
            .await
            .map_err(ExtractFailure::Fatal)?;

        let payload: IssuesPayload = serde_json::from_str(&content).map_err(|e| {
            ExtractFailure::Retryable(AnalyzerError::extraction(format!(
                "issue list does not match the expected schema: {}",
                e
            )))
        })?;

        Ok(payload.issues)
    }

    async fn tone_once(&self, transcript: &str) -> std::result::Result<Tone, ExtractFailure> {
        let content = self
            .complete(TONE_SYSTEM_PROMPT, transcript)
            .await
            .map_err(ExtractFailure::Fatal)?;

        let payload: TonePayload = serde_json::from_str(&content).map_err(|e| {
            ExtractFailure::Retryable(AnalyzerError::extraction(format!(
                "tone does not match the expected schema: {}",
                e
            )))
        })?;

        // Label violations are not retried: the model answered the question
        // but broke the enumeration contract.
        let label = ToneLabel::parse(&payload.label).map_err(ExtractFailure::Fatal)?;

        Ok(Tone {
            label,
            confidence: payload.confidence.clamp(0.0, 1.0),
            evidence: payload.evidence,
        })
    }
}

#[async_trait]
impl InsightExtractor for RemoteExtractor {
    async fn extract_issues(&self, transcript: &str) -> Result<Vec<Issue>> {
        match self.issues_once(transcript).await {
            Ok(issues) => Ok(issues),
            Err(ExtractFailure::Fatal(e)) => Err(e),
            Err(ExtractFailure::Retryable(first)) => {
                warn!(error = %first, "issue reply did not match the schema, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                match self.issues_once(transcript).await {
                    Ok(issues) => Ok(issues),
                    Err(ExtractFailure::Fatal(e)) | Err(ExtractFailure::Retryable(e)) => Err(e),
                }
            }
        }
    }

    async fn classify_tone(&self, transcript: &str) -> Result<Tone> {
        match self.tone_once(transcript).await {
            Ok(tone) => Ok(tone),
            Err(ExtractFailure::Fatal(e)) => Err(e),
            Err(ExtractFailure::Retryable(first)) => {
                warn!(error = %first, "tone reply did not match the schema, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                match self.tone_once(transcript).await {
                    Ok(tone) => Ok(tone),
                    Err(ExtractFailure::Fatal(e)) | Err(ExtractFailure::Retryable(e)) => Err(e),
                }
            }
        }
    }
}

/// Strip markdown code fences some models wrap around JSON replies.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
