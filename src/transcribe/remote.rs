//! Remote transcription adapter for OpenAI-compatible transcription APIs.
//!
//! Posts the normalized waveform as a multipart upload and parses the
//! `verbose_json` segment list. One bounded retry with a short backoff
//! covers transient network faults; everything else surfaces as a
//! `Transcription` error.

use crate::config::TranscriptionConfig;
use crate::error::{AnalyzerError, Result};
use crate::transcript::RawSegment;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use super::transcriber::Transcriber;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    segments: Vec<ApiSegment>,
}

#[derive(Debug, Deserialize)]
struct ApiSegment {
    #[serde(default)]
    text: String,
    start: f64,
    end: f64,
}

/// Transcriber backed by an OpenAI-compatible `audio/transcriptions`
/// endpoint (OpenAI Whisper API, or any self-hosted server speaking the
/// same protocol).
pub struct RemoteTranscriber {
    base_url: String,
    api_key: String,
    model: String,
    retry_backoff: Duration,
    client: reqwest::Client,
}

impl RemoteTranscriber {
    pub fn new(config: &TranscriptionConfig, api_key: String) -> Result<Self> {
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
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            client,
        })
    }

    async fn request_segments(&self, wav: &[u8]) -> Result<Vec<RawSegment>> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let part = reqwest::multipart::Part::bytes(wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| AnalyzerError::transcription(format!("invalid upload part: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalyzerError::transcription("transcription service timed out")
                } else {
                    AnalyzerError::transcription(format!(
                        "transcription service unreachable: {}",
                        e
                    ))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::transcription(format!(
                "transcription service returned {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            AnalyzerError::transcription(format!("malformed transcription response: {}", e))
        })?;

        // Segment boundaries and text are taken verbatim from the service;
        // the orchestrator normalizes ordering and trims text. Zero segments
        // is valid output (silence-only audio).
        Ok(parsed
            .segments
            .into_iter()
            .map(|s| RawSegment {
                text: s.text,
                start: s.start,
                end: s.end,
            })
            .collect())
    }
}

#[async_trait]
impl Transcriber for RemoteTranscriber {
    async fn transcribe(&self, wav: &[u8]) -> Result<Vec<RawSegment>> {
        match self.request_segments(wav).await {
            Ok(segments) => Ok(segments),
            Err(first) => {
                // Single bounded retry: transient faults are common on this
                // one external call, silent unbounded retries are not allowed.
                warn!(error = %first, "transcription attempt failed, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.request_segments(wav).await
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
