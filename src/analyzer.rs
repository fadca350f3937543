//! Per-request call analysis orchestrator.
//!
//! Sequences intake → transcription → attribution → extraction/statistics
//! → assembly, with all-or-nothing semantics: any stage failure aborts the
//! request and no partial result is ever returned. The normalized waveform
//! is a Drop-guarded temp file owned here, so cleanup runs on success,
//! failure, and cancellation.

use crate::audio::{AudioIntake, AudioUpload};
use crate::config::Config;
use crate::error::Result;
use crate::insight::{InsightExtractor, Issue, Tone};
use crate::stats::{self, SpeakerStatistics};
use crate::transcribe::Transcriber;
use crate::transcript::{self, TranscriptSegment, round2};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

/// Pipeline stages, in execution order. `Failed` absorbs any stage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validating,
    Normalizing,
    Transcribing,
    Attributing,
    Extracting,
    Assembling,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validating => "validating",
            Stage::Normalizing => "normalizing",
            Stage::Transcribing => "transcribing",
            Stage::Attributing => "attributing",
            Stage::Extracting => "extracting",
            Stage::Assembling => "assembling",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Request metadata attached to every successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub filename: String,
    pub file_size_mb: f64,
    pub processing_time_seconds: f64,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub segment_count: usize,
    pub speaker_statistics: SpeakerStatistics,
}

/// Complete analysis for one call. Assembled once, never mutated,
/// discarded after the response is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub transcript: Vec<TranscriptSegment>,
    pub issues: Vec<Issue>,
    pub tone: Tone,
    pub metadata: Metadata,
}

/// Orchestrates the analysis pipeline for independent, stateless requests.
///
/// Adapters are shared across concurrent requests via `Arc`; each request
/// gets its own id and its own scoped temp file, so no locking is needed.
pub struct CallAnalyzer {
    config: Config,
    intake: AudioIntake,
    transcriber: Arc<dyn Transcriber>,
    extractor: Arc<dyn InsightExtractor>,
}

impl CallAnalyzer {
    pub fn new(
        config: Config,
        transcriber: Arc<dyn Transcriber>,
        extractor: Arc<dyn InsightExtractor>,
    ) -> Self {
        let intake = AudioIntake::new(config.intake.clone(), config.temp_dir());
        Self {
            config,
            intake,
            transcriber,
            extractor,
        }
    }

    /// Analyze one uploaded call recording.
    ///
    /// All-or-nothing: returns the full `AnalysisResult` or the first stage
    /// error. The temp waveform never outlives this call.
    pub async fn analyze(&self, upload: AudioUpload) -> Result<AnalysisResult> {
        let request_id = Uuid::new_v4().to_string();
        let timestamp = Utc::now();
        let started = Instant::now();

        info!(
            request_id,
            filename = %upload.filename,
            stage = %Stage::Received,
            "starting analysis"
        );

        match self.run_stages(&request_id, &upload).await {
            Ok((segments, issues, tone)) => {
                info!(request_id, stage = %Stage::Assembling, "assembling result");

                let speaker_statistics = stats::speaker_statistics(&segments);
                let processing_time_seconds = round2(started.elapsed().as_secs_f64());
                let metadata = Metadata {
                    filename: upload.filename.clone(),
                    file_size_mb: round2(upload.size_bytes() as f64 / (1024.0 * 1024.0)),
                    processing_time_seconds,
                    request_id: request_id.clone(),
                    timestamp,
                    segment_count: segments.len(),
                    speaker_statistics,
                };

                info!(
                    request_id,
                    stage = %Stage::Completed,
                    segments = segments.len(),
                    issues = issues.len(),
                    elapsed_secs = processing_time_seconds,
                    "analysis complete"
                );

                Ok(AnalysisResult {
                    transcript: segments,
                    issues,
                    tone,
                    metadata,
                })
            }
            Err(e) => {
                error!(
                    request_id,
                    stage = %Stage::Failed,
                    kind = e.kind(),
                    error = %e,
                    elapsed_secs = round2(started.elapsed().as_secs_f64()),
                    "analysis failed"
                );
                Err(e)
            }
        }
    }

    /// Stages between Received and Assembling. The scoped temp file lives
    /// only inside this function, so every early `?` return releases it.
    async fn run_stages(
        &self,
        request_id: &str,
        upload: &AudioUpload,
    ) -> Result<(Vec<TranscriptSegment>, Vec<Issue>, Tone)> {
        info!(request_id, stage = %Stage::Validating, "validating upload");
        self.intake.validate(upload)?;

        info!(request_id, stage = %Stage::Normalizing, "normalizing audio");
        let normalized = self.intake.normalize(request_id, upload).await?;

        info!(
            request_id,
            stage = %Stage::Transcribing,
            model = self.transcriber.model_name(),
            "transcribing audio"
        );
        let waveform = normalized.read()?;
        let raw_segments =
            transcript::normalize_segments(self.transcriber.transcribe(&waveform).await?);
        drop(normalized);

        info!(
            request_id,
            stage = %Stage::Attributing,
            segments = raw_segments.len(),
            "attributing speakers"
        );
        let segments = crate::attribution::attribute_speakers(&self.config.attribution, &raw_segments);

        info!(request_id, stage = %Stage::Extracting, "extracting insights");
        let (issues, tone) = self.extract_insights(&segments).await?;

        Ok((segments, issues, tone))
    }

    /// Issue extraction and tone classification run concurrently; both read
    /// the same immutable transcript. An empty transcript short-circuits to
    /// deterministic defaults without contacting the extraction service.
    async fn extract_insights(
        &self,
        segments: &[TranscriptSegment],
    ) -> Result<(Vec<Issue>, Tone)> {
        if segments.is_empty() {
            return Ok((Vec::new(), Tone::neutral()));
        }

        let text = transcript::labeled_text(segments);
        let (issues, tone) = tokio::try_join!(
            self.extractor.extract_issues(&text),
            self.extractor.classify_tone(&text),
        )?;

        Ok((issues, tone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use crate::insight::{MockExtractor, ToneLabel};
    use crate::transcribe::MockTranscriber;
    use crate::transcript::RawSegment;
    use std::io::Cursor;

    fn wav_upload(filename: &str) -> AudioUpload {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..1600 {
                writer.write_sample(200i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        AudioUpload::new(filename, cursor.into_inner())
    }

    fn analyzer_with(
        transcriber: Arc<MockTranscriber>,
        extractor: Arc<MockExtractor>,
    ) -> CallAnalyzer {
        let mut config = Config::default();
        config.intake.temp_dir = Some(std::env::temp_dir().join("callscope-analyzer-tests"));
        CallAnalyzer::new(config, transcriber, extractor)
    }

    fn call_segments() -> Vec<RawSegment> {
        vec![
            RawSegment {
                text: "Hello, how can I help you?".to_string(),
                start: 0.0,
                end: 2.1,
            },
            RawSegment {
                text: "I haven't received my refund".to_string(),
                start: 2.2,
                end: 6.8,
            },
        ]
    }

    #[tokio::test]
    async fn test_successful_analysis_assembles_everything() {
        let transcriber =
            Arc::new(MockTranscriber::new("mock-stt").with_segments(call_segments()));
        let extractor = Arc::new(
            MockExtractor::new()
                .with_issues(vec![Issue {
                    title: "Refund delay".to_string(),
                    details: "Refund not received".to_string(),
                    evidence: vec!["I haven't received my refund".to_string()],
                }])
                .with_tone(Tone {
                    label: ToneLabel::Frustrated,
                    confidence: 0.76,
                    evidence: vec![],
                }),
        );

        let analyzer = analyzer_with(transcriber, extractor);
        let result = analyzer.analyze(wav_upload("call.wav")).await.unwrap();

        assert_eq!(result.transcript.len(), 2);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.tone.label, ToneLabel::Frustrated);
        assert_eq!(result.metadata.segment_count, 2);
        assert_eq!(result.metadata.filename, "call.wav");
        assert_eq!(result.metadata.speaker_statistics.total_segments, 2);
        assert!(!result.metadata.request_id.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_reaches_no_external_service() {
        let transcriber = Arc::new(MockTranscriber::new("mock-stt"));
        let extractor = Arc::new(MockExtractor::new());
        let analyzer = analyzer_with(transcriber.clone(), extractor.clone());

        let upload = AudioUpload::new("call.flac", vec![0u8; 128]);
        let result = analyzer.analyze(upload).await;

        assert!(matches!(result, Err(AnalyzerError::Validation { .. })));
        assert_eq!(transcriber.call_count(), 0);
        assert_eq!(extractor.issue_call_count(), 0);
        assert_eq!(extractor.tone_call_count(), 0);
    }

    #[tokio::test]
    async fn test_transcription_failure_skips_extraction() {
        let transcriber = Arc::new(MockTranscriber::new("mock-stt").with_failure());
        let extractor = Arc::new(MockExtractor::new());
        let analyzer = analyzer_with(transcriber, extractor.clone());

        let result = analyzer.analyze(wav_upload("call.wav")).await;

        assert!(matches!(result, Err(AnalyzerError::Transcription { .. })));
        assert_eq!(extractor.issue_call_count(), 0);
        assert_eq!(extractor.tone_call_count(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_fails_whole_request() {
        let transcriber =
            Arc::new(MockTranscriber::new("mock-stt").with_segments(call_segments()));
        let extractor = Arc::new(MockExtractor::new().with_tone_failure());
        let analyzer = analyzer_with(transcriber, extractor);

        let result = analyzer.analyze(wav_upload("call.wav")).await;
        assert!(matches!(result, Err(AnalyzerError::Extraction { .. })));
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_extraction_service() {
        let transcriber = Arc::new(MockTranscriber::new("mock-stt")); // zero segments
        let extractor = Arc::new(MockExtractor::new());
        let analyzer = analyzer_with(transcriber, extractor.clone());

        let result = analyzer.analyze(wav_upload("silence.wav")).await.unwrap();

        assert!(result.transcript.is_empty());
        assert!(result.issues.is_empty());
        assert_eq!(result.tone, Tone::neutral());
        assert_eq!(result.metadata.speaker_statistics, Default::default());
        assert_eq!(extractor.issue_call_count(), 0);
        assert_eq!(extractor.tone_call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_ids_are_unique_per_call() {
        let transcriber = Arc::new(MockTranscriber::new("mock-stt"));
        let extractor = Arc::new(MockExtractor::new());
        let analyzer = analyzer_with(transcriber, extractor);

        let a = analyzer.analyze(wav_upload("one.wav")).await.unwrap();
        let b = analyzer.analyze(wav_upload("two.wav")).await.unwrap();

        assert_ne!(a.metadata.request_id, b.metadata.request_id);
    }

    #[test]
    fn test_stage_display_names() {
        assert_eq!(Stage::Received.to_string(), "received");
        assert_eq!(Stage::Extracting.to_string(), "extracting");
        assert_eq!(Stage::Failed.to_string(), "failed");
    }
}
