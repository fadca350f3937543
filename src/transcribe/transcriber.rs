use crate::error::{AnalyzerError, Result};
use crate::transcript::RawSegment;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (remote service vs mock).
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a normalized waveform into timestamped segments.
    ///
    /// # Arguments
    /// * `wav` - Canonical waveform bytes (mono 16 kHz 16-bit PCM WAV)
    ///
    /// # Returns
    /// Ordered segments with no speaker identity. Zero segments is a valid
    /// result (silence-only audio), not an error.
    async fn transcribe(&self, wav: &[u8]) -> Result<Vec<RawSegment>>;

    /// Name of the model serving transcriptions
    fn model_name(&self) -> &str;
}

/// Implement Transcriber for Arc<T> to allow sharing across requests.
#[async_trait]
impl<T: Transcriber> Transcriber for Arc<T> {
    async fn transcribe(&self, wav: &[u8]) -> Result<Vec<RawSegment>> {
        (**self).transcribe(wav).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Mock transcriber for testing.
///
/// Counts calls so tests can assert that validation failures never reach
/// the external service.
#[derive(Debug)]
pub struct MockTranscriber {
    model_name: String,
    segments: Vec<RawSegment>,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockTranscriber {
    /// Create a new mock transcriber returning no segments
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            segments: Vec::new(),
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Configure the mock to return specific segments
    pub fn with_segments(mut self, segments: Vec<RawSegment>) -> Self {
        self.segments = segments;
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of transcribe calls observed
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _wav: &[u8]) -> Result<Vec<RawSegment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            Err(AnalyzerError::transcription("mock transcription failure"))
        } else {
            Ok(self.segments.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
