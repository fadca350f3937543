use super::{Issue, Tone};
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for structured insight extraction over a labeled transcript.
///
/// Both operations take the full speaker-labeled transcript text as
/// grounding context and are independent: the orchestrator runs them
/// concurrently.
#[async_trait]
pub trait InsightExtractor: Send + Sync {
    /// Extract the distinct customer-reported problems.
    async fn extract_issues(&self, transcript: &str) -> Result<Vec<Issue>>;

    /// Classify the overall customer tone.
    async fn classify_tone(&self, transcript: &str) -> Result<Tone>;
}

#[async_trait]
impl<T: InsightExtractor> InsightExtractor for Arc<T> {
    async fn extract_issues(&self, transcript: &str) -> Result<Vec<Issue>> {
        (**self).extract_issues(transcript).await
    }

    async fn classify_tone(&self, transcript: &str) -> Result<Tone> {
        (**self).classify_tone(transcript).await
    }
}

/// Mock extractor for testing, with per-operation call counters.
#[derive(Debug)]
pub struct MockExtractor {
    issues: Vec<Issue>,
    tone: Tone,
    fail_issues: bool,
    fail_tone: bool,
    issue_calls: AtomicUsize,
    tone_calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            tone: Tone::neutral(),
            fail_issues: false,
            fail_tone: false,
            issue_calls: AtomicUsize::new(0),
            tone_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_issues(mut self, issues: Vec<Issue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_issue_failure(mut self) -> Self {
        self.fail_issues = true;
        self
    }

    pub fn with_tone_failure(mut self) -> Self {
        self.fail_tone = true;
        self
    }

    pub fn issue_call_count(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }

    pub fn tone_call_count(&self) -> usize {
        self.tone_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InsightExtractor for MockExtractor {
    async fn extract_issues(&self, _transcript: &str) -> Result<Vec<Issue>> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_issues {
            Err(AnalyzerError::extraction("mock issue extraction failure"))
        } else {
            Ok(self.issues.clone())
        }
    }

    async fn classify_tone(&self, _transcript: &str) -> Result<Tone> {
        self.tone_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_tone {
            Err(AnalyzerError::extraction("mock tone classification failure"))
        } else {
            Ok(self.tone.clone())
        }
    }
}
