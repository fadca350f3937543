//! Issue and tone extraction from the labeled transcript.

pub mod extractor;
pub mod remote;

pub use extractor::{InsightExtractor, MockExtractor};
pub use remote::RemoteExtractor;

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};

/// A customer-reported problem with supporting transcript quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub details: String,
    /// Verbatim (or near-verbatim) transcript excerpts. May be empty.
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// Fixed tone enumeration. Labels outside this set are rejected, never
/// coerced to a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneLabel {
    Calm,
    Frustrated,
    Angry,
    Anxious,
}

impl ToneLabel {
    pub fn parse(label: &str) -> Result<Self> {
        match label {
            "Calm" => Ok(Self::Calm),
            "Frustrated" => Ok(Self::Frustrated),
            "Angry" => Ok(Self::Angry),
            "Anxious" => Ok(Self::Anxious),
            other => Err(AnalyzerError::extraction(format!(
                "tone label '{}' is outside the allowed set \
                 (Calm, Frustrated, Angry, Anxious)",
                other
            ))),
        }
    }
}

/// Overall customer tone for one call. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub label: ToneLabel,
    /// In [0, 1]; clamped on ingest.
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl Tone {
    /// Deterministic tone for calls with no speech: the extraction service
    /// is not consulted for an empty transcript.
    pub fn neutral() -> Self {
        Self {
            label: ToneLabel::Calm,
            confidence: 0.5,
            evidence: vec!["no speech in transcript".to_string()],
        }
    }
}
