//! callscope - customer call analysis
//!
//! Turns a recorded customer-service call into a speaker-labeled
//! transcript, a list of customer issues with evidence, a customer-tone
//! classification, and aggregate call statistics.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod analyzer;
pub mod attribution;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod insight;
pub mod stats;
pub mod transcribe;
pub mod transcript;

// Pipeline entry point
pub use analyzer::{AnalysisResult, CallAnalyzer, Metadata, Stage};

// Core traits (service seams for real adapters and test mocks)
pub use insight::{InsightExtractor, MockExtractor, RemoteExtractor};
pub use transcribe::{MockTranscriber, RemoteTranscriber, Transcriber};

// Data model
pub use audio::AudioUpload;
pub use insight::{Issue, Tone, ToneLabel};
pub use stats::{RoleStats, SpeakerStatistics};
pub use transcript::{RawSegment, Speaker, TranscriptSegment};

// Error handling
pub use error::{AnalyzerError, Result};

// Config
pub use config::Config;
