//! Error types for callscope.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    // Bad input: format, size, undecodable audio. Never retried.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // Upstream transcription service failure (after the bounded retry).
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    // Upstream extraction service failure or schema mismatch.
    #[error("Extraction failed: {message}")]
    Extraction { message: String },

    // Configuration errors
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    // Unexpected faults (filesystem, missing tools). Fatal for the
    // request, not for the process.
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn transcription(message: impl Into<String>) -> Self {
        Self::Transcription {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable kind name for logging and for the (out-of-scope) HTTP edge
    /// to map onto status codes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Transcription { .. } => "transcription",
            Self::Extraction { .. } => "extraction",
            Self::Config(_) => "config",
            Self::Internal { .. } | Self::Io(_) => "internal",
        }
    }

    /// Human-readable detail message, suitable for a `detail` response field.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AnalyzerError>;
