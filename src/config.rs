use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub intake: IntakeConfig,
    pub transcription: TranscriptionConfig,
    pub extraction: ExtractionConfig,
    pub attribution: AttributionConfig,
}

/// Upload validation and temp-file configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntakeConfig {
    pub max_file_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
    /// Directory for request-scoped normalized audio. Resolved once at
    /// startup; each request derives its own file inside it.
    pub temp_dir: Option<PathBuf>,
}

/// Remote transcription service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub retry_backoff_ms: u64,
}

/// Remote structured-extraction service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub retry_backoff_ms: u64,
    pub temperature: f32,
}

/// Speaker attribution heuristics. Tunable, not hard-coded: the shipped
/// defaults are a starting point, not ground truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttributionConfig {
    /// Silence gap in seconds treated as a likely speaker turn.
    pub pause_threshold_secs: f64,
    /// Lowercase substrings that force the Agent role.
    pub agent_patterns: Vec<String>,
    /// Lowercase substrings that force the Customer role.
    pub customer_patterns: Vec<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: defaults::MAX_FILE_SIZE_BYTES,
            allowed_extensions: defaults::ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            temp_dir: None,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::TRANSCRIPTION_BASE_URL.to_string(),
            model: defaults::TRANSCRIPTION_MODEL.to_string(),
            timeout_secs: defaults::TRANSCRIPTION_TIMEOUT_SECS,
            retry_backoff_ms: defaults::RETRY_BACKOFF_MS,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::EXTRACTION_BASE_URL.to_string(),
            model: defaults::EXTRACTION_MODEL.to_string(),
            timeout_secs: defaults::EXTRACTION_TIMEOUT_SECS,
            retry_backoff_ms: defaults::RETRY_BACKOFF_MS,
            temperature: defaults::EXTRACTION_TEMPERATURE,
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            pause_threshold_secs: defaults::PAUSE_THRESHOLD_SECS,
            agent_patterns: defaults::agent_patterns(),
            customer_patterns: defaults::customer_patterns(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CALLSCOPE_TRANSCRIPTION_URL → transcription.base_url
    /// - CALLSCOPE_EXTRACTION_URL → extraction.base_url
    /// - CALLSCOPE_MODEL → extraction.model
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("CALLSCOPE_TRANSCRIPTION_URL")
            && !url.is_empty()
        {
            self.transcription.base_url = url;
        }

        if let Ok(url) = std::env::var("CALLSCOPE_EXTRACTION_URL")
            && !url.is_empty()
        {
            self.extraction.base_url = url;
        }

        if let Ok(model) = std::env::var("CALLSCOPE_MODEL")
            && !model.is_empty()
        {
            self.extraction.model = model;
        }

        self
    }

    /// Resolve the temp directory for normalized audio.
    ///
    /// Defaults to `<system temp>/callscope` when not configured.
    pub fn temp_dir(&self) -> PathBuf {
        self.intake
            .temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("callscope"))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/callscope/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("callscope")
            .join("config.toml")
    }
}

/// API key for both remote services.
///
/// `CALLSCOPE_API_KEY` takes precedence, falling back to `OPENAI_API_KEY`.
/// Keys are never read from config files.
pub fn api_key_from_env() -> Option<String> {
    std::env::var("CALLSCOPE_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
