//! Default configuration constants for callscope.
//!
//! Shared across configuration types so defaults stay consistent.

/// Canonical sample rate for normalized audio in Hz.
///
/// 16kHz is the standard for speech recognition and is what the
/// transcription service expects.
pub const SAMPLE_RATE: u32 = 16000;

/// Maximum accepted upload size in bytes (25 MiB, exclusive upper bound).
pub const MAX_FILE_SIZE_BYTES: u64 = 25 * 1024 * 1024;

/// Accepted upload extensions (matched case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".m4a"];

/// Default pause (silence gap) in seconds treated as a likely speaker turn.
///
/// 1.5 seconds allows for natural pauses within one speaker's turn while
/// still catching most handovers. Tunable via `[attribution]` config.
pub const PAUSE_THRESHOLD_SECS: f64 = 1.5;

/// Default transcription model name on the remote service.
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Default extraction (chat-completion) model name on the remote service.
pub const EXTRACTION_MODEL: &str = "gpt-4o-mini";

/// Default base URL for the OpenAI-compatible transcription service.
pub const TRANSCRIPTION_BASE_URL: &str = "https://api.openai.com/v1";

/// Default base URL for the OpenAI-compatible extraction service.
pub const EXTRACTION_BASE_URL: &str = "https://api.openai.com/v1";

/// Default per-request timeout for the transcription call in seconds.
///
/// Transcribing a full call recording is the slowest external operation.
pub const TRANSCRIPTION_TIMEOUT_SECS: u64 = 60;

/// Default per-request timeout for each extraction call in seconds.
pub const EXTRACTION_TIMEOUT_SECS: u64 = 30;

/// Backoff before the single transcription/extraction retry, in milliseconds.
pub const RETRY_BACKOFF_MS: u64 = 500;

/// Sampling temperature for extraction calls. Low for consistent JSON.
pub const EXTRACTION_TEMPERATURE: f32 = 0.3;

/// Phrases that mark a segment as agent speech (openings, policy phrasing).
///
/// Matched as lowercase substrings against segment text.
pub fn agent_patterns() -> Vec<String> {
    [
        "how can i help",
        "how may i help",
        "thank you for calling",
        "is there anything else",
        "let me check",
        "i apologize for the inconvenience",
        "our policy",
        "i can offer",
        "have a great day",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Phrases that mark a segment as customer speech (first-person complaints).
///
/// Matched as lowercase substrings against segment text.
pub fn customer_patterns() -> Vec<String> {
    [
        "i haven't received",
        "i have not received",
        "i didn't get",
        "my refund",
        "my order",
        "my account",
        "i want to cancel",
        "i was charged",
        "it doesn't work",
        "keeps crashing",
        "i'm calling about",
        "i am calling about",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_file_size_matches_contract() {
        assert_eq!(MAX_FILE_SIZE_BYTES, 26_214_400);
    }

    #[test]
    fn pattern_lists_are_lowercase() {
        for p in agent_patterns().iter().chain(customer_patterns().iter()) {
            assert_eq!(p, &p.to_lowercase(), "pattern not lowercase: {}", p);
        }
    }
}
