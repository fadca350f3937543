//! Transcript data model: segments, speaker roles, and text views.

use serde::{Deserialize, Serialize};

/// Speaker role assigned to a segment by attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Agent,
    Customer,
}

impl Speaker {
    /// The other role — used when a silence gap suggests a turn change.
    pub fn flipped(self) -> Self {
        match self {
            Speaker::Agent => Speaker::Customer,
            Speaker::Customer => Speaker::Agent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Speaker::Agent => "Agent",
            Speaker::Customer => "Customer",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamped text segment as returned by the transcription service,
/// before speaker attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Timestamped text segment with its attributed speaker role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub speaker: Speaker,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl TranscriptSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Round to two decimal places (timestamps and derived durations).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize raw service output into a well-formed segment sequence:
/// sorted by start time, non-overlapping, empty-text and zero/negative-
/// duration segments dropped, text trimmed, timestamps rounded. Overlaps
/// are clipped to the previous segment's end; a segment fully contained
/// in its predecessor is dropped.
pub fn normalize_segments(mut segments: Vec<RawSegment>) -> Vec<RawSegment> {
    segments.retain(|s| !s.text.trim().is_empty() && s.start >= 0.0 && s.start < s.end);
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut normalized: Vec<RawSegment> = Vec::with_capacity(segments.len());
    for s in segments {
        let mut start = round2(s.start);
        let end = round2(s.end);
        if let Some(prev) = normalized.last()
            && start < prev.end
        {
            start = prev.end;
        }
        if start >= end {
            continue;
        }
        normalized.push(RawSegment {
            text: s.text.trim().to_string(),
            start,
            end,
        });
    }
    normalized
}

/// Transcript formatted with timestamps and speaker labels, one line per
/// segment. This is the grounding text handed to the extraction service.
pub fn labeled_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| format!("[{:.1}s] {}: {}", s.start, s.speaker, s.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(speaker: Speaker, text: &str, start: f64, end: f64) -> TranscriptSegment {
        TranscriptSegment {
            speaker,
            text: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_speaker_flipped() {
        assert_eq!(Speaker::Agent.flipped(), Speaker::Customer);
        assert_eq!(Speaker::Customer.flipped(), Speaker::Agent);
    }

    #[test]
    fn test_speaker_serializes_as_plain_label() {
        assert_eq!(serde_json::to_string(&Speaker::Agent).unwrap(), "\"Agent\"");
        assert_eq!(
            serde_json::to_string(&Speaker::Customer).unwrap(),
            "\"Customer\""
        );
    }

    #[test]
    fn test_normalize_drops_empty_and_invalid_segments() {
        let raw = vec![
            RawSegment {
                text: "  ".to_string(),
                start: 0.0,
                end: 1.0,
            },
            RawSegment {
                text: "backwards".to_string(),
                start: 5.0,
                end: 4.0,
            },
            RawSegment {
                text: " kept ".to_string(),
                start: 1.0,
                end: 2.0,
            },
        ];

        let normalized = normalize_segments(raw);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].text, "kept");
    }

    #[test]
    fn test_normalize_sorts_by_start() {
        let raw = vec![
            RawSegment {
                text: "second".to_string(),
                start: 3.0,
                end: 4.0,
            },
            RawSegment {
                text: "first".to_string(),
                start: 0.5,
                end: 2.0,
            },
        ];

        let normalized = normalize_segments(raw);
        assert_eq!(normalized[0].text, "first");
        assert_eq!(normalized[1].text, "second");
    }

    #[test]
    fn test_normalize_rounds_timestamps() {
        let raw = vec![RawSegment {
            text: "hi".to_string(),
            start: 0.333_333,
            end: 1.666_666,
        }];

        let normalized = normalize_segments(raw);
        assert_eq!(normalized[0].start, 0.33);
        assert_eq!(normalized[0].end, 1.67);
    }

    #[test]
    fn test_normalize_clips_overlapping_segments() {
        let raw = vec![
            RawSegment {
                text: "first".to_string(),
                start: 0.0,
                end: 2.0,
            },
            RawSegment {
                text: "overlaps".to_string(),
                start: 1.5,
                end: 3.0,
            },
            RawSegment {
                text: "contained".to_string(),
                start: 2.2,
                end: 2.8,
            },
        ];

        let normalized = normalize_segments(raw);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[1].text, "overlaps");
        assert_eq!(normalized[1].start, 2.0); // clipped to previous end
        for w in normalized.windows(2) {
            assert!(w[0].end <= w[1].start);
        }
    }

    #[test]
    fn test_labeled_text_format() {
        let segments = vec![
            seg(Speaker::Agent, "How can I help you?", 0.0, 2.1),
            seg(Speaker::Customer, "I haven't received my refund", 2.2, 6.8),
        ];
        assert_eq!(
            labeled_text(&segments),
            "[0.0s] Agent: How can I help you?\n[2.2s] Customer: I haven't received my refund"
        );
    }

    #[test]
    fn test_labeled_text_empty_transcript() {
        assert_eq!(labeled_text(&[]), "");
    }
}
