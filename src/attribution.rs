//! Heuristic speaker attribution.
//!
//! This labels segments from conversational structure alone — no acoustic
//! speaker identification is involved. It is a known accuracy limitation,
//! not a defect: calls with more than two parties, overlapping speech, or
//! a customer speaking first will be mislabeled. The contract is weaker
//! but total: every segment always receives exactly one role.
//!
//! Rules, in precedence order:
//! 1. The first segment is the Agent (support calls are answered by the
//!    agent).
//! 2. A lexical match against agent-only or customer-only phrases forces
//!    that role.
//! 3. A silence gap above the configured threshold flips the previous
//!    segment's role; otherwise the previous role carries over.

use crate::config::AttributionConfig;
use crate::transcript::{RawSegment, Speaker, TranscriptSegment};

/// Assign a speaker role to every segment.
///
/// Input must be ordered by start time (see `transcript::normalize_segments`).
/// Total: never fails, never leaves a segment unlabeled.
pub fn attribute_speakers(
    config: &AttributionConfig,
    segments: &[RawSegment],
) -> Vec<TranscriptSegment> {
    let mut labeled = Vec::with_capacity(segments.len());
    let mut current = Speaker::Agent;

    for (i, segment) in segments.iter().enumerate() {
        let role = if i == 0 {
            lexical_role(config, &segment.text).unwrap_or(Speaker::Agent)
        } else if let Some(forced) = lexical_role(config, &segment.text) {
            forced
        } else {
            let gap = segment.start - segments[i - 1].end;
            if gap > config.pause_threshold_secs {
                current.flipped()
            } else {
                current
            }
        };

        current = role;
        labeled.push(TranscriptSegment {
            speaker: role,
            text: segment.text.clone(),
            start: segment.start,
            end: segment.end,
        });
    }

    labeled
}

/// Lexical override: agent patterns win over customer patterns when both
/// match, mirroring the precedence of the pattern classes.
fn lexical_role(config: &AttributionConfig, text: &str) -> Option<Speaker> {
    let lower = text.to_lowercase();
    if config.agent_patterns.iter().any(|p| lower.contains(p)) {
        Some(Speaker::Agent)
    } else if config.customer_patterns.iter().any(|p| lower.contains(p)) {
        Some(Speaker::Customer)
    } else {
        None
    }
}
