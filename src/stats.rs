//! Per-speaker and whole-call statistics over a labeled transcript.

use crate::transcript::{Speaker, TranscriptSegment, round2};
use serde::{Deserialize, Serialize};

/// Aggregates for one speaker role.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoleStats {
    pub segments: usize,
    pub duration_seconds: f64,
    pub word_count: usize,
}

/// Speaker distribution for a whole call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeakerStatistics {
    pub agent: RoleStats,
    pub customer: RoleStats,
    pub total_segments: usize,
    pub total_duration: f64,
}

/// Compute speaker statistics from a labeled transcript.
///
/// Pure and total: an empty transcript yields all-zero statistics.
pub fn speaker_statistics(segments: &[TranscriptSegment]) -> SpeakerStatistics {
    let mut stats = SpeakerStatistics::default();

    for segment in segments {
        let role = match segment.speaker {
            Speaker::Agent => &mut stats.agent,
            Speaker::Customer => &mut stats.customer,
        };
        role.segments += 1;
        role.duration_seconds += segment.duration();
        role.word_count += segment.text.split_whitespace().count();
    }

    stats.total_segments = segments.len();
    stats.total_duration = round2(stats.agent.duration_seconds + stats.customer.duration_seconds);
    stats.agent.duration_seconds = round2(stats.agent.duration_seconds);
    stats.customer.duration_seconds = round2(stats.customer.duration_seconds);
    stats
}
