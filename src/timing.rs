/*!
 * Minimum on-screen duration for cues.
 */

use log::debug;

use crate::subtitle_processor::SubtitleEntry;

/// Extends cues shorter than a minimum duration
#[derive(Debug, Clone, Copy)]
pub struct DurationNormalizer {
    min_duration_ms: u64,
    clip_overlaps: bool,
}

impl DurationNormalizer {
    pub fn new(min_duration_ms: u64) -> Self {
        Self {
            min_duration_ms,
            clip_overlaps: false,
        }
    }

    /// Cap each extension at the next cue's start. Cues are never shortened, so a
    /// cue that already overlapped its successor keeps its original end.
    pub fn clip_overlaps(mut self, clip: bool) -> Self {
        self.clip_overlaps = clip;
        self
    }

    pub fn min_duration_ms(&self) -> u64 {
        self.min_duration_ms
    }

    /// Single forward pass over the track in place. Returns how many cues were extended.
    ///
    /// Without clipping, an extended cue may run past the start of the next one.
    pub fn apply(&self, entries: &mut [SubtitleEntry]) -> usize {
        let mut extended = 0;

        for i in 0..entries.len() {
            let next_start = entries.get(i + 1).map(|next| next.start_time_ms);
            let entry = &mut entries[i];

            if entry.duration_ms() >= self.min_duration_ms {
                continue;
            }

            let mut new_end = entry.start_time_ms.saturating_add(self.min_duration_ms);
            if self.clip_overlaps {
                if let Some(next_start) = next_start {
                    new_end = new_end.min(next_start.max(entry.end_time_ms));
                }
            }

            if new_end > entry.end_time_ms {
                entry.end_time_ms = new_end;
                extended += 1;
            }
        }

        if extended > 0 {
            debug!("Extended {} cues to at least {} ms", extended, self.min_duration_ms);
        }
        extended
    }
}

/// Extend every cue shorter than `min_duration_ms`, ignoring overlaps
pub fn enforce_min_duration(entries: &mut [SubtitleEntry], min_duration_ms: u64) -> usize {
    DurationNormalizer::new(min_duration_ms).apply(entries)
}
