/*!
 * Segment merging.
 *
 * Recognizers sometimes repeat the same text over several consecutive
 * segments (silence, echoes, decoding loops). The merger folds such runs into
 * one cue spanning the whole run and numbers the resulting cues 1..=n.
 */

use futures::{Stream, StreamExt};
use log::debug;
use serde::{Deserialize, Serialize};

use super::RawSegment;
use crate::subtitle_processor::SubtitleEntry;

/// When a segment whose text repeats the previous cue is folded into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Fold only once two cues exist; the first two cues never merge with each other
    #[default]
    AfterFirstTwo,
    /// Fold every repeat
    Uniform,
}

/// Incremental segment-to-cue folder
#[derive(Debug)]
pub struct SegmentMerger {
    policy: MergePolicy,
    entries: Vec<SubtitleEntry>,
    merged: usize,
}

impl SegmentMerger {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
            merged: 0,
        }
    }

    /// Feed the next segment in time order
    pub fn push(&mut self, segment: RawSegment) {
        let min_finalized = match self.policy {
            MergePolicy::AfterFirstTwo => 2,
            MergePolicy::Uniform => 1,
        };

        if self.entries.len() >= min_finalized {
            if let Some(last) = self.entries.last_mut() {
                if last.text == segment.text {
                    last.end_time_ms = last.end_time_ms.max(segment.end_ms);
                    self.merged += 1;
                    return;
                }
            }
        }

        let seq_num = self.entries.len() + 1;
        self.entries.push(SubtitleEntry::new(seq_num, segment.start_ms, segment.end_ms, segment.text));
    }

    /// Cues finalized so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Segments folded into an earlier cue so far
    pub fn merged_count(&self) -> usize {
        self.merged
    }

    pub fn finish(self) -> Vec<SubtitleEntry> {
        if self.merged > 0 {
            debug!("Merged {} repeated segments into {} cues", self.merged, self.entries.len());
        }
        self.entries
    }
}

/// Merge an in-memory or iterator-produced segment sequence
pub fn merge_segments<I>(segments: I, policy: MergePolicy) -> Vec<SubtitleEntry>
where
    I: IntoIterator<Item = RawSegment>,
{
    let mut merger = SegmentMerger::new(policy);
    for segment in segments {
        merger.push(segment);
    }
    merger.finish()
}

/// Merge segments as the recognizer produces them.
///
/// `on_progress` receives the end time of every consumed segment. The first
/// stream error aborts the merge and is returned as is.
pub async fn merge_stream<S, E, F>(segments: S, policy: MergePolicy, mut on_progress: F) -> Result<Vec<SubtitleEntry>, E>
where
    S: Stream<Item = Result<RawSegment, E>>,
    F: FnMut(u64),
{
    let mut merger = SegmentMerger::new(policy);
    let mut segments = std::pin::pin!(segments);

    while let Some(segment) = segments.next().await {
        let segment = segment?;
        on_progress(segment.end_ms);
        merger.push(segment);
    }

    Ok(merger.finish())
}
