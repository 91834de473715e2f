/*!
 * Tests for segment merging and cue duration handling
 */

use futures::StreamExt;
use std::path::Path;
use subtitler::errors::ProviderError;
use subtitler::providers::mock::MockTranscriber;
use subtitler::subtitle_processor::SubtitleEntry;
use subtitler::timing::{DurationNormalizer, enforce_min_duration};
use subtitler::transcription::{
    MergePolicy, RawSegment, SegmentMerger, Transcriber, TranscriptionOptions, merge_segments,
    merge_stream, seconds_to_ms,
};
use crate::common::{cue, segment};

fn summary(entries: &[SubtitleEntry]) -> Vec<(usize, u64, u64, String)> {
    entries.iter()
        .map(|e| (e.seq_num, e.start_time_ms, e.end_time_ms, e.text.clone()))
        .collect()
}

#[test]
fn test_merge_withRepeatedText_shouldExtendSecondCue() {
    let entries = merge_segments(
        vec![segment(0, 1, "a"), segment(1, 2, "a"), segment(2, 3, "a")],
        MergePolicy::default(),
    );

    assert_eq!(
        summary(&entries),
        vec![(1, 0, 1000, "a".to_string()), (2, 1000, 3000, "a".to_string())]
    );
}

#[test]
fn test_merge_withDistinctText_shouldKeepEverySegment() {
    let entries = merge_segments(
        vec![segment(0, 1, "a"), segment(1, 2, "b"), segment(2, 3, "c")],
        MergePolicy::AfterFirstTwo,
    );

    assert_eq!(
        summary(&entries),
        vec![
            (1, 0, 1000, "a".to_string()),
            (2, 1000, 2000, "b".to_string()),
            (3, 2000, 3000, "c".to_string()),
        ]
    );
}

#[test]
fn test_merge_withUniformPolicy_shouldMergeFromTheStart() {
    let entries = merge_segments(
        vec![segment(0, 1, "a"), segment(1, 2, "a"), segment(2, 3, "b")],
        MergePolicy::Uniform,
    );

    assert_eq!(
        summary(&entries),
        vec![(1, 0, 2000, "a".to_string()), (2, 2000, 3000, "b".to_string())]
    );
}

#[test]
fn test_merge_withEmptyInput_shouldReturnEmptyTrack() {
    assert!(merge_segments(Vec::new(), MergePolicy::AfterFirstTwo).is_empty());
}

#[test]
fn test_merge_withWhitespaceOrCaseDifference_shouldNotMerge() {
    let entries = merge_segments(
        vec![segment(0, 1, "a"), segment(1, 2, " a"), segment(2, 3, "a "), segment(3, 4, "A")],
        MergePolicy::Uniform,
    );

    let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["a", " a", "a ", "A"]);
}

#[test]
fn test_merge_withNonAdjacentRepeat_shouldNotMerge() {
    let entries = merge_segments(
        vec![segment(0, 1, "a"), segment(1, 2, "b"), segment(2, 3, "a"), segment(3, 4, "b")],
        MergePolicy::Uniform,
    );
    assert_eq!(entries.len(), 4);
}

#[test]
fn test_merge_indices_shouldBeContiguous() {
    let segments = (0..50u64).map(|i| segment(i, i + 1, if i % 3 == 0 { "x" } else { "y" }));
    let entries = merge_segments(segments, MergePolicy::AfterFirstTwo);

    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.seq_num, i + 1);
        assert!(entry.end_time_ms >= entry.start_time_ms);
    }
}

#[test]
fn test_segmentMerger_shouldCountMerges() {
    let mut merger = SegmentMerger::new(MergePolicy::AfterFirstTwo);
    for s in [segment(0, 1, "a"), segment(1, 2, "b"), segment(2, 3, "b"), segment(3, 4, "b")] {
        merger.push(s);
    }

    assert_eq!(merger.len(), 2);
    assert_eq!(merger.merged_count(), 2);
    assert_eq!(merger.finish()[1].end_time_ms, 4000);
}

#[test]
fn test_secondsToMs_shouldRoundAndClamp() {
    assert_eq!(seconds_to_ms(1.2345), 1235);
    assert_eq!(seconds_to_ms(0.0), 0);
    assert_eq!(seconds_to_ms(-3.0), 0);
    assert_eq!(seconds_to_ms(f64::NAN), 0);
    assert_eq!(RawSegment::from_seconds(0.5, 2.25, "hi").end_ms, 2250);
}

#[tokio::test]
async fn test_mergeStream_fromMockTranscriber_shouldMergeAndReportProgress() {
    let transcriber = MockTranscriber::new(vec![
        segment(0, 1, "a"),
        segment(1, 2, "a"),
        segment(2, 3, "a"),
        segment(3, 4, "b"),
    ]);
    let transcription = transcriber
        .transcribe(Path::new("talk.mp4"), &TranscriptionOptions::default())
        .await
        .unwrap();

    let mut progress = Vec::new();
    let entries = merge_stream(transcription.segments, MergePolicy::AfterFirstTwo, |end_ms| progress.push(end_ms))
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].end_time_ms, 3000);
    assert_eq!(progress, vec![1000, 2000, 3000, 4000]);
}

#[tokio::test]
async fn test_mergeStream_withStreamError_shouldAbort() {
    let transcriber = MockTranscriber::new(vec![segment(0, 1, "a"), segment(1, 2, "b"), segment(2, 3, "c")])
        .fail_at(1);
    let transcription = transcriber
        .transcribe(Path::new("talk.mp4"), &TranscriptionOptions::default())
        .await
        .unwrap();

    let result = merge_stream(transcription.segments, MergePolicy::AfterFirstTwo, |_| {}).await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}

#[tokio::test]
async fn test_mockTranscriber_failing_shouldFailBeforeStreaming() {
    let transcriber = MockTranscriber::failing();
    let result = transcriber.transcribe(Path::new("silent.mp4"), &TranscriptionOptions::default()).await;

    assert!(matches!(result, Err(ProviderError::AudioExtraction(_))));
}

#[tokio::test]
async fn test_mockTranscriber_withEmptySegments_shouldYieldEmptyStream() {
    let transcriber = MockTranscriber::new(Vec::new());
    let transcription = transcriber
        .transcribe(Path::new("silent.mp4"), &TranscriptionOptions::default())
        .await
        .unwrap();

    assert_eq!(transcription.duration_ms, None);
    assert_eq!(transcription.segments.count().await, 0);
}

#[test]
fn test_normalizer_afterMerge_shouldMeetMinimumEverywhere() {
    let mut entries = merge_segments(
        vec![
            RawSegment::new(0, 300, "one"),
            RawSegment::new(400, 900, "two"),
            RawSegment::new(5000, 9000, "three"),
        ],
        MergePolicy::AfterFirstTwo,
    );

    enforce_min_duration(&mut entries, 2000);

    assert!(entries.iter().all(|e| e.duration_ms() >= 2000));
    let starts: Vec<u64> = entries.iter().map(|e| e.start_time_ms).collect();
    assert_eq!(starts, vec![0, 400, 5000]);
}

#[test]
fn test_normalizer_withClipping_shouldNotCreateNewOverlaps() {
    let mut entries = vec![cue(1, 0, 300, "a"), cue(2, 1000, 1200, "b"), cue(3, 1500, 6000, "c")];

    DurationNormalizer::new(2000).clip_overlaps(true).apply(&mut entries);

    for pair in entries.windows(2) {
        assert!(pair[0].end_time_ms <= pair[1].start_time_ms);
    }
    assert_eq!(entries[0].end_time_ms, 1000);
    assert_eq!(entries[1].end_time_ms, 1500);
}
