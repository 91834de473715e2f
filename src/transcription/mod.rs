/*!
 * Speech recognition side of the pipeline.
 *
 * - `audio`: audio track extraction with ffmpeg
 * - `merger`: folding raw recognition segments into numbered cues
 *
 * The recognizer itself is an injected `Transcriber`; segments reach the
 * merger as a lazy stream so long recordings never need to be held whole.
 */

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::Path;

use crate::errors::ProviderError;

pub mod audio;
pub mod merger;

pub use self::merger::{MergePolicy, SegmentMerger, merge_segments, merge_stream};

/// A timed text span as emitted by the recognizer, before merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl RawSegment {
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Build from recognizer timings in seconds, rounded to the millisecond
    pub fn from_seconds(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self::new(seconds_to_ms(start), seconds_to_ms(end), text)
    }
}

/// Convert fractional seconds to whole milliseconds; negative and NaN become 0
pub fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Whether the recognizer keeps the spoken language or translates to English
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptionTask {
    #[default]
    Transcribe,
    Translate,
}

impl TranscriptionTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::Translate => "translate",
        }
    }
}

/// Per-file recognition settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptionOptions {
    /// ISO 639-1 hint for the spoken language; None lets the model detect it
    pub language: Option<String>,
    pub task: TranscriptionTask,
}

/// Lazily produced recognition output
pub type SegmentStream = BoxStream<'static, Result<RawSegment, ProviderError>>;

/// Result of starting a transcription
pub struct Transcription {
    /// Total media duration, when the recognizer reports it
    pub duration_ms: Option<u64>,
    /// Detected or forced language, as reported by the recognizer
    pub language: Option<String>,
    /// Time-ordered segments
    pub segments: SegmentStream,
}

/// Speech recognition capability
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Recognize speech in an audio or video file
    async fn transcribe(&self, media_path: &Path, options: &TranscriptionOptions) -> Result<Transcription, ProviderError>;

    /// Check that the backend is reachable
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
