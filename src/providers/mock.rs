/*!
 * Mock backends for testing.
 *
 * - `MockTranslator::working()` - Uppercases every text
 * - `MockTranslator::failing()` - Always fails with an error
 * - `MockTranslator::dropping()` - Answers one text short per batch
 * - `MockTranscriber::new(segments)` - Replays fixed segments
 *
 * Failing mocks also fail their connection check.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::transcription::{RawSegment, Transcriber, Transcription, TranscriptionOptions};
use crate::translation::core::TextTranslator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds, uppercasing each text
    Working,
    /// Always fails with an error
    Failing,
    /// Fails on every Nth request
    Intermittent { fail_every: usize },
    /// Returns one text fewer than it was given
    DropLast,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock translation backend
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    /// Requests seen so far, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every batch received, in arrival order
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    /// Connection checks seen so far
    connection_checks: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            batches: Arc::new(Mutex::new(Vec::new())),
            connection_checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn dropping() -> Self {
        Self::new(MockBehavior::DropLast)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn connection_checks(&self) -> usize {
        self.connection_checks.load(Ordering::SeqCst)
    }

    /// Batches received so far
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    fn uppercase(texts: &[String]) -> Vec<String> {
        texts.iter().map(|t| t.to_uppercase()).collect()
    }
}

#[async_trait]
impl TextTranslator for MockTranslator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_language: &str,
        _target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(texts.to_vec());
        }

        match self.behavior {
            MockBehavior::Working => Ok(Self::uppercase(texts)),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Mock translator failure".to_string(),
            }),
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ConnectionError(format!("Intermittent failure on request {}", count + 1)))
                } else {
                    Ok(Self::uppercase(texts))
                }
            }
            MockBehavior::DropLast => {
                let mut translated = Self::uppercase(texts);
                translated.pop();
                Ok(translated)
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Self::uppercase(texts))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.connection_checks.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Mock translator is offline".to_string())),
            _ => Ok(()),
        }
    }
}

/// Mock speech recognizer replaying a fixed segment list
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    segments: Vec<RawSegment>,
    /// Index of a segment replaced by a stream error
    fail_at: Option<usize>,
    /// Fail before producing any segment
    fail_start: bool,
    /// Every (path, options) pair received
    calls: Arc<Mutex<Vec<(PathBuf, TranscriptionOptions)>>>,
}

impl MockTranscriber {
    pub fn new(segments: Vec<RawSegment>) -> Self {
        Self {
            segments,
            fail_at: None,
            fail_start: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A recognizer that fails before producing anything
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new(Vec::new())
        }
    }

    /// Replace the segment at `index` with a stream error
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<(PathBuf, TranscriptionOptions)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(&self, media_path: &Path, options: &TranscriptionOptions) -> Result<Transcription, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((media_path.to_path_buf(), options.clone()));
        }

        if self.fail_start {
            return Err(ProviderError::AudioExtraction(format!("No audio stream in {}", media_path.display())));
        }

        let fail_at = self.fail_at;
        let items: Vec<Result<RawSegment, ProviderError>> = self.segments
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, segment)| {
                if Some(i) == fail_at {
                    Err(ProviderError::ConnectionError("Recognizer connection lost".to_string()))
                } else {
                    Ok(segment)
                }
            })
            .collect();

        Ok(Transcription {
            duration_ms: self.segments.last().map(|s| s.end_ms),
            language: options.language.clone(),
            segments: stream::iter(items).boxed(),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        if self.fail_start {
            Err(ProviderError::ConnectionError("Mock recognizer is offline".to_string()))
        } else {
            Ok(())
        }
    }
}
