/*!
 * Batch translation processing.
 *
 * This module rewrites the text of every cue in a track through a
 * `TranslationService`, in fixed-size batches that may run concurrently,
 * while keeping each translated text attached to the cue it came from.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::errors::TranslationError;
use crate::subtitle_processor::SubtitleCollection;

use super::core::TranslationService;

/// Cut a text to at most `max_chars` characters (not bytes)
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Batch translator for rewriting a whole track
pub struct BatchTranslator {
    /// The translation service to use
    service: TranslationService,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(service: TranslationService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Cue texts in track order, each cut to the configured length
    pub fn prepare_texts(&self, collection: &SubtitleCollection) -> Vec<String> {
        let max_chars = self.service.options.max_chars_per_text;
        collection.entries
            .iter()
            .map(|entry| {
                let text = truncate_text(&entry.text, max_chars);
                if text.len() < entry.text.len() {
                    debug!("Cue {} cut to {} characters before translation", entry.seq_num, max_chars);
                }
                text
            })
            .collect()
    }

    /// Split texts into ordered batches
    pub fn split_into_batches(&self, texts: Vec<String>) -> Vec<Vec<String>> {
        let batch_size = self.service.options.batch_size.max(1);
        let mut batches = Vec::with_capacity(texts.len().div_ceil(batch_size));
        let mut texts = texts.into_iter().peekable();

        while texts.peek().is_some() {
            batches.push(texts.by_ref().take(batch_size).collect());
        }

        batches
    }

    /// Translate every cue of the track in place.
    ///
    /// Timings, indices and order are untouched. Cue text is only replaced once
    /// every batch has come back with the right number of texts; on any error
    /// the track is left as it was.
    pub async fn translate_collection(
        &self,
        collection: &mut SubtitleCollection,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<(), TranslationError> {
        if collection.is_empty() {
            return Ok(());
        }

        let texts = self.prepare_texts(collection);
        let expected = texts.len();
        let batches = self.split_into_batches(texts);
        let translated = self.translate_batches(batches, progress_callback).await?;

        if translated.len() != expected {
            error!("Translation returned {} texts for {} cues", translated.len(), expected);
            return Err(TranslationError::LengthMismatch {
                expected,
                actual: translated.len(),
            });
        }

        for (entry, text) in collection.entries.iter_mut().zip(translated) {
            entry.text = text;
        }
        collection.language = self.service.target_language.clone();

        Ok(())
    }

    /// Translate batches concurrently and return the results flattened in batch order.
    ///
    /// The first failing batch ends the run; batches not yet started are never sent.
    pub async fn translate_batches(
        &self,
        batches: Vec<Vec<String>>,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<Vec<String>, TranslationError> {
        let max_concurrent = self.service.options.max_concurrent_requests.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        let total_batches = batches.len();
        let processed_batches = Arc::new(AtomicUsize::new(0));

        let mut results = stream::iter(batches.into_iter().enumerate())
            .map(|(batch_index, batch)| {
                let service = self.service.clone();
                let semaphore = semaphore.clone();
                let processed_batches = processed_batches.clone();
                let progress_callback = progress_callback.clone();

                async move {
                    // The semaphore is never closed, so acquire cannot fail
                    let _permit = semaphore.acquire().await.ok();

                    let start_time = Instant::now();
                    let result = service.translate_texts(&batch).await;

                    let current = processed_batches.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total_batches);

                    match result {
                        Ok(texts) => {
                            debug!("Batch {} of {} completed in {:?}", batch_index + 1, total_batches, start_time.elapsed());
                            Ok((batch_index, texts))
                        }
                        Err(e) => {
                            error!("Batch {} of {} failed: {}", batch_index + 1, total_batches, e);
                            Err(e)
                        }
                    }
                }
            })
            .buffer_unordered(max_concurrent)
            .try_collect::<Vec<_>>()
            .await?;

        // Sort results by batch index to maintain original order
        results.sort_by_key(|(idx, _)| *idx);

        Ok(results.into_iter().flat_map(|(_, texts)| texts).collect())
    }
}
