/*!
 * Core translation service implementation.
 *
 * This module contains the `TextTranslator` capability every translation
 * backend implements, and the `TranslationService` that binds a backend to a
 * language pair and batch settings.
 */

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::TranslationConfig;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::huggingface::HuggingFaceTranslator;

/// Batch text translation capability
///
/// Implementations return exactly one string per input, in input order.
#[async_trait]
pub trait TextTranslator: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Translate a batch of texts from `source_language` to `target_language`
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Check that the backend is reachable
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Translation options for customizing the batching process
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Cue texts per request
    pub batch_size: usize,

    /// Characters kept from each cue text
    pub max_chars_per_text: usize,

    /// Maximum number of concurrent requests
    pub max_concurrent_requests: usize,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            batch_size: 8,
            max_chars_per_text: 400,
            max_concurrent_requests: 4,
        }
    }
}

impl From<&TranslationConfig> for TranslationOptions {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            max_chars_per_text: config.max_chars_per_text.max(1),
            max_concurrent_requests: config.concurrent_requests.max(1),
        }
    }
}

/// A translation backend bound to one language pair
#[derive(Clone)]
pub struct TranslationService {
    backend: Arc<dyn TextTranslator>,

    pub source_language: String,

    pub target_language: String,

    pub options: TranslationOptions,
}

impl TranslationService {
    /// Bind an existing backend
    pub fn new(
        backend: Arc<dyn TextTranslator>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        options: TranslationOptions,
    ) -> Self {
        Self {
            backend,
            source_language: source_language.into(),
            target_language: target_language.into(),
            options,
        }
    }

    /// Build the configured Hugging Face backend for a language pair
    pub fn from_config(
        config: &TranslationConfig,
        source_language: &str,
        target_language: &str,
    ) -> Result<Self, TranslationError> {
        for code in [source_language, target_language] {
            if !config.backend.accepts_language_code(code) {
                return Err(TranslationError::InvalidLanguage {
                    code: code.to_string(),
                    backend: config.backend.to_string(),
                });
            }
        }

        let backend = HuggingFaceTranslator::new(config)?;
        Ok(Self::new(Arc::new(backend), source_language, target_language, config.into()))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Translate one batch and check that nothing was dropped or added
    pub async fn translate_texts(&self, texts: &[String]) -> Result<Vec<String>, TranslationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let start_time = Instant::now();
        let translated = self.backend
            .translate_batch(texts, &self.source_language, &self.target_language)
            .await?;

        if translated.len() != texts.len() {
            return Err(TranslationError::LengthMismatch {
                expected: texts.len(),
                actual: translated.len(),
            });
        }

        debug!("Translated {} texts in {:?}", texts.len(), start_time.elapsed());
        Ok(translated)
    }

    /// Test the connection to the backend
    pub async fn test_connection(&self) -> Result<(), TranslationError> {
        self.backend.test_connection().await?;
        Ok(())
    }
}
