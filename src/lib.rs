/*!
 * # subtitler
 *
 * A Rust library for building subtitle tracks from speech recognition output
 * and translating them.
 *
 * ## Features
 *
 * - Fold repeated recognition segments into numbered cues
 * - Enforce a minimum on-screen duration per cue
 * - Translate whole tracks in length-bounded, order-preserving batches:
 *   - Helsinki-NLP opus-mt models (ISO 639-1 codes)
 *   - NLLB-200 (script-qualified codes such as `spa_Latn`)
 * - Read and write SRT files
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Cue and track model, SRT parsing and writing
 * - `transcription`: Recognizer capability and the segment merger
 * - `timing`: Minimum duration enforcement
 * - `translation`: Batch translation of tracks:
 *   - `translation::core`: Translator capability and service
 *   - `translation::batch`: Batching and write-back
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Backend clients:
 *   - `providers::whisper`: OpenAI-compatible Whisper server client
 *   - `providers::huggingface`: Hugging Face translation inference client
 *   - `providers::mock`: Deterministic backends for tests
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod subtitle_processor;
pub mod timing;
pub mod transcription;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, Mode};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
pub use timing::{DurationNormalizer, enforce_min_duration};
pub use transcription::{MergePolicy, RawSegment, Transcriber, merge_segments};
pub use translation::{BatchTranslator, TextTranslator, TranslationService};
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use errors::{ConfigError, ProviderError, SubtitleError, TranslationError};
