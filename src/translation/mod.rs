/*!
 * Translation of subtitle tracks.
 *
 * - `core`: the `TextTranslator` capability and the `TranslationService`
 *   binding a backend to a language pair
 * - `batch`: length-bounded, order-preserving batch translation of a track
 */

// Re-export main types for easier usage
pub use self::batch::BatchTranslator;
pub use self::core::{TextTranslator, TranslationOptions, TranslationService};

// Submodules
pub mod batch;
pub mod core;
