use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::ConfigError;
use crate::language_utils;
use crate::transcription::merger::MergePolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Language spoken in the media, or written in the subtitle file.
    /// Absent means autodetect when transcribing.
    #[serde(default)]
    pub source_language: Option<String>,

    /// Language to translate into
    #[serde(default)]
    pub target_language: Option<String>,

    /// Speech recognition backend settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Translation backend settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Cue assembly settings
    #[serde(default)]
    pub subtitle: SubtitleConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// What an invocation does with its input files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Media to same-language subtitles
    Transcribe,
    /// Media to subtitles in the target language
    TranscribeTranslate,
    /// Subtitle file to subtitles in the target language
    Translate,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::TranscribeTranslate => "transcribe-translate",
            Self::Translate => "translate",
        }
    }

    /// Whether this mode runs the translation backend
    pub fn translates(&self) -> bool {
        !matches!(self, Self::Transcribe)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Translation model family
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    // @backend: Helsinki-NLP opus-mt, one model per language pair, ISO 639-1 codes
    #[default]
    Helsinki,
    // @backend: NLLB-200, one multilingual model, script-qualified codes
    Nllb,
}

impl TranslationBackend {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Helsinki => "Helsinki",
            Self::Nllb => "NLLB",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Helsinki => "helsinki".to_string(),
            Self::Nllb => "nllb".to_string(),
        }
    }

    /// English, in this backend's code format. Whisper's translate task produces it.
    pub fn pivot_language(&self) -> &'static str {
        match self {
            Self::Helsinki => "en",
            Self::Nllb => "eng_Latn",
        }
    }

    /// Model repository id for a language pair
    pub fn model_id(&self, source_language: &str, target_language: &str) -> String {
        match self {
            Self::Helsinki => format!("Helsinki-NLP/opus-mt-{}-{}", source_language, target_language),
            Self::Nllb => "facebook/nllb-200-distilled-600M".to_string(),
        }
    }

    /// Whether a language code has the format this backend expects
    pub fn accepts_language_code(&self, code: &str) -> bool {
        match self {
            Self::Helsinki => language_utils::is_part1_code(code),
            Self::Nllb => language_utils::is_nllb_code(code),
        }
    }

    /// Example of a valid code, for error messages
    pub fn example_code(&self) -> &'static str {
        match self {
            Self::Helsinki => "es",
            Self::Nllb => "spa_Latn",
        }
    }
}

impl std::fmt::Display for TranslationBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "helsinki" => Ok(Self::Helsinki),
            "nllb" => Ok(Self::Nllb),
            _ => Err(anyhow!("Invalid translation model type: {}", s)),
        }
    }
}

/// Whisper server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// OpenAI-compatible base URL, e.g. a local faster-whisper server
    #[serde(default = "default_whisper_endpoint")]
    pub endpoint: String,

    /// API key, empty for local servers
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Whisper model size (large-v3, medium, ...)
    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,

    /// Time allowed for ffmpeg to decode the audio track
    #[serde(default = "default_ffmpeg_timeout_secs")]
    pub ffmpeg_timeout_secs: u64,

    /// Ask the server to stream segments as server-sent events. Servers that
    /// answer with a plain JSON body are read in one piece.
    #[serde(default = "default_stream_segments")]
    pub stream_segments: bool,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_whisper_endpoint(),
            api_key: String::new(),
            model: default_whisper_model(),
            timeout_secs: default_transcription_timeout_secs(),
            ffmpeg_timeout_secs: default_ffmpeg_timeout_secs(),
            stream_segments: default_stream_segments(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model family to use
    #[serde(default)]
    pub backend: TranslationBackend,

    /// Inference server base URL; the model id is appended
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,

    /// Bearer token for the inference server
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Number of cue texts sent per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Cue texts longer than this many characters are cut before translation
    #[serde(default = "default_max_chars_per_text")]
    pub max_chars_per_text: usize,

    /// Maximum number of batches in flight
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Request timeout in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackend::default(),
            endpoint: default_translation_endpoint(),
            api_key: String::new(),
            batch_size: default_batch_size(),
            max_chars_per_text: default_max_chars_per_text(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_translation_timeout_secs(),
        }
    }
}

/// Configuration for cue assembly and post-processing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubtitleConfig {
    /// Minimum time every cue stays on screen
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,

    /// When consecutive identical segments collapse into one cue
    #[serde(default)]
    pub merge_policy: MergePolicy,

    /// Stop duration extension at the next cue's start
    #[serde(default)]
    pub clip_overlaps: bool,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: default_min_duration_ms(),
            merge_policy: MergePolicy::default(),
            clip_overlaps: false,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_whisper_endpoint() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_whisper_model() -> String {
    "large-v3".to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    1800 // long recordings take a while on CPU
}

fn default_ffmpeg_timeout_secs() -> u64 {
    600
}

fn default_stream_segments() -> bool {
    true
}

fn default_translation_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_batch_size() -> usize {
    8
}

fn default_max_chars_per_text() -> usize {
    400
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_translation_timeout_secs() -> u64 {
    120
}

fn default_min_duration_ms() -> u64 {
    2000
}

impl Config {
    /// Load the configuration file, or write a default one when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for the selected mode, before any file is touched
    pub fn validate_for_mode(&self, mode: Mode) -> Result<(), ConfigError> {
        if self.subtitle.min_duration_ms == 0 {
            return Err(invalid("min_subtitle_duration", "must be greater than zero"));
        }

        let source = self.source_language.as_deref().filter(|s| !s.trim().is_empty());
        let target = self.target_language.as_deref().filter(|s| !s.trim().is_empty());
        let backend = self.translation.backend;

        match mode {
            Mode::Transcribe => {
                if let Some(source) = source {
                    check_speech_language(source)?;
                }
            }
            Mode::TranscribeTranslate => {
                let target = target.ok_or_else(|| missing("--target-lang", mode))?;
                if let Some(source) = source {
                    check_speech_language(source)?;
                }
                check_backend_language(backend, "target_language", target)?;
            }
            Mode::Translate => {
                let source = source.ok_or_else(|| missing("--source-lang", mode))?;
                let target = target.ok_or_else(|| missing("--target-lang", mode))?;
                check_backend_language(backend, "source_language", source)?;
                check_backend_language(backend, "target_language", target)?;
            }
        }

        if mode.translates() {
            if self.translation.batch_size == 0 {
                return Err(invalid("translation.batch_size", "must be at least 1"));
            }
            if self.translation.max_chars_per_text == 0 {
                return Err(invalid("translation.max_chars_per_text", "must be at least 1"));
            }
            if self.translation.concurrent_requests == 0 {
                return Err(invalid("translation.concurrent_requests", "must be at least 1"));
            }
        }

        Ok(())
    }
}

fn missing(parameter: &str, mode: Mode) -> ConfigError {
    ConfigError::MissingParameter {
        parameter: parameter.to_string(),
        mode: mode.to_string(),
    }
}

fn invalid(parameter: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        parameter: parameter.to_string(),
        message: message.to_string(),
    }
}

// Any known code works here, it is reduced to ISO 639-1 before reaching Whisper
fn check_speech_language(code: &str) -> Result<(), ConfigError> {
    language_utils::normalize_to_part1_or_part2t(code)
        .map(|_| ())
        .map_err(|_| invalid("source_language", &format!("'{}' is not a known language code", code)))
}

fn check_backend_language(backend: TranslationBackend, parameter: &str, code: &str) -> Result<(), ConfigError> {
    if backend.accepts_language_code(code) {
        Ok(())
    } else {
        Err(invalid(
            parameter,
            &format!(
                "'{}' is not a {} language code (expected something like '{}')",
                code,
                backend.display_name(),
                backend.example_code()
            ),
        ))
    }
}
