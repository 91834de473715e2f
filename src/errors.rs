/*!
 * Error types for the subtitler application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a transcription or translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The backend did not answer in time
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Audio could not be extracted from the input media
    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),
}

/// Errors that can occur while reading or validating subtitle tracks
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// Malformed SRT content
    #[error("Malformed subtitle at line {line}: {message}")]
    Parse {
        /// 1-based line number where parsing failed
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A timestamp that does not follow HH:MM:SS,mmm or does not fit in u64 milliseconds
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The backend returned a different number of texts than it was given
    #[error("Translation returned {actual} texts for {expected} inputs")]
    LengthMismatch {
        /// Number of texts submitted
        expected: usize,
        /// Number of texts returned
        actual: usize,
    },

    /// Language code not accepted by the selected backend
    #[error("Invalid language code '{code}' for {backend} backend")]
    InvalidLanguage {
        /// The rejected code
        code: String,
        /// Backend name
        backend: String,
    },
}

/// Errors in the user supplied configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A parameter the selected mode needs is absent
    #[error("{parameter} is required for {mode} mode")]
    MissingParameter {
        /// Name of the missing parameter, as shown to the user
        parameter: String,
        /// Mode that needs it
        mode: String,
    },

    /// A parameter is present but unusable
    #[error("Invalid value for {parameter}: {message}")]
    InvalidValue {
        /// Name of the parameter
        parameter: String,
        /// Why the value was rejected
        message: String,
    },
}
