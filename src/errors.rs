/*!
 * Error types for the hardsub-ocr application.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when calling an OCR backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request could not be delivered or the connection broke
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered, but not with the expected structure
    #[error("Failed to parse backend response: {0}")]
    Parse(String),

    /// The backend returned a different number of results than images submitted
    #[error("Result count mismatch: submitted {expected} images, got {actual} results")]
    CountMismatch {
        /// Number of images in the request
        expected: usize,
        /// Number of results in the response
        actual: usize,
    },

    /// The backend reported overload or an exhausted quota
    #[error("Backend overloaded: {0}")]
    Overloaded(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    Authentication(String),
}

impl ProviderError {
    /// Whether another attempt at the same request can succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Authentication(_))
    }

    /// Classify a non-success HTTP status returned by a backend
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::Authentication(message),
            429 | 503 => Self::Overloaded(format!("HTTP {}: {}", status_code, message)),
            _ => Self::Api { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Errors raised while decoding an image filename back into a time range
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NamingError {
    /// The name does not contain the `__` separator between start and end
    #[error("missing '__' separator in '{0}'")]
    MissingSeparator(String),

    /// Not enough underscore-delimited fields for a timecode
    #[error("expected 4 timecode fields in '{name}', found {found}")]
    TooFewFields {
        /// The offending name
        name: String,
        /// Number of fields found
        found: usize,
    },

    /// A timecode field is not a number
    #[error("invalid timecode field '{field}' in '{name}'")]
    InvalidField {
        /// The offending name
        name: String,
        /// The field that failed to parse
        field: String,
    },
}

/// Errors that can occur while exporting interval frames
#[derive(Error, Debug)]
pub enum ExportError {
    /// No decoded frame exists for the requested index
    #[error("Frame {0} not found")]
    FrameNotFound(u64),

    /// The frame could not be decoded or encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error while writing or renaming
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The crop region for the channel is empty for this frame size
    #[error("Empty crop region for {width}x{height} frame")]
    EmptyRegion {
        /// Frame width
        width: u32,
        /// Frame height
        height: u32,
    },
}

/// Application-level failures raised before any work starts
#[derive(Error, Debug)]
pub enum AppError {
    /// An input or output location is missing or unusable
    #[error("File error: {0}")]
    File(String),

    /// A configuration value is out of range or missing
    #[error("Configuration error: {0}")]
    Config(String),
}
