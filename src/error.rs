//! Error types for pianosheet.

use crate::input::ValidationError;
use crate::session::state::{FailureReason, InvalidTransition};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PianosheetError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Local input errors (never reach the network)
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    // Remote errors
    #[error("Analysis failed: {message}")]
    AnalysisFailed { message: String },

    #[error("Transcription failed: {message}")]
    TranscriptionFailed { message: String },

    #[error("Rendering failed: {message}")]
    RenderFailed { message: String },

    #[error("HTTP client error: {message}")]
    HttpClient { message: String },

    // Session errors
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Source choice '{choice}' is not offered for this video")]
    ChoiceUnavailable { choice: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl PianosheetError {
    /// The message to show in the session's error slot.
    ///
    /// Remote failures carry the backend's detail verbatim, so they are
    /// returned without the variant prefix.
    pub fn into_detail(self) -> String {
        match self {
            PianosheetError::AnalysisFailed { message }
            | PianosheetError::TranscriptionFailed { message }
            | PianosheetError::RenderFailed { message } => message,
            other => other.to_string(),
        }
    }
}

impl From<FailureReason> for PianosheetError {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Validation(e) => PianosheetError::Validation(e),
            FailureReason::Analysis(message) => PianosheetError::AnalysisFailed { message },
            FailureReason::Transcription(message) => {
                PianosheetError::TranscriptionFailed { message }
            }
            FailureReason::Render(message) => PianosheetError::RenderFailed { message },
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PianosheetError>;
