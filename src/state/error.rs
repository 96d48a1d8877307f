//! Capture error taxonomy
//!
//! Every failure that ends a capture session is mapped onto one of these
//! variants before it is reported. The classifier has no error path.

use serde::{Deserialize, Serialize};

/// Stable category attached to every error notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    UnsupportedEnvironment,
    NoSpeechDetected,
    AudioCaptureFailed,
    PermissionDenied,
    Aborted,
    CommandTimeout,
    /// Engine reported a kind outside the known set
    Engine,
}

/// Errors that terminate a capture session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Speech recognition is not supported in this environment.")]
    UnsupportedEnvironment,

    #[error("No speech detected. Please try again.")]
    NoSpeechDetected,

    #[error("Audio capture failed. Check microphone permissions.")]
    AudioCaptureFailed,

    #[error("Microphone access denied. Please enable it in your system settings.")]
    PermissionDenied,

    #[error("{}", aborted_message(.awaiting_command))]
    Aborted { awaiting_command: bool },

    #[error("Command listening timed out after wake word.")]
    CommandTimeout,

    #[error("{message}")]
    Engine { kind: String, message: String },
}

fn aborted_message(awaiting_command: &bool) -> &'static str {
    if *awaiting_command {
        "Command listening aborted."
    } else {
        "Listening aborted."
    }
}

impl CaptureError {
    /// Map an engine-reported error kind onto the taxonomy
    ///
    /// `awaiting_command` is true when the wake phrase had already been
    /// heard and the gate was waiting for the command body.
    pub fn from_engine(kind: &str, message: &str, awaiting_command: bool) -> Self {
        match kind {
            "no-speech" => CaptureError::NoSpeechDetected,
            "audio-capture" => CaptureError::AudioCaptureFailed,
            "not-allowed" | "service-not-allowed" => CaptureError::PermissionDenied,
            "aborted" => CaptureError::Aborted { awaiting_command },
            _ => CaptureError::Engine {
                kind: kind.to_string(),
                message: if message.is_empty() {
                    kind.to_string()
                } else {
                    message.to_string()
                },
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CaptureError::UnsupportedEnvironment => ErrorCategory::UnsupportedEnvironment,
            CaptureError::NoSpeechDetected => ErrorCategory::NoSpeechDetected,
            CaptureError::AudioCaptureFailed => ErrorCategory::AudioCaptureFailed,
            CaptureError::PermissionDenied => ErrorCategory::PermissionDenied,
            CaptureError::Aborted { .. } => ErrorCategory::Aborted,
            CaptureError::CommandTimeout => ErrorCategory::CommandTimeout,
            CaptureError::Engine { .. } => ErrorCategory::Engine,
        }
    }
}
