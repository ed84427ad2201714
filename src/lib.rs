pub mod audio;
pub mod config;
pub mod deck;
pub mod llm;
pub mod roi;
pub mod scheduling;
pub mod session;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PitchError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Capability missing: {0}")]
    CapabilityMissing(String),

    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Recognition error: {0}")]
    RecognitionError(String),

    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid session transition: {0}")]
    SessionError(String),

    #[error("Call cancelled: {0}")]
    CallCancelled(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for PitchError {
    fn from(e: std::io::Error) -> Self {
        PitchError::IOError(e.to_string())
    }
}

impl PitchError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/device errors may require user intervention
            PitchError::AudioDeviceError(_) => false,
            PitchError::CapabilityMissing(_) => false,
            PitchError::PermissionDenied(_) => false,
            // A new start() may succeed once connectivity is back
            PitchError::ModelUnavailable(_) => true,
            PitchError::MissingCredential(_) => false,
            // These are typically transient errors
            PitchError::GenerationError(_) => true,
            PitchError::RecognitionError(_) => true,
            PitchError::SynthesisError(_) => true,
            PitchError::AudioProcessingError(_) => true,
            PitchError::ConfigError(_) => false,
            PitchError::SessionError(_) => true,
            PitchError::CallCancelled(_) => true,
            PitchError::ChannelError(_) => false,
            PitchError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            PitchError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            PitchError::CapabilityMissing(_) => {
                "Voice demo is not supported on this device.".to_string()
            }
            PitchError::PermissionDenied(_) => {
                "Microphone access was denied.".to_string()
            }
            PitchError::ModelUnavailable(_) => "Connection failed. Try again.".to_string(),
            PitchError::MissingCredential(_) => {
                "API key missing. Check your environment settings.".to_string()
            }
            PitchError::GenerationError(_) => {
                "AI response generation failed. Please try again.".to_string()
            }
            PitchError::RecognitionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            PitchError::SynthesisError(_) => {
                "Text-to-speech failed. Please try again.".to_string()
            }
            PitchError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            PitchError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            PitchError::SessionError(_) => "The call is busy. Please try again.".to_string(),
            PitchError::CallCancelled(_) => "Call ended.".to_string(),
            PitchError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            PitchError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_failures_are_reported_to_user() {
        let err = PitchError::ModelUnavailable("no gemini model".into());
        assert_eq!(err.user_message(), "Connection failed. Try again.");
        assert!(err.is_recoverable());

        let err = PitchError::CapabilityMissing("no recognizer".into());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "deck.toml");
        let err: PitchError = io.into();
        assert!(matches!(err, PitchError::IOError(_)));
        assert!(err.to_string().contains("deck.toml"));
    }
}
