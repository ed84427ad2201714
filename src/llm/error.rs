//! Text-generation error types

use crate::PitchError;
use thiserror::Error;

/// Generation error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Timeout, message)
    }

    pub fn no_model(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::NoModel, message)
    }

    pub fn empty_reply(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::EmptyReply, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    /// Map an HTTP error status to a classified error
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            400 => Self::invalid_request(format!("Invalid request: {}", message)),
            401 | 403 => Self::auth(format!("Authentication failed: {}", message)),
            404 => Self::no_model(format!("Model not found: {}", message)),
            429 => Self::rate_limit(format!("Rate limit exceeded: {}", message)),
            500..=599 => Self::server_error(format!("Server error: {}", message)),
            _ => Self::unknown(format!("HTTP {}: {}", status, message)),
        }
    }

    /// Whether a cached model id should be dropped after this error
    pub fn invalidates_model(&self) -> bool {
        matches!(self.kind, LlmErrorKind::Auth | LlmErrorKind::NoModel)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection failures - retryable
    Network,
    /// Rate limited (429) - retryable
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// The bounded wait elapsed
    Timeout,
    /// No usable model for this credential
    NoModel,
    /// The endpoint answered without any text
    EmptyReply,
    Unknown,
}

impl LlmErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network | Self::RateLimit | Self::ServerError | Self::Timeout
        )
    }
}

impl From<LlmError> for PitchError {
    fn from(e: LlmError) -> Self {
        match e.kind {
            LlmErrorKind::Auth
            | LlmErrorKind::NoModel
            | LlmErrorKind::Network
            | LlmErrorKind::RateLimit
            | LlmErrorKind::Timeout => PitchError::ModelUnavailable(e.message),
            _ => PitchError::GenerationError(e.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(LlmError::from_status(400, "x").kind, LlmErrorKind::InvalidRequest);
        assert_eq!(LlmError::from_status(401, "x").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(403, "x").kind, LlmErrorKind::Auth);
        assert_eq!(LlmError::from_status(404, "x").kind, LlmErrorKind::NoModel);
        assert_eq!(LlmError::from_status(429, "x").kind, LlmErrorKind::RateLimit);
        assert_eq!(LlmError::from_status(503, "x").kind, LlmErrorKind::ServerError);
        assert_eq!(LlmError::from_status(418, "x").kind, LlmErrorKind::Unknown);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(LlmErrorKind::Network.is_retryable());
        assert!(LlmErrorKind::Timeout.is_retryable());
        assert!(!LlmErrorKind::Auth.is_retryable());
        assert!(!LlmErrorKind::InvalidRequest.is_retryable());
    }

    #[test]
    fn test_auth_failure_invalidates_model() {
        assert!(LlmError::auth("bad key").invalidates_model());
        assert!(LlmError::no_model("gone").invalidates_model());
        assert!(!LlmError::rate_limit("slow down").invalidates_model());
    }

    #[test]
    fn test_start_up_errors_map_to_model_unavailable() {
        let err: PitchError = LlmError::auth("bad key").into();
        assert!(matches!(err, PitchError::ModelUnavailable(_)));
        let err: PitchError = LlmError::empty_reply("nothing").into();
        assert!(matches!(err, PitchError::GenerationError(_)));
    }
}
