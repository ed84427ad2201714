//! Live voice demo session
//!
//! This module provides:
//! - The five-state turn-taking machine and its shared handle
//! - The conversation transcript
//! - Silence-based end-of-utterance detection
//! - `VoiceConnector`, which drives recognition, generation and synthesis

pub mod connector;
pub mod silence;
pub mod state;
pub mod transcript;

pub use connector::{LevelCallback, VoiceConnector};
pub use silence::SilenceDetector;
pub use state::{
    transition, Effect, SessionEvent, SessionState, SharedSessionState, Transition,
    TransitionError,
};
pub use transcript::Transcript;
