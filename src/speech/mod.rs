//! Speech recognition and synthesis seams
//!
//! This module provides:
//! - `SpeechRecognizer` / `SpeechSynthesizer` traits the voice session drives
//! - Listening strategies for continuous vs. single-shot engines
//! - Persona voice selection
//! - Native backends: Whisper recognition and sherpa-onnx synthesis (feature gated)

pub mod recognition;
#[cfg(feature = "sherpa-tts")]
pub mod tts;
pub mod voices;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use recognition::{
    select_strategy, ContinuousListening, HostCapabilities, ListeningStrategy, RecognitionErrorCode,
    RecognitionEvent, RecognitionMode, SingleShotListening,
};
pub use voices::{select_voice, VoiceGender, VoiceInfo};

use crate::audio::AudioSource;
use crate::config::DeckConfig;
use crate::{PitchError, Result};
use crossbeam_channel::Sender;
use tracing::info;
use uuid::Uuid;

/// Speech-to-text engine
///
/// Results are delivered through the sender handed over in `attach`. Engines
/// may end on their own at any time and report it with `RecognitionEvent::Ended`.
pub trait SpeechRecognizer: Send {
    fn capabilities(&self) -> HostCapabilities;

    /// Connect the event channel; called once per session before `start`
    fn attach(&mut self, events: Sender<RecognitionEvent>, language: &str);

    fn start(&mut self, mode: RecognitionMode) -> Result<()>;

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Microphone samples for engines that do not capture on their own
    fn accept_audio(&mut self, _samples: &[f32], _sample_rate: u32) {}
}

/// One request to speak
#[derive(Clone, Debug)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    pub voice: Option<VoiceInfo>,
    pub rate: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, voice: Option<VoiceInfo>, rate: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice,
            rate,
        }
    }
}

/// Completion notifications from a synthesizer
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesisEvent {
    Finished(Uuid),
    Failed(Uuid, String),
}

/// Text-to-speech engine
pub trait SpeechSynthesizer: Send {
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Connect the completion channel; called once per session
    fn attach(&mut self, events: Sender<SynthesisEvent>);

    /// Speak an utterance, cancelling whatever is currently playing
    fn speak(&mut self, utterance: Utterance) -> Result<()>;

    fn cancel(&mut self);
}

/// Everything a voice session needs from the host
pub struct SpeechBackends {
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    /// Level source for visualization and silence detection
    pub microphone: Option<Box<dyn AudioSource>>,
}

/// Recognizer used when no engine is compiled in
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::default()
    }

    fn attach(&mut self, _events: Sender<RecognitionEvent>, _language: &str) {}

    fn start(&mut self, _mode: RecognitionMode) -> Result<()> {
        Err(PitchError::CapabilityMissing(
            "no speech recognition engine available".into(),
        ))
    }

    fn stop(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }
}

/// Synthesizer used when no engine is compiled in
#[derive(Debug, Default)]
pub struct UnsupportedSynthesizer;

impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    fn attach(&mut self, _events: Sender<SynthesisEvent>) {}

    fn speak(&mut self, _utterance: Utterance) -> Result<()> {
        Err(PitchError::CapabilityMissing(
            "no speech synthesis engine available".into(),
        ))
    }

    fn cancel(&mut self) {}
}

/// Build the backends the enabled features provide
pub fn default_backends(config: &DeckConfig) -> SpeechBackends {
    SpeechBackends {
        recognizer: build_recognizer(config),
        synthesizer: build_synthesizer(config),
        microphone: build_microphone(),
    }
}

#[cfg(feature = "whisper")]
fn build_recognizer(config: &DeckConfig) -> Box<dyn SpeechRecognizer> {
    let Some(model_path) = config.speech.whisper_model.as_ref() else {
        tracing::warn!("No whisper_model configured, speech recognition unavailable");
        return Box::new(UnsupportedRecognizer);
    };
    match whisper::WhisperRecognizer::new(model_path) {
        Ok(recognizer) => {
            info!("Whisper recognizer ready");
            Box::new(recognizer)
        }
        Err(e) => {
            tracing::warn!("Whisper recognizer unavailable: {}", e);
            Box::new(UnsupportedRecognizer)
        }
    }
}

#[cfg(not(feature = "whisper"))]
fn build_recognizer(_config: &DeckConfig) -> Box<dyn SpeechRecognizer> {
    info!("Built without a recognition engine");
    Box::new(UnsupportedRecognizer)
}

#[cfg(feature = "sherpa-tts")]
fn build_synthesizer(config: &DeckConfig) -> Box<dyn SpeechSynthesizer> {
    let Some(model_dir) = config.speech.tts_model_dir.as_ref() else {
        tracing::warn!("No tts_model_dir configured, speech synthesis unavailable");
        return Box::new(UnsupportedSynthesizer);
    };
    match tts::SherpaSynthesizer::new(model_dir, config.speech.voices.clone()) {
        Ok(synthesizer) => {
            info!("Sherpa synthesizer ready");
            Box::new(synthesizer)
        }
        Err(e) => {
            tracing::warn!("Sherpa synthesizer unavailable: {}", e);
            Box::new(UnsupportedSynthesizer)
        }
    }
}

#[cfg(not(feature = "sherpa-tts"))]
fn build_synthesizer(_config: &DeckConfig) -> Box<dyn SpeechSynthesizer> {
    info!("Built without a synthesis engine");
    Box::new(UnsupportedSynthesizer)
}

#[cfg(feature = "audio-io")]
fn build_microphone() -> Option<Box<dyn AudioSource>> {
    match crate::audio::MicrophoneCapture::new() {
        Ok(mic) => Some(Box::new(mic)),
        Err(e) => {
            tracing::warn!("Microphone unavailable, continuing without level capture: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "audio-io"))]
fn build_microphone() -> Option<Box<dyn AudioSource>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_recognizer_reports_missing_capability() {
        let mut recognizer = UnsupportedRecognizer;
        assert!(!recognizer.capabilities().speech_recognition);
        assert!(matches!(
            recognizer.start(RecognitionMode::Continuous),
            Err(PitchError::CapabilityMissing(_))
        ));
    }

    #[test]
    fn test_utterance_ids_are_unique() {
        let a = Utterance::new("hi", None, 0.95);
        let b = Utterance::new("hi", None, 0.95);
        assert_ne!(a.id, b.id);
    }
}
