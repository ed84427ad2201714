//! Microphone capture and level metering

#[cfg(feature = "audio-io")]
pub mod input;
pub mod level;
pub mod resampler;

#[cfg(feature = "audio-io")]
pub use input::MicrophoneCapture;
pub use level::{rms_db, LevelAnalyzer, LevelMeter, LevelSnapshot, BIN_COUNT, FLOOR_DB};
pub use resampler::AudioResampler;

use crate::Result;
use crossbeam_channel::Sender;

/// A live source of mono microphone samples
pub trait AudioSource: Send {
    /// Begin delivering sample blocks to `audio_tx`
    fn start(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()>;

    fn stop(&mut self);

    fn sample_rate(&self) -> u32;
}
