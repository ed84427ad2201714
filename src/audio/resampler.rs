//! Mono sample-rate conversion for recognition engines
//!
//! Microphones deliver whatever rate the device prefers; Whisper and the VAD
//! want 16 kHz. `AudioResampler` is fed arbitrary block sizes and emits
//! converted audio as soon as a full chunk is buffered.

use crate::{PitchError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

const CHUNK_FRAMES: usize = 1024;

/// Streaming mono resampler
pub struct AudioResampler {
    resampler: Option<SincFixedIn<f32>>,
    pending: Vec<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl AudioResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(PitchError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        // equal rates pass straight through
        let resampler = if input_rate == output_rate {
            None
        } else {
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            let ratio = output_rate as f64 / input_rate as f64;
            Some(
                SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_FRAMES, 1).map_err(|e| {
                    PitchError::AudioProcessingError(format!("Failed to create resampler: {}", e))
                })?,
            )
        };

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            pending: Vec::with_capacity(CHUNK_FRAMES * 2),
            input_rate,
            output_rate,
        })
    }

    /// Buffer `input` and return whatever full chunks could be converted
    pub fn push(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(input.to_vec());
        };

        self.pending.extend_from_slice(input);
        let mut output = Vec::new();

        while self.pending.len() >= CHUNK_FRAMES {
            let chunk: Vec<f32> = self.pending.drain(..CHUNK_FRAMES).collect();
            let converted = resampler.process(&[chunk], None).map_err(|e| {
                PitchError::AudioProcessingError(format!("Resampling failed: {}", e))
            })?;
            if let Some(channel) = converted.into_iter().next() {
                output.extend(channel);
            }
        }

        Ok(output)
    }

    /// Convert the buffered tail, zero padded, trimmed to its real length
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(std::mem::take(&mut self.pending));
        };

        let real_frames = self.pending.len();
        let mut chunk = std::mem::take(&mut self.pending);
        chunk.resize(CHUNK_FRAMES, 0.0);

        let converted = resampler
            .process(&[chunk], None)
            .map_err(|e| PitchError::AudioProcessingError(format!("Resampling failed: {}", e)))?;

        let keep = ((real_frames as f64) * self.ratio()).ceil() as usize;
        Ok(converted
            .into_iter()
            .next()
            .map(|mut channel| {
                channel.truncate(keep);
                channel
            })
            .unwrap_or_default())
    }

    pub fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Drop buffered audio and filter state
    pub fn reset(&mut self) {
        self.pending.clear();
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rates() {
        assert!(AudioResampler::new(0, 16000).is_err());
        assert!(AudioResampler::new(48000, 0).is_err());
    }

    #[test]
    fn test_equal_rates_pass_through() {
        let mut resampler = AudioResampler::new(16000, 16000).unwrap();
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resampler.push(&input).unwrap(), input);
        assert!(resampler.flush().unwrap().is_empty());
    }

    #[test]
    fn test_small_blocks_are_buffered() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        let block = vec![0.0f32; 480];
        assert!(resampler.push(&block).unwrap().is_empty());
        assert!(resampler.push(&block).unwrap().is_empty());
        // third block crosses the chunk boundary
        assert!(!resampler.push(&block).unwrap().is_empty());
    }

    #[test]
    fn test_downsampling_length() {
        let input: Vec<f32> = (0..48000).map(|i| (i as f32 * 0.01).sin()).collect();
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        let mut output = Vec::new();
        for block in input.chunks(480) {
            output.extend(resampler.push(block).unwrap());
        }
        output.extend(resampler.flush().unwrap());
        let expected = 16000.0;
        assert!((output.len() as f64 - expected).abs() / expected < 0.05);
    }

    #[test]
    fn test_reset_clears_pending() {
        let mut resampler = AudioResampler::new(44100, 16000).unwrap();
        resampler.push(&[0.5; 100]).unwrap();
        resampler.reset();
        assert!(resampler.flush().unwrap().is_empty());
    }
}
