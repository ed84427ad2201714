//! Microphone level metering for the audio visualizer
//!
//! `LevelAnalyzer` turns raw microphone samples into the same shape a browser
//! analyser node produces: 128 frequency bins of 0-255 from a 256 sample
//! window, plus the overall RMS level used for silence detection.

use parking_lot::RwLock;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// FFT window size
pub const WINDOW_SIZE: usize = 256;
/// Number of frequency bins (half the window)
pub const BIN_COUNT: usize = WINDOW_SIZE / 2;

/// Level reported for silence or missing input
pub const FLOOR_DB: f32 = -100.0;

const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

/// RMS level of a block in dBFS
pub fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return FLOOR_DB;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = energy.sqrt().max(1e-6);
    (20.0 * rms.log10()).max(FLOOR_DB)
}

/// One visualizer frame
#[derive(Clone, Debug, PartialEq)]
pub struct LevelSnapshot {
    pub db: f32,
    pub bins: [u8; BIN_COUNT],
}

impl Default for LevelSnapshot {
    fn default() -> Self {
        Self {
            db: FLOOR_DB,
            bins: [0; BIN_COUNT],
        }
    }
}

/// Rolling spectrum analyzer
pub struct LevelAnalyzer {
    window: Vec<f32>,
    hann: Vec<f32>,
    smoothed: Vec<f32>,
}

impl Default for LevelAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelAnalyzer {
    pub fn new() -> Self {
        let hann = (0..WINDOW_SIZE)
            .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f32 / WINDOW_SIZE as f32).cos()))
            .collect();
        Self {
            window: vec![0.0; WINDOW_SIZE],
            hann,
            smoothed: vec![0.0; BIN_COUNT],
        }
    }

    /// Feed a block of samples and get the latest frame
    pub fn push(&mut self, samples: &[f32]) -> LevelSnapshot {
        if samples.len() >= WINDOW_SIZE {
            self.window
                .copy_from_slice(&samples[samples.len() - WINDOW_SIZE..]);
        } else {
            self.window.rotate_left(samples.len());
            let start = WINDOW_SIZE - samples.len();
            self.window[start..].copy_from_slice(samples);
        }

        let mut bins = [0u8; BIN_COUNT];
        for (k, bin) in bins.iter_mut().enumerate() {
            let (mut re, mut im) = (0.0f32, 0.0f32);
            for (n, (&x, &w)) in self.window.iter().zip(&self.hann).enumerate() {
                let phase = 2.0 * PI * (k * n) as f32 / WINDOW_SIZE as f32;
                re += x * w * phase.cos();
                im -= x * w * phase.sin();
            }
            let magnitude = (re * re + im * im).sqrt() / WINDOW_SIZE as f32;
            self.smoothed[k] = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * magnitude;

            let db = 20.0 * self.smoothed[k].max(1e-9).log10();
            let scaled = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS) * 255.0;
            *bin = scaled.clamp(0.0, 255.0) as u8;
        }

        LevelSnapshot {
            db: rms_db(samples),
            bins,
        }
    }

    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.smoothed.fill(0.0);
    }
}

/// Latest level shared between the session worker and the UI
#[derive(Clone)]
pub struct LevelMeter {
    db_bits: Arc<AtomicU32>,
    snapshot: Arc<RwLock<LevelSnapshot>>,
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelMeter {
    pub fn new() -> Self {
        Self {
            db_bits: Arc::new(AtomicU32::new(FLOOR_DB.to_bits())),
            snapshot: Arc::new(RwLock::new(LevelSnapshot::default())),
        }
    }

    pub fn update(&self, snapshot: LevelSnapshot) {
        self.db_bits.store(snapshot.db.to_bits(), Ordering::Relaxed);
        *self.snapshot.write() = snapshot;
    }

    pub fn level_db(&self) -> f32 {
        f32::from_bits(self.db_bits.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        self.snapshot.read().clone()
    }

    pub fn clear(&self) {
        self.update(LevelSnapshot::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: usize, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| {
                amplitude * (2.0 * PI * freq_bin as f32 * n as f32 / WINDOW_SIZE as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_rms_db_handles_empty_and_silence() {
        assert_eq!(rms_db(&[]), FLOOR_DB);
        assert!(rms_db(&[0.0; 512]) <= -100.0 + f32::EPSILON);
    }

    #[test]
    fn test_rms_db_full_scale() {
        let square = vec![1.0f32; 256];
        assert!(rms_db(&square).abs() < 0.01);
        let half = vec![0.5f32; 256];
        assert!((rms_db(&half) + 6.02).abs() < 0.05);
    }

    #[test]
    fn test_silence_produces_empty_bins() {
        let mut analyzer = LevelAnalyzer::new();
        let snapshot = analyzer.push(&[0.0; WINDOW_SIZE]);
        assert!(snapshot.bins.iter().all(|&b| b == 0));
        assert_eq!(snapshot.db, FLOOR_DB);
    }

    #[test]
    fn test_tone_peaks_in_its_bin() {
        let mut analyzer = LevelAnalyzer::new();
        let tone = sine(16, 0.05, WINDOW_SIZE);
        // let smoothing settle
        let mut snapshot = analyzer.push(&tone);
        for _ in 0..20 {
            snapshot = analyzer.push(&tone);
        }
        let peak = snapshot
            .bins
            .iter()
            .enumerate()
            .max_by_key(|&(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 16);
        assert!(snapshot.bins[16] > 200);
    }

    #[test]
    fn test_short_blocks_roll_the_window() {
        let mut analyzer = LevelAnalyzer::new();
        let tone = sine(8, 0.5, 64);
        let snapshot = analyzer.push(&tone);
        assert!(snapshot.db > FLOOR_DB);
        assert_eq!(&analyzer.window[WINDOW_SIZE - 64..], tone.as_slice());
    }

    #[test]
    fn test_meter_shares_latest_snapshot() {
        let meter = LevelMeter::new();
        let reader = meter.clone();
        assert_eq!(reader.level_db(), FLOOR_DB);

        let mut snapshot = LevelSnapshot::default();
        snapshot.db = -20.0;
        snapshot.bins[3] = 42;
        meter.update(snapshot);

        assert_eq!(reader.level_db(), -20.0);
        assert_eq!(reader.snapshot().bins[3], 42);

        meter.clear();
        assert_eq!(reader.level_db(), FLOOR_DB);
    }
}
