//! Offline speech recognition with Whisper
//!
//! Microphone blocks arrive through `accept_audio`, are resampled to 16 kHz
//! and segmented into utterances with Silero VAD. Each finished utterance is
//! transcribed on the recognition thread and reported as a final result.

use super::recognition::{HostCapabilities, RecognitionErrorCode, RecognitionEvent, RecognitionMode};
use super::SpeechRecognizer;
use crate::audio::AudioResampler;
use crate::{PitchError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use voice_activity_detector::VoiceActivityDetector as VadDetector;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

pub const WHISPER_SAMPLE_RATE: u32 = 16000;
const VAD_CHUNK: usize = 512;
const SPEECH_THRESHOLD: f32 = 0.5;
/// Quiet VAD chunks that close an utterance (about 640 ms)
const TRAILING_SILENCE_CHUNKS: usize = 20;
/// Utterances are flushed once they reach 30 s, Whisper's window
const MAX_UTTERANCE_SAMPLES: usize = WHISPER_SAMPLE_RATE as usize * 30;
/// Less voiced audio than this is a click, not speech (250 ms)
const MIN_VOICED_SAMPLES: usize = WHISPER_SAMPLE_RATE as usize / 4;

enum WorkerMessage {
    Audio(Vec<f32>, u32),
    Stop,
}

/// Splits a stream of VAD-labelled chunks into utterances
#[derive(Debug, Default)]
pub struct UtteranceSegmenter {
    speech: Vec<f32>,
    voiced: usize,
    trailing_silence: usize,
}

impl UtteranceSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns a completed utterance when one closes
    pub fn push(&mut self, chunk: &[f32], is_speech: bool) -> Option<Vec<f32>> {
        if is_speech {
            self.speech.extend_from_slice(chunk);
            self.voiced += chunk.len();
            self.trailing_silence = 0;
            if self.speech.len() >= MAX_UTTERANCE_SAMPLES {
                return self.take();
            }
            return None;
        }

        if self.speech.is_empty() {
            return None;
        }

        // keep a little trailing audio so word endings survive
        self.speech.extend_from_slice(chunk);
        self.trailing_silence += 1;
        if self.trailing_silence >= TRAILING_SILENCE_CHUNKS {
            return self.take();
        }
        None
    }

    pub fn is_in_speech(&self) -> bool {
        !self.speech.is_empty()
    }

    pub fn reset(&mut self) {
        self.speech.clear();
        self.voiced = 0;
        self.trailing_silence = 0;
    }

    fn take(&mut self) -> Option<Vec<f32>> {
        let voiced = std::mem::take(&mut self.voiced);
        self.trailing_silence = 0;
        let utterance = std::mem::take(&mut self.speech);
        (voiced >= MIN_VOICED_SAMPLES).then_some(utterance)
    }
}

/// Whisper-backed `SpeechRecognizer`
pub struct WhisperRecognizer {
    context: Arc<WhisperContext>,
    events: Option<Sender<RecognitionEvent>>,
    language: String,
    audio_tx: Option<Sender<WorkerMessage>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", model_path);

        if !model_path.exists() {
            return Err(PitchError::ConfigError(format!(
                "Model file not found: {:?}",
                model_path
            )));
        }

        let path = model_path
            .to_str()
            .ok_or_else(|| PitchError::ConfigError("Invalid model path".to_string()))?;
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                PitchError::RecognitionError(format!("Failed to load Whisper model: {:?}", e))
            })?;

        info!("Whisper model loaded successfully");

        Ok(Self {
            context: Arc::new(context),
            events: None,
            language: "en".to_string(),
            audio_tx: None,
            worker: None,
        })
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Whisper worker panicked");
            }
        }
    }
}

/// Whisper takes bare language codes: "en-US" becomes "en"
pub fn whisper_language(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or("en")
        .to_ascii_lowercase()
}

impl SpeechRecognizer for WhisperRecognizer {
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities {
            speech_recognition: true,
            continuous_safe: true,
        }
    }

    fn attach(&mut self, events: Sender<RecognitionEvent>, language: &str) {
        self.events = Some(events);
        self.language = whisper_language(language);
    }

    fn start(&mut self, mode: RecognitionMode) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // a single-shot worker that ended on its own
        self.audio_tx = None;
        self.join_worker();

        let events = self
            .events
            .clone()
            .ok_or_else(|| PitchError::SessionError("Recognizer started before attach".into()))?;

        let vad = VadDetector::builder()
            .sample_rate(WHISPER_SAMPLE_RATE as i32)
            .chunk_size(VAD_CHUNK)
            .build()
            .map_err(|e| {
                PitchError::AudioProcessingError(format!("Failed to create VAD: {:?}", e))
            })?;

        let (audio_tx, audio_rx) = bounded(256);
        let context = Arc::clone(&self.context);
        let language = self.language.clone();

        let worker = thread::Builder::new()
            .name("whisper-recognition".into())
            .spawn(move || recognition_worker(context, vad, language, mode, audio_rx, events))
            .map_err(|e| PitchError::RecognitionError(format!("Failed to spawn worker: {}", e)))?;

        debug!("Whisper recognition started ({:?})", mode);
        self.audio_tx = Some(audio_tx);
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(tx) = self.audio_tx.take() {
            let _ = tx.send(WorkerMessage::Stop);
        }
        self.join_worker();
    }

    fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn accept_audio(&mut self, samples: &[f32], sample_rate: u32) {
        if let Some(tx) = &self.audio_tx {
            // a full queue means transcription is behind; dropping keeps latency bounded
            let _ = tx.try_send(WorkerMessage::Audio(samples.to_vec(), sample_rate));
        }
    }
}

impl Drop for WhisperRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn recognition_worker(
    context: Arc<WhisperContext>,
    mut vad: VadDetector,
    language: String,
    mode: RecognitionMode,
    audio_rx: Receiver<WorkerMessage>,
    events: Sender<RecognitionEvent>,
) {
    let mut resampler: Option<AudioResampler> = None;
    let mut pending: Vec<f32> = Vec::with_capacity(VAD_CHUNK * 4);
    let mut segmenter = UtteranceSegmenter::new();

    loop {
        let (samples, rate) = match audio_rx.recv_timeout(Duration::from_secs(1)) {
            Ok(WorkerMessage::Audio(samples, rate)) => (samples, rate),
            Ok(WorkerMessage::Stop) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => continue,
        };

        if resampler.as_ref().map(|r| r.input_rate()) != Some(rate) {
            match AudioResampler::new(rate, WHISPER_SAMPLE_RATE) {
                Ok(r) => resampler = Some(r),
                Err(e) => {
                    error!("Cannot resample {} Hz input: {}", rate, e);
                    let _ = events.send(RecognitionEvent::Error(RecognitionErrorCode::Other));
                    return;
                }
            }
        }
        let Some(converter) = resampler.as_mut() else {
            continue;
        };
        match converter.push(&samples) {
            Ok(converted) => pending.extend(converted),
            Err(e) => {
                warn!("Dropping audio block: {}", e);
                continue;
            }
        }

        while pending.len() >= VAD_CHUNK {
            let chunk: Vec<f32> = pending.drain(..VAD_CHUNK).collect();
            let probability = vad.predict(chunk.iter().copied());
            let Some(utterance) = segmenter.push(&chunk, probability >= SPEECH_THRESHOLD) else {
                continue;
            };

            match transcribe(&context, &language, &utterance) {
                Ok(text) if !text.is_empty() => {
                    debug!("Recognized: '{}'", text);
                    let _ = events.send(RecognitionEvent::Final(text));
                    if mode == RecognitionMode::SingleShot {
                        let _ = events.send(RecognitionEvent::Ended);
                        return;
                    }
                }
                Ok(_) => {
                    let _ = events.send(RecognitionEvent::Error(RecognitionErrorCode::NoSpeech));
                }
                Err(e) => {
                    error!("Transcription failed: {}", e);
                    let _ = events.send(RecognitionEvent::Error(RecognitionErrorCode::Other));
                }
            }
            vad.reset();
        }
    }
}

fn transcribe(context: &WhisperContext, language: &str, samples: &[f32]) -> Result<String> {
    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_n_threads(4);
    params.set_translate(false);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);
    params.set_language(Some(language));

    let mut state = context.create_state().map_err(|e| {
        PitchError::RecognitionError(format!("Failed to create state: {:?}", e))
    })?;

    state
        .full(params, samples)
        .map_err(|e| PitchError::RecognitionError(format!("Transcription failed: {:?}", e)))?;

    let num_segments = state.full_n_segments().map_err(|e| {
        PitchError::RecognitionError(format!("Failed to get segments: {:?}", e))
    })?;

    let mut text = String::new();
    for i in 0..num_segments {
        let segment = state.full_get_segment_text(i).map_err(|e| {
            PitchError::RecognitionError(format!("Failed to get segment text: {:?}", e))
        })?;
        text.push_str(&segment);
    }

    Ok(strip_annotations(&text))
}

/// Remove Whisper's non-speech markers such as `[BLANK_AUDIO]` or `(music)`
pub fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tags() {
        assert_eq!(whisper_language("en-US"), "en");
        assert_eq!(whisper_language("de_DE"), "de");
        assert_eq!(whisper_language("FR"), "fr");
    }

    #[test]
    fn test_strip_annotations() {
        assert_eq!(strip_annotations(" [BLANK_AUDIO]"), "");
        assert_eq!(strip_annotations(" Hello (coughs) there."), "Hello there.");
    }

    #[test]
    fn test_segmenter_closes_after_trailing_silence() {
        let mut segmenter = UtteranceSegmenter::new();
        let chunk = vec![0.1f32; VAD_CHUNK];
        let quiet = vec![0.0f32; VAD_CHUNK];

        assert!(segmenter.push(&quiet, false).is_none());
        assert!(!segmenter.is_in_speech());

        for _ in 0..10 {
            assert!(segmenter.push(&chunk, true).is_none());
        }
        for _ in 0..TRAILING_SILENCE_CHUNKS - 1 {
            assert!(segmenter.push(&quiet, false).is_none());
        }
        let utterance = segmenter.push(&quiet, false).unwrap();
        assert_eq!(utterance.len(), (10 + TRAILING_SILENCE_CHUNKS) * VAD_CHUNK);
        assert!(!segmenter.is_in_speech());
    }

    #[test]
    fn test_segmenter_drops_clicks() {
        let mut segmenter = UtteranceSegmenter::new();
        let quiet = vec![0.0f32; VAD_CHUNK];
        segmenter.push(&[0.5; 64], true);
        for _ in 0..TRAILING_SILENCE_CHUNKS {
            assert!(segmenter.push(&quiet, false).is_none());
        }
        assert!(!segmenter.is_in_speech());
    }

    #[test]
    fn test_segmenter_caps_long_speech() {
        let mut segmenter = UtteranceSegmenter::new();
        let chunk = vec![0.1f32; VAD_CHUNK];
        let mut flushed = None;
        for _ in 0..(MAX_UTTERANCE_SAMPLES / VAD_CHUNK + 1) {
            if let Some(u) = segmenter.push(&chunk, true) {
                flushed = Some(u);
                break;
            }
        }
        assert!(flushed.unwrap().len() >= MAX_UTTERANCE_SAMPLES);
    }
}
