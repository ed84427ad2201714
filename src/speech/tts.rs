//! Text-to-speech with sherpa-rs VITS models and rodio playback
//!
//! Synthesis and playback run on one worker thread that owns the model and
//! the output stream. `speak` cancels whatever is playing before queueing the
//! next utterance; a cancelled utterance never reports completion.

use super::{SpeechSynthesizer, SynthesisEvent, Utterance, VoiceInfo};
use crate::{PitchError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const PLAYBACK_POLL: Duration = Duration::from_millis(20);

/// Model files inside a VITS model directory
#[derive(Clone, Debug)]
pub struct VitsModelFiles {
    pub model: PathBuf,
    pub tokens: PathBuf,
    pub lexicon: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl VitsModelFiles {
    /// Locate `model.onnx` (or the first `.onnx` file), `tokens.txt`,
    /// `lexicon.txt` and `espeak-ng-data` in `dir`
    pub fn discover(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(PitchError::ConfigError(format!(
                "TTS model directory not found: {:?}",
                dir
            )));
        }

        let model = {
            let named = dir.join("model.onnx");
            if named.exists() {
                named
            } else {
                std::fs::read_dir(dir)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .find(|p| p.extension().is_some_and(|ext| ext == "onnx"))
                    .ok_or_else(|| {
                        PitchError::ConfigError(format!("No .onnx model in {:?}", dir))
                    })?
            }
        };

        let tokens = dir.join("tokens.txt");
        if !tokens.exists() {
            return Err(PitchError::ConfigError(format!(
                "tokens.txt missing from {:?}",
                dir
            )));
        }

        let lexicon = Some(dir.join("lexicon.txt")).filter(|p| p.exists());
        let data_dir = Some(dir.join("espeak-ng-data")).filter(|p| p.is_dir());

        Ok(Self {
            model,
            tokens,
            lexicon,
            data_dir,
        })
    }
}

enum TtsCommand {
    Speak(Utterance, u64),
    Shutdown,
}

/// VITS synthesizer playing through the default output device
pub struct SherpaSynthesizer {
    voices: Vec<VoiceInfo>,
    command_tx: Sender<TtsCommand>,
    events: Arc<Mutex<Option<Sender<SynthesisEvent>>>>,
    generation: Arc<AtomicU64>,
    active_sink: Arc<Mutex<Option<Arc<Sink>>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SherpaSynthesizer {
    pub fn new(model_dir: &Path, voices: Vec<VoiceInfo>) -> Result<Self> {
        let files = VitsModelFiles::discover(model_dir)?;
        info!("Loading VITS model from: {:?}", files.model);

        let path_string = |p: &Path| p.to_string_lossy().into_owned();
        let vits_config = VitsTtsConfig {
            model: path_string(&files.model),
            tokens: path_string(&files.tokens),
            lexicon: files.lexicon.as_deref().map(path_string).unwrap_or_default(),
            data_dir: files.data_dir.as_deref().map(path_string).unwrap_or_default(),
            length_scale: 1.0,
            ..Default::default()
        };

        let (command_tx, command_rx) = unbounded();
        let events = Arc::new(Mutex::new(None));
        let generation = Arc::new(AtomicU64::new(0));
        let active_sink = Arc::new(Mutex::new(None));

        let worker = {
            let events = Arc::clone(&events);
            let generation = Arc::clone(&generation);
            let active_sink = Arc::clone(&active_sink);
            thread::Builder::new()
                .name("tts-playback".into())
                .spawn(move || {
                    playback_worker(vits_config, command_rx, events, generation, active_sink)
                })
                .map_err(|e| {
                    PitchError::SynthesisError(format!("Failed to spawn TTS worker: {}", e))
                })?
        };

        Ok(Self {
            voices,
            command_tx,
            events,
            generation,
            active_sink,
            worker: Some(worker),
        })
    }
}

impl SpeechSynthesizer for SherpaSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn attach(&mut self, events: Sender<SynthesisEvent>) {
        *self.events.lock() = Some(events);
    }

    fn speak(&mut self, utterance: Utterance) -> Result<()> {
        self.cancel();
        let generation = self.generation.load(Ordering::SeqCst);
        debug!("Queueing utterance {} ({} chars)", utterance.id, utterance.text.len());
        self.command_tx
            .send(TtsCommand::Speak(utterance, generation))
            .map_err(|e| PitchError::ChannelError(format!("TTS worker gone: {}", e)))
    }

    fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(sink) = self.active_sink.lock().take() {
            sink.stop();
        }
    }
}

impl Drop for SherpaSynthesizer {
    fn drop(&mut self) {
        self.cancel();
        let _ = self.command_tx.send(TtsCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("TTS worker panicked during shutdown");
            }
        }
    }
}

fn playback_worker(
    vits_config: VitsTtsConfig,
    command_rx: Receiver<TtsCommand>,
    events: Arc<Mutex<Option<Sender<SynthesisEvent>>>>,
    generation: Arc<AtomicU64>,
    active_sink: Arc<Mutex<Option<Arc<Sink>>>>,
) {
    // the model and output stream stay on this thread
    let mut tts = VitsTts::new(vits_config);
    let output = OutputStream::try_default();
    if let Err(e) = &output {
        error!("No audio output device: {}", e);
    }

    let emit = |event: SynthesisEvent| {
        if let Some(tx) = events.lock().as_ref() {
            let _ = tx.send(event);
        }
    };

    while let Ok(command) = command_rx.recv() {
        let (utterance, issued_at) = match command {
            TtsCommand::Speak(utterance, issued_at) => (utterance, issued_at),
            TtsCommand::Shutdown => break,
        };
        let is_current = || generation.load(Ordering::SeqCst) == issued_at;
        if !is_current() {
            continue;
        }

        let handle = match &output {
            Ok((_stream, handle)) => handle,
            Err(e) => {
                emit(SynthesisEvent::Failed(utterance.id, e.to_string()));
                continue;
            }
        };

        let text = normalize_for_speech(&utterance.text);
        if text.is_empty() {
            emit(SynthesisEvent::Finished(utterance.id));
            continue;
        }

        let speaker_id = utterance
            .voice
            .as_ref()
            .and_then(|v| v.speaker_id)
            .unwrap_or(0);
        let audio = match tts.create(&text, speaker_id, utterance.rate) {
            Ok(audio) => audio,
            Err(e) => {
                emit(SynthesisEvent::Failed(utterance.id, format!("Synthesis failed: {}", e)));
                continue;
            }
        };

        let sink = match Sink::try_new(handle) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                emit(SynthesisEvent::Failed(utterance.id, e.to_string()));
                continue;
            }
        };

        // cancelled while synthesizing
        if !is_current() {
            continue;
        }

        sink.append(SamplesBuffer::new(1, audio.sample_rate as u32, audio.samples));
        *active_sink.lock() = Some(Arc::clone(&sink));

        while !sink.empty() && is_current() {
            thread::sleep(PLAYBACK_POLL);
        }

        if is_current() {
            active_sink.lock().take();
            debug!("Utterance {} finished", utterance.id);
            emit(SynthesisEvent::Finished(utterance.id));
        } else {
            sink.stop();
        }
    }

    debug!("TTS worker exiting");
}

/// Expand symbols the VITS front end reads poorly and drop the rest
pub fn normalize_for_speech(text: &str) -> String {
    let mut result = text.to_string();

    for (symbol, spoken) in [
        ("&", " and "),
        ("%", " percent"),
        ("@", " at "),
        ("+", " plus "),
        ("e.g.", "for example"),
        ("i.e.", "that is"),
        ("vs.", "versus"),
    ] {
        result = result.replace(symbol, spoken);
    }

    // "$216,000" reads as "216000 dollars"
    let mut spoken = String::with_capacity(result.len());
    let mut chars = result.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek().is_some_and(|n| n.is_ascii_digit()) {
            let mut amount = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    amount.push(d);
                } else if d != ',' {
                    break;
                }
                chars.next();
            }
            spoken.push_str(&amount);
            spoken.push_str(" dollars");
        } else {
            spoken.push(c);
        }
    }

    spoken
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,!?;:'-\"".contains(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbols() {
        assert_eq!(normalize_for_speech("R&D"), "R and D");
        assert_eq!(normalize_for_speech("30% missed"), "30 percent missed");
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(
            normalize_for_speech("That's $216,000 a year."),
            "That's 216000 dollars a year."
        );
        assert_eq!(normalize_for_speech("$ alone"), "alone");
    }

    #[test]
    fn test_normalize_drops_markup() {
        assert_eq!(normalize_for_speech("**Great** question"), "Great question");
        assert!(normalize_for_speech("   ").is_empty());
    }

    #[test]
    fn test_discover_requires_tokens() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("voice.onnx"), b"").unwrap();
        assert!(VitsModelFiles::discover(dir.path()).is_err());

        std::fs::write(dir.path().join("tokens.txt"), b"").unwrap();
        let files = VitsModelFiles::discover(dir.path()).unwrap();
        assert!(files.model.ends_with("voice.onnx"));
        assert!(files.lexicon.is_none());
        assert!(files.data_dir.is_none());
    }

    #[test]
    fn test_discover_missing_dir() {
        assert!(VitsModelFiles::discover(Path::new("/nonexistent/tts")).is_err());
    }
}
