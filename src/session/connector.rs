//! Voice session connector
//!
//! Runs one spoken conversation between a caller and the agent persona.
//! `start()` resolves a generation model, resets the transcript, starts
//! recognition and speaks the opening line; the turn-taking loop then runs on
//! its own thread until `stop()` or a fatal recognizer error.
//!
//! The loop selects over five sources: commands, recognition events,
//! synthesis completions, microphone blocks and generation replies. Every
//! state change goes through [`SharedSessionState::apply`], which rejects
//! events that do not fit the current state; the loop only performs the
//! effects a legal transition returns.

use super::silence::SilenceDetector;
use super::state::{Effect, SessionEvent, SessionState, SharedSessionState};
use super::transcript::Transcript;
use crate::audio::{LevelAnalyzer, LevelMeter, LevelSnapshot};
use crate::config::{AgentPersona, DeckConfig, SessionConfig};
use crate::llm::prompts::build_system_prompt;
use crate::llm::{LlmError, TextGenerator, Turn};
use crate::speech::{
    select_strategy, select_voice, ListeningStrategy, RecognitionEvent, SpeechBackends,
    SynthesisEvent, Utterance, VoiceInfo,
};
use crate::{PitchError, Result};
use crossbeam_channel::{bounded, never, select, unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Loop tick for guard and restart deadlines
const TICK: Duration = Duration::from_millis(10);

/// Receives every microphone level frame while a call is running
pub type LevelCallback = Box<dyn Fn(&LevelSnapshot) + Send + 'static>;

enum LoopCommand {
    Stop,
}

enum ReplyOutcome {
    Reply(String),
    TimedOut,
    Failed(LlmError),
}

struct GenerationReply {
    request_id: u64,
    outcome: ReplyOutcome,
}

struct PendingRequest {
    id: u64,
    user_text: String,
}

struct ConnectorInner {
    backends: Option<SpeechBackends>,
    worker: Option<JoinHandle<SpeechBackends>>,
    command_tx: Option<Sender<LoopCommand>>,
    starting: bool,
}

/// One voice demo session at a time
pub struct VoiceConnector {
    session: SessionConfig,
    persona: AgentPersona,
    system_prompt: String,
    state: SharedSessionState,
    transcript: Arc<RwLock<Transcript>>,
    meter: LevelMeter,
    runtime: Arc<Runtime>,
    generator: Arc<dyn TextGenerator>,
    inner: Mutex<ConnectorInner>,
    /// Bumped by every `stop()` so an in-flight `start()` can tell it was cancelled
    epoch: AtomicU64,
}

impl VoiceConnector {
    pub fn new(
        config: &DeckConfig,
        backends: SpeechBackends,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("voice-generation")
            .enable_all()
            .build()
            .map_err(|e| PitchError::SessionError(format!("Failed to build runtime: {}", e)))?;

        Ok(Self {
            session: config.session.clone(),
            persona: config.agent.clone(),
            system_prompt: build_system_prompt(&config.agent, &config.client),
            state: SharedSessionState::new(),
            transcript: Arc::new(RwLock::new(Transcript::new())),
            meter: LevelMeter::new(),
            runtime: Arc::new(runtime),
            generator,
            inner: Mutex::new(ConnectorInner {
                backends: Some(backends),
                worker: None,
                command_tx: None,
                starting: false,
            }),
            epoch: AtomicU64::new(0),
        })
    }

    /// Start a call
    ///
    /// Fails without leaving anything running when recognition is not
    /// available, no model can be resolved, or recognition cannot start.
    /// A missing or denied microphone only disables level capture.
    pub fn start<F>(&self, on_level: F) -> Result<()>
    where
        F: Fn(&LevelSnapshot) + Send + 'static,
    {
        let (finished, epoch) = {
            let mut inner = self.inner.lock();
            if inner.starting || self.state.get().is_active() {
                return Err(PitchError::SessionError(
                    "A call is already in progress".into(),
                ));
            }
            inner.starting = true;
            inner.command_tx = None;
            (inner.worker.take(), self.epoch.load(Ordering::SeqCst))
        };
        // join outside the lock so a concurrent stop() is never held up
        if let Some(worker) = finished {
            Self::reclaim(&self.inner, worker);
        }

        let mut backends = {
            let mut inner = self.inner.lock();
            let Some(backends) = inner.backends.take() else {
                inner.starting = false;
                return Err(PitchError::SessionError(
                    "Speech backends were lost by a previous call".into(),
                ));
            };

            if !backends.recognizer.capabilities().speech_recognition {
                inner.backends = Some(backends);
                inner.starting = false;
                let err = PitchError::CapabilityMissing(
                    "speech recognition is not available on this host".into(),
                );
                self.state.fail(err.user_message());
                return Err(err);
            }
            backends
        };

        info!(persona = %self.persona.name, "Starting voice session");

        if let Err(e) = self.resolve_model() {
            let mut inner = self.inner.lock();
            inner.starting = false;
            inner.backends = Some(backends);
            if self.epoch.load(Ordering::SeqCst) == epoch {
                self.state.fail(e.user_message());
            }
            return Err(e);
        }

        let mut inner = self.inner.lock();
        inner.starting = false;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            info!("Call was ended while connecting");
            inner.backends = Some(backends);
            return Err(PitchError::CallCancelled(
                "the call was ended before it connected".into(),
            ));
        }

        let (command_tx, command_rx) = unbounded();
        let (recognition_tx, recognition_rx) = unbounded();
        let (synthesis_tx, synthesis_rx) = unbounded();
        let (reply_tx, reply_rx) = unbounded();
        let (audio_tx, audio_rx) = bounded(self.session.channel_buffer_size);

        let mut mic_rate = 0;
        let audio_rx = match backends.microphone.as_mut() {
            Some(mic) => match mic.start(audio_tx) {
                Ok(()) => {
                    mic_rate = mic.sample_rate();
                    audio_rx
                }
                Err(e) => {
                    warn!("Continuing without microphone levels: {}", e);
                    never()
                }
            },
            None => {
                debug!("No microphone source, level capture disabled");
                never()
            }
        };

        self.transcript
            .write()
            .reset(self.system_prompt.clone(), self.persona.first_message.clone());

        let capabilities = backends.recognizer.capabilities();
        let strategy = select_strategy(&capabilities, self.session.restart_delay());
        info!(strategy = strategy.name(), "Listening strategy selected");

        backends
            .recognizer
            .attach(recognition_tx, &self.session.language);
        backends.synthesizer.attach(synthesis_tx);

        if let Err(e) = backends.recognizer.start(strategy.mode()) {
            error!("Recognition failed to start: {}", e);
            if let Some(mic) = backends.microphone.as_mut() {
                mic.stop();
            }
            inner.backends = Some(backends);
            self.state.fail(e.user_message());
            return Err(e);
        }

        let voice = select_voice(
            &backends.synthesizer.voices(),
            self.persona.voice_gender,
            self.persona.voice_name.as_deref(),
        );
        if let Some(v) = &voice {
            debug!(voice = %v.name, "Voice selected");
        }

        let greeting = match self.state.apply(SessionEvent::Start {
            greeting: self.persona.first_message.clone(),
        }) {
            Ok(transition) => transition.effects,
            Err(e) => {
                backends.recognizer.stop();
                if let Some(mic) = backends.microphone.as_mut() {
                    mic.stop();
                }
                inner.backends = Some(backends);
                return Err(PitchError::SessionError(e.to_string()));
            }
        };

        let session_loop = SessionLoop {
            config: self.session.clone(),
            backends,
            strategy,
            state: self.state.clone(),
            transcript: Arc::clone(&self.transcript),
            generator: Arc::clone(&self.generator),
            runtime: Arc::clone(&self.runtime),
            voice,
            meter: self.meter.clone(),
            analyzer: LevelAnalyzer::new(),
            silence: SilenceDetector::new(
                self.session.silence_threshold_db,
                self.session.silence_hold(),
            ),
            on_level: Box::new(on_level),
            mic_rate,
            current_utterance: None,
            pending: None,
            request_counter: 0,
            guard_deadline: None,
            restart_deadline: None,
            reply_tx,
        };
        let channels = LoopChannels {
            command_rx,
            recognition_rx,
            synthesis_rx,
            audio_rx,
            reply_rx,
        };

        let worker = thread::Builder::new()
            .name("voice-session".into())
            .spawn(move || session_loop.run(channels, greeting));

        match worker {
            Ok(handle) => {
                inner.worker = Some(handle);
                inner.command_tx = Some(command_tx);
                Ok(())
            }
            Err(e) => {
                // the loop and its backends are gone with the failed spawn
                self.state.fail("Connection Failed");
                Err(PitchError::SessionError(format!(
                    "Failed to spawn session thread: {}",
                    e
                )))
            }
        }
    }

    /// End the call; safe to call any number of times, from any state
    ///
    /// Returns without waiting for the session thread. Its backends are
    /// taken back by the next `start()` or by [`VoiceConnector::shutdown`].
    pub fn stop(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(tx) = self.inner.lock().command_tx.take() {
            let _ = tx.send(LoopCommand::Stop);
        }

        if let Err(e) = self.state.apply(SessionEvent::Stop) {
            debug!("Stop: {}", e);
        }
        self.meter.clear();
    }

    /// Stop and wait for the session thread to release its backends
    pub fn shutdown(&self) {
        self.stop();
        let worker = self.inner.lock().worker.take();
        if let Some(worker) = worker {
            Self::reclaim(&self.inner, worker);
        }
        self.meter.clear();
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn status_text(&self) -> &'static str {
        self.state.status_text()
    }

    /// User-facing message for the last failure, if any
    pub fn last_error(&self) -> Option<String> {
        self.state.error()
    }

    pub fn transcript(&self) -> Vec<Turn> {
        self.transcript.read().turns().to_vec()
    }

    pub fn level_meter(&self) -> LevelMeter {
        self.meter.clone()
    }

    pub fn persona(&self) -> &AgentPersona {
        &self.persona
    }

    fn resolve_model(&self) -> Result<String> {
        let generator = Arc::clone(&self.generator);
        let timeout = self.session.resolve_timeout();
        let resolved = self
            .runtime
            .block_on(async move { tokio::time::timeout(timeout, generator.resolve_model()).await });

        match resolved {
            Ok(Ok(model)) => {
                info!(model = %model, "Generation model ready");
                Ok(model)
            }
            Ok(Err(e)) => {
                error!(kind = ?e.kind, "Model resolution failed: {}", e.message);
                Err(e.into())
            }
            Err(_) => {
                error!("Model resolution timed out after {:?}", timeout);
                Err(PitchError::ModelUnavailable("model resolution timed out".into()))
            }
        }
    }

    /// Wait for a finished or stopping loop and take back its backends
    fn reclaim(inner: &Mutex<ConnectorInner>, worker: JoinHandle<SpeechBackends>) {
        match worker.join() {
            Ok(backends) => inner.lock().backends = Some(backends),
            Err(_) => error!("Voice session thread panicked"),
        }
    }
}

impl Drop for VoiceConnector {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct LoopChannels {
    command_rx: Receiver<LoopCommand>,
    recognition_rx: Receiver<RecognitionEvent>,
    synthesis_rx: Receiver<SynthesisEvent>,
    audio_rx: Receiver<Vec<f32>>,
    reply_rx: Receiver<GenerationReply>,
}

struct SessionLoop {
    config: SessionConfig,
    backends: SpeechBackends,
    strategy: Box<dyn ListeningStrategy>,
    state: SharedSessionState,
    transcript: Arc<RwLock<Transcript>>,
    generator: Arc<dyn TextGenerator>,
    runtime: Arc<Runtime>,
    voice: Option<VoiceInfo>,
    meter: LevelMeter,
    analyzer: LevelAnalyzer,
    silence: SilenceDetector,
    on_level: LevelCallback,
    mic_rate: u32,
    current_utterance: Option<Uuid>,
    pending: Option<PendingRequest>,
    request_counter: u64,
    guard_deadline: Option<Instant>,
    restart_deadline: Option<Instant>,
    reply_tx: Sender<GenerationReply>,
}

impl SessionLoop {
    fn run(mut self, channels: LoopChannels, greeting: Vec<Effect>) -> SpeechBackends {
        let LoopChannels {
            command_rx,
            mut recognition_rx,
            mut synthesis_rx,
            mut audio_rx,
            reply_rx,
        } = channels;

        debug!("Voice session loop starting");
        self.run_effects(greeting);

        let mut fatal: Option<String> = None;

        loop {
            select! {
                recv(command_rx) -> cmd => match cmd {
                    Ok(LoopCommand::Stop) | Err(_) => break,
                },

                recv(recognition_rx) -> event => match event {
                    Ok(event) => {
                        if let Some(reason) = self.on_recognition(event) {
                            fatal = Some(reason);
                            break;
                        }
                    }
                    Err(_) => {
                        warn!("Recognizer event channel closed");
                        recognition_rx = never();
                    }
                },

                recv(synthesis_rx) -> event => match event {
                    Ok(event) => self.on_synthesis(event),
                    Err(_) => {
                        warn!("Synthesizer event channel closed");
                        synthesis_rx = never();
                    }
                },

                recv(audio_rx) -> samples => match samples {
                    Ok(samples) => self.on_audio(&samples),
                    Err(_) => {
                        debug!("Microphone stream ended");
                        audio_rx = never();
                    }
                },

                recv(reply_rx) -> reply => {
                    if let Ok(reply) = reply {
                        self.on_reply(reply);
                    }
                },

                default(TICK) => {}
            }

            self.on_tick(Instant::now());
        }

        self.teardown();
        match fatal {
            Some(reason) => self.state.fail(reason),
            None => {
                if let Err(e) = self.state.apply(SessionEvent::Stop) {
                    debug!("Stop on exit: {}", e);
                }
            }
        }

        debug!("Voice session loop exiting");
        self.backends
    }

    /// Returns a reason when the session cannot continue
    fn on_recognition(&mut self, event: RecognitionEvent) -> Option<String> {
        match event {
            RecognitionEvent::Partial(text) => {
                if self.state.get().accepts_input() {
                    self.silence.observe_text(&text, Instant::now());
                }
            }
            RecognitionEvent::Final(text) => {
                self.silence.clear();
                self.submit_utterance(&text);
            }
            RecognitionEvent::Error(code) if code.is_fatal() => {
                error!(?code, "Recognition cannot continue");
                return Some(PitchError::PermissionDenied(format!("{:?}", code)).user_message());
            }
            RecognitionEvent::Error(code) => {
                debug!(?code, "Recognition error");
            }
            RecognitionEvent::Ended => {
                let listening = self.state.get().accepts_input();
                self.restart_deadline = self
                    .strategy
                    .on_recognizer_ended(listening)
                    .map(|delay| Instant::now() + delay);
                debug!(listening, "Recognizer ended");
            }
        }
        None
    }

    fn on_synthesis(&mut self, event: SynthesisEvent) {
        let (id, failure) = match event {
            SynthesisEvent::Finished(id) => (id, None),
            SynthesisEvent::Failed(id, message) => (id, Some(message)),
        };

        if self.current_utterance != Some(id) {
            debug!(%id, "Ignoring completion of a superseded utterance");
            return;
        }
        if let Some(message) = failure {
            error!(%id, "Speech synthesis failed: {}", message);
        }
        self.speech_finished();
    }

    fn on_audio(&mut self, samples: &[f32]) {
        let snapshot = self.analyzer.push(samples);
        (self.on_level)(&snapshot);
        let level = snapshot.db;
        self.meter.update(snapshot);

        if !self.state.get().accepts_input() {
            return;
        }

        self.backends.recognizer.accept_audio(samples, self.mic_rate);
        if let Some(text) = self.silence.observe_level(level, Instant::now()) {
            debug!(level_db = level, "Silence ended the utterance");
            self.submit_utterance(&text);
        }
    }

    fn on_reply(&mut self, reply: GenerationReply) {
        if self.pending.as_ref().map(|p| p.id) != Some(reply.request_id) {
            debug!(request_id = reply.request_id, "Ignoring stale generation reply");
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };

        let event = match reply.outcome {
            ReplyOutcome::Reply(text) => {
                let result = self.state.apply(SessionEvent::ReplyReady { text: text.clone() });
                if let Ok(transition) = result {
                    let mut transcript = self.transcript.write();
                    transcript.commit_exchange(pending.user_text, text);
                    debug!(
                        exchanges = transcript.exchanges(),
                        turns = transcript.len(),
                        "Exchange committed"
                    );
                    drop(transcript);
                    self.run_effects(transition.effects);
                }
                return;
            }
            ReplyOutcome::TimedOut => {
                warn!("Generation timed out, speaking the fallback");
                SessionEvent::ReplyTimedOut {
                    fallback: self.config.fallback_reply.clone(),
                }
            }
            ReplyOutcome::Failed(e) => {
                warn!(kind = ?e.kind, "Dropping exchange: {}", e.message);
                if e.invalidates_model() {
                    self.generator.invalidate_model();
                }
                SessionEvent::ReplyFailed
            }
        };

        self.apply(event);
    }

    fn on_tick(&mut self, now: Instant) {
        if self.guard_deadline.is_some_and(|deadline| now >= deadline) {
            self.guard_deadline = None;
            self.apply(SessionEvent::GuardElapsed);
        }

        if self.restart_deadline.is_some_and(|deadline| now >= deadline) {
            self.restart_deadline = None;
            if self.state.get().is_active() && !self.backends.recognizer.is_running() {
                debug!("Restarting recognizer");
                if let Err(e) = self.backends.recognizer.start(self.strategy.mode()) {
                    warn!("Recognizer restart failed: {}", e);
                }
            }
        }

        if self.state.get().accepts_input() {
            if let Some(text) = self.silence.poll(now) {
                self.submit_utterance(&text);
            }
        }
    }

    fn submit_utterance(&mut self, text: &str) {
        let text = text.trim();
        if text.chars().count() < self.config.min_utterance_chars {
            debug!("Ignoring short utterance {:?}", text);
            return;
        }
        info!(chars = text.len(), "User utterance captured");
        self.apply(SessionEvent::UtteranceEnded {
            text: text.to_string(),
        });
    }

    fn speech_finished(&mut self) {
        self.current_utterance = None;
        self.apply(SessionEvent::SpeechFinished);
    }

    fn apply(&mut self, event: SessionEvent) {
        match self.state.apply(event) {
            Ok(transition) => self.run_effects(transition.effects),
            Err(e) => debug!("Rejected: {}", e),
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Speak(text) => self.speak(text),
                Effect::RequestReply(text) => self.request_reply(text),
                Effect::SuppressInput => {
                    self.silence.clear();
                    if let Err(e) = self
                        .strategy
                        .on_utterance_captured(self.backends.recognizer.as_mut())
                    {
                        warn!("Suppressing recognition failed: {}", e);
                    }
                }
                Effect::ScheduleGuard => {
                    self.guard_deadline = Some(Instant::now() + self.config.guard_delay());
                }
                Effect::ResumeListening => {
                    self.silence.clear();
                    if let Err(e) = self.strategy.on_resume(self.backends.recognizer.as_mut()) {
                        warn!("Resuming recognition failed: {}", e);
                    }
                }
                Effect::StopRecognition => {
                    self.restart_deadline = None;
                    self.backends.recognizer.stop();
                }
                Effect::CancelSpeech => {
                    self.guard_deadline = None;
                    self.current_utterance = None;
                    self.backends.synthesizer.cancel();
                }
                Effect::ReleaseAudio => {
                    if let Some(mic) = self.backends.microphone.as_mut() {
                        mic.stop();
                    }
                    self.analyzer.reset();
                    self.meter.clear();
                }
            }
        }
    }

    fn speak(&mut self, text: String) {
        let utterance = Utterance::new(text, self.voice.clone(), self.config.speech_rate);
        let id = utterance.id;
        self.current_utterance = Some(id);
        debug!(%id, "Speaking");

        if let Err(e) = self.backends.synthesizer.speak(utterance) {
            // carry on as if it had been spoken so the call does not stall
            error!(%id, "Speech synthesis failed: {}", e);
            self.speech_finished();
        }
    }

    fn request_reply(&mut self, user_text: String) {
        self.request_counter += 1;
        let request_id = self.request_counter;
        let turns = self.transcript.read().request_with(&user_text);
        self.pending = Some(PendingRequest {
            id: request_id,
            user_text,
        });

        let generator = Arc::clone(&self.generator);
        let reply_tx = self.reply_tx.clone();
        let timeout = self.config.generation_timeout();
        debug!(request_id, turns = turns.len(), "Requesting reply");

        self.runtime.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, generator.generate(&turns)).await {
                Ok(Ok(text)) => ReplyOutcome::Reply(text),
                Ok(Err(e)) => ReplyOutcome::Failed(e),
                Err(_) => ReplyOutcome::TimedOut,
            };
            let _ = reply_tx.send(GenerationReply {
                request_id,
                outcome,
            });
        });
    }

    fn teardown(&mut self) {
        self.pending = None;
        self.silence.clear();
        self.run_effects(vec![
            Effect::StopRecognition,
            Effect::CancelSpeech,
            Effect::ReleaseAudio,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::rms_db;

    #[test]
    fn test_rms_of_quiet_block_is_below_default_threshold() {
        let config = SessionConfig::default();
        let quiet = vec![0.0005f32; 480];
        assert!(rms_db(&quiet) < config.silence_threshold_db);
        let speech = vec![0.1f32; 480];
        assert!(rms_db(&speech) > config.silence_threshold_db);
    }
}
