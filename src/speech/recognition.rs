//! Recognition events and listening strategies
//!
//! Recognition engines differ in how they survive long sessions. Some run
//! continuously and only need a restart when they end on their own; others
//! must be stopped after each utterance and started again. The session picks
//! one `ListeningStrategy` when it starts and never branches on the host
//! again.

use super::SpeechRecognizer;
use crate::Result;
use std::time::Duration;
use tracing::debug;

/// How the recognition engine is driven
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecognitionMode {
    /// One long-running recognition with multiple final results
    Continuous,
    /// One final result, then the engine ends
    SingleShot,
}

/// Error codes a recognizer can report
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecognitionErrorCode {
    NoSpeech,
    NotAllowed,
    Network,
    Aborted,
    Other,
}

impl RecognitionErrorCode {
    /// Errors after which restarting the engine is pointless
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecognitionErrorCode::NotAllowed)
    }
}

/// Events emitted by a running recognizer
#[derive(Clone, Debug, PartialEq)]
pub enum RecognitionEvent {
    /// Interim text for the utterance in progress; replaces earlier interim text
    Partial(String),
    /// Final text for a completed utterance
    Final(String),
    Error(RecognitionErrorCode),
    /// The engine stopped; may arrive repeatedly and unprompted
    Ended,
}

/// What the host recognizer can do
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    pub speech_recognition: bool,
    /// Continuous recognition stays stable for a whole session
    pub continuous_safe: bool,
}

/// Platform-specific restart policy
pub trait ListeningStrategy: Send {
    fn name(&self) -> &'static str;

    fn mode(&self) -> RecognitionMode;

    /// An utterance was handed to the generator; input is now suppressed
    fn on_utterance_captured(&self, recognizer: &mut dyn SpeechRecognizer) -> Result<()>;

    /// The session is listening again
    fn on_resume(&self, recognizer: &mut dyn SpeechRecognizer) -> Result<()>;

    /// The engine ended on its own. Returns the delay before restarting it,
    /// or `None` to leave it stopped.
    fn on_recognizer_ended(&self, listening: bool) -> Option<Duration>;
}

/// Keep one engine running for the whole session
#[derive(Debug)]
pub struct ContinuousListening {
    restart_delay: Duration,
}

impl ContinuousListening {
    pub fn new(restart_delay: Duration) -> Self {
        Self { restart_delay }
    }
}

impl ListeningStrategy for ContinuousListening {
    fn name(&self) -> &'static str {
        "continuous"
    }

    fn mode(&self) -> RecognitionMode {
        RecognitionMode::Continuous
    }

    fn on_utterance_captured(&self, _recognizer: &mut dyn SpeechRecognizer) -> Result<()> {
        // engine keeps running; the session gate drops input
        Ok(())
    }

    fn on_resume(&self, recognizer: &mut dyn SpeechRecognizer) -> Result<()> {
        if !recognizer.is_running() {
            debug!("Continuous recognizer not running on resume, starting it");
            recognizer.start(self.mode())?;
        }
        Ok(())
    }

    fn on_recognizer_ended(&self, _listening: bool) -> Option<Duration> {
        Some(self.restart_delay)
    }
}

/// Stop the engine after each utterance, start it again for the next
#[derive(Debug)]
pub struct SingleShotListening {
    restart_delay: Duration,
}

impl SingleShotListening {
    pub fn new(restart_delay: Duration) -> Self {
        Self { restart_delay }
    }
}

impl ListeningStrategy for SingleShotListening {
    fn name(&self) -> &'static str {
        "single-shot"
    }

    fn mode(&self) -> RecognitionMode {
        RecognitionMode::SingleShot
    }

    fn on_utterance_captured(&self, recognizer: &mut dyn SpeechRecognizer) -> Result<()> {
        recognizer.stop();
        Ok(())
    }

    fn on_resume(&self, recognizer: &mut dyn SpeechRecognizer) -> Result<()> {
        if !recognizer.is_running() {
            recognizer.start(self.mode())?;
        }
        Ok(())
    }

    fn on_recognizer_ended(&self, listening: bool) -> Option<Duration> {
        listening.then_some(self.restart_delay)
    }
}

/// Choose the strategy once, from the host capability check
pub fn select_strategy(
    capabilities: &HostCapabilities,
    restart_delay: Duration,
) -> Box<dyn ListeningStrategy> {
    if capabilities.continuous_safe {
        Box::new(ContinuousListening::new(restart_delay))
    } else {
        Box::new(SingleShotListening::new(restart_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Sender;

    #[derive(Default)]
    struct FakeRecognizer {
        running: bool,
        starts: Vec<RecognitionMode>,
        stops: usize,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn capabilities(&self) -> HostCapabilities {
            HostCapabilities {
                speech_recognition: true,
                continuous_safe: true,
            }
        }

        fn attach(&mut self, _events: Sender<RecognitionEvent>, _language: &str) {}

        fn start(&mut self, mode: RecognitionMode) -> Result<()> {
            self.running = true;
            self.starts.push(mode);
            Ok(())
        }

        fn stop(&mut self) {
            self.running = false;
            self.stops += 1;
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn test_select_strategy_from_capabilities() {
        let desktop = HostCapabilities {
            speech_recognition: true,
            continuous_safe: true,
        };
        let mobile = HostCapabilities {
            speech_recognition: true,
            continuous_safe: false,
        };
        assert_eq!(select_strategy(&desktop, DELAY).name(), "continuous");
        assert_eq!(select_strategy(&mobile, DELAY).name(), "single-shot");
    }

    #[test]
    fn test_continuous_keeps_engine_running() {
        let strategy = ContinuousListening::new(DELAY);
        let mut recognizer = FakeRecognizer::default();
        recognizer.start(strategy.mode()).unwrap();

        strategy.on_utterance_captured(&mut recognizer).unwrap();
        assert!(recognizer.is_running());
        strategy.on_resume(&mut recognizer).unwrap();
        assert_eq!(recognizer.starts.len(), 1);

        // restarts even while the agent is talking
        assert_eq!(strategy.on_recognizer_ended(false), Some(DELAY));
    }

    #[test]
    fn test_single_shot_restarts_per_utterance() {
        let strategy = SingleShotListening::new(DELAY);
        let mut recognizer = FakeRecognizer::default();
        recognizer.start(strategy.mode()).unwrap();

        strategy.on_utterance_captured(&mut recognizer).unwrap();
        assert!(!recognizer.is_running());
        assert_eq!(recognizer.stops, 1);

        strategy.on_resume(&mut recognizer).unwrap();
        assert!(recognizer.is_running());
        assert_eq!(
            recognizer.starts,
            vec![RecognitionMode::SingleShot, RecognitionMode::SingleShot]
        );

        assert_eq!(strategy.on_recognizer_ended(true), Some(DELAY));
        assert_eq!(strategy.on_recognizer_ended(false), None);
    }

    #[test]
    fn test_not_allowed_is_fatal() {
        assert!(RecognitionErrorCode::NotAllowed.is_fatal());
        assert!(!RecognitionErrorCode::NoSpeech.is_fatal());
        assert!(!RecognitionErrorCode::Network.is_fatal());
    }
}
