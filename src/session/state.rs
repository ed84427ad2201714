//! Voice session state machine
//!
//! Five mutually exclusive states and one pure transition function. Every
//! event that does not match a legal transition is rejected, so the session
//! can never be listening and speaking at the same time. Side effects are
//! returned to the caller instead of being performed here.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Where the conversation is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Idle,
    /// The only state that accepts user speech
    Listening,
    /// Waiting for the generated reply
    Thinking,
    Speaking,
    Stopped,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Listening => "listening",
            SessionState::Thinking => "thinking",
            SessionState::Speaking => "speaking",
            SessionState::Stopped => "stopped",
        }
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self, SessionState::Listening)
    }

    /// A call is in progress
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Listening | SessionState::Thinking | SessionState::Speaking
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to the session
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The session was started; the greeting is spoken first
    Start { greeting: String },
    /// End of a user utterance, by final result or silence
    UtteranceEnded { text: String },
    ReplyReady { text: String },
    /// Generation exceeded its deadline
    ReplyTimedOut { fallback: String },
    /// Generation failed; the exchange is dropped
    ReplyFailed,
    /// The current utterance finished playing
    SpeechFinished,
    /// The echo guard after speaking has elapsed
    GuardElapsed,
    Stop,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Start { .. } => "start",
            SessionEvent::UtteranceEnded { .. } => "utterance_ended",
            SessionEvent::ReplyReady { .. } => "reply_ready",
            SessionEvent::ReplyTimedOut { .. } => "reply_timed_out",
            SessionEvent::ReplyFailed => "reply_failed",
            SessionEvent::SpeechFinished => "speech_finished",
            SessionEvent::GuardElapsed => "guard_elapsed",
            SessionEvent::Stop => "stop",
        }
    }
}

/// Work the connector performs after a transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Speak(String),
    RequestReply(String),
    /// Stop feeding recognition results into the conversation
    SuppressInput,
    /// Wait out the echo guard before listening again
    ScheduleGuard,
    ResumeListening,
    StopRecognition,
    CancelSpeech,
    ReleaseAudio,
}

/// Result of a legal transition
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(new_state: SessionState, effects: Vec<Effect>) -> Self {
        Self { new_state, effects }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("illegal transition: {event} while {state}")]
pub struct TransitionError {
    pub state: SessionState,
    pub event: &'static str,
}

/// The transition function
pub fn transition(state: SessionState, event: SessionEvent) -> Result<Transition, TransitionError> {
    use SessionState::*;

    let transition = match (state, event) {
        (Idle | Stopped, SessionEvent::Start { greeting }) => {
            Transition::to(Speaking, vec![Effect::Speak(greeting)])
        }

        (Listening, SessionEvent::UtteranceEnded { text }) => Transition::to(
            Thinking,
            vec![Effect::SuppressInput, Effect::RequestReply(text)],
        ),

        (Thinking, SessionEvent::ReplyReady { text }) => {
            Transition::to(Speaking, vec![Effect::Speak(text)])
        }
        (Thinking, SessionEvent::ReplyTimedOut { fallback }) => {
            Transition::to(Speaking, vec![Effect::Speak(fallback)])
        }
        (Thinking, SessionEvent::ReplyFailed) => {
            Transition::to(Listening, vec![Effect::ResumeListening])
        }

        // stays speaking until the guard elapses so echo is not captured
        (Speaking, SessionEvent::SpeechFinished) => {
            Transition::to(Speaking, vec![Effect::ScheduleGuard])
        }
        (Speaking, SessionEvent::GuardElapsed) => {
            Transition::to(Listening, vec![Effect::ResumeListening])
        }

        (Stopped, SessionEvent::Stop) => Transition::to(Stopped, Vec::new()),
        (_, SessionEvent::Stop) => Transition::to(
            Stopped,
            vec![
                Effect::StopRecognition,
                Effect::CancelSpeech,
                Effect::ReleaseAudio,
            ],
        ),

        (state, event) => {
            return Err(TransitionError {
                state,
                event: event.name(),
            })
        }
    };

    Ok(transition)
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    error: Option<String>,
}

/// Session state shared between the connector worker and the UI
#[derive(Clone, Debug, Default)]
pub struct SharedSessionState {
    inner: Arc<RwLock<Inner>>,
}

impl SharedSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> SessionState {
        self.inner.read().state
    }

    /// Apply an event under one write lock
    pub fn apply(&self, event: SessionEvent) -> Result<Transition, TransitionError> {
        let mut inner = self.inner.write();
        let transition = transition(inner.state, event)?;
        if transition.new_state != inner.state {
            tracing::debug!(from = %inner.state, to = %transition.new_state, "Session transition");
        }
        inner.state = transition.new_state;
        if matches!(transition.new_state, SessionState::Speaking | SessionState::Listening) {
            inner.error = None;
        }
        Ok(transition)
    }

    /// Record a failure that ended (or prevented) the session
    pub fn fail(&self, message: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.state = SessionState::Stopped;
        inner.error = Some(message.into());
    }

    pub fn error(&self) -> Option<String> {
        self.inner.read().error.clone()
    }

    /// Status line shown on the demo card
    pub fn status_text(&self) -> &'static str {
        let inner = self.inner.read();
        if inner.error.is_some() {
            return "Connection Failed";
        }
        match inner.state {
            SessionState::Idle => "Ready to take the call...",
            SessionState::Listening => "Listening...",
            SessionState::Thinking => "Thinking...",
            SessionState::Speaking => "Speaking...",
            SessionState::Stopped => "Call Ended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionState; 5] = [
        SessionState::Idle,
        SessionState::Listening,
        SessionState::Thinking,
        SessionState::Speaking,
        SessionState::Stopped,
    ];

    fn utterance() -> SessionEvent {
        SessionEvent::UtteranceEnded {
            text: "hello".into(),
        }
    }

    #[test]
    fn test_full_turn_cycle() {
        let mut state = SessionState::Idle;
        let steps = [
            (SessionEvent::Start { greeting: "hi".into() }, SessionState::Speaking),
            (SessionEvent::SpeechFinished, SessionState::Speaking),
            (SessionEvent::GuardElapsed, SessionState::Listening),
            (utterance(), SessionState::Thinking),
            (SessionEvent::ReplyReady { text: "sure".into() }, SessionState::Speaking),
            (SessionEvent::SpeechFinished, SessionState::Speaking),
            (SessionEvent::GuardElapsed, SessionState::Listening),
            (SessionEvent::Stop, SessionState::Stopped),
        ];
        for (event, expected) in steps {
            state = transition(state, event).unwrap().new_state;
            assert_eq!(state, expected);
        }
    }

    #[test]
    fn test_utterances_only_accepted_while_listening() {
        for state in ALL {
            let result = transition(state, utterance());
            if state == SessionState::Listening {
                let t = result.unwrap();
                assert_eq!(t.effects[0], Effect::SuppressInput);
                assert_eq!(t.effects[1], Effect::RequestReply("hello".into()));
            } else {
                assert_eq!(
                    result.unwrap_err(),
                    TransitionError {
                        state,
                        event: "utterance_ended"
                    }
                );
            }
        }
    }

    #[test]
    fn test_stop_is_legal_everywhere() {
        for state in ALL {
            let t = transition(state, SessionEvent::Stop).unwrap();
            assert_eq!(t.new_state, SessionState::Stopped);
            if state == SessionState::Stopped {
                assert!(t.effects.is_empty());
            } else {
                assert!(t.effects.contains(&Effect::CancelSpeech));
            }
        }
    }

    #[test]
    fn test_start_only_from_idle_or_stopped() {
        for state in ALL {
            let ok = transition(state, SessionEvent::Start { greeting: "hi".into() }).is_ok();
            assert_eq!(ok, matches!(state, SessionState::Idle | SessionState::Stopped));
        }
    }

    #[test]
    fn test_failure_and_timeout_paths() {
        let failed = transition(SessionState::Thinking, SessionEvent::ReplyFailed).unwrap();
        assert_eq!(failed.new_state, SessionState::Listening);

        let timed_out = transition(
            SessionState::Thinking,
            SessionEvent::ReplyTimedOut {
                fallback: "Sorry?".into(),
            },
        )
        .unwrap();
        assert_eq!(timed_out.new_state, SessionState::Speaking);
        assert_eq!(timed_out.effects, vec![Effect::Speak("Sorry?".into())]);

        // a late reply after stop is rejected
        assert!(transition(
            SessionState::Stopped,
            SessionEvent::ReplyReady { text: "late".into() }
        )
        .is_err());
    }

    #[test]
    fn test_never_listening_and_speaking() {
        // synthesis completion racing a recognition result
        let state = SessionState::Speaking;
        assert!(transition(state, utterance()).is_err());
        let listening = transition(state, SessionEvent::GuardElapsed).unwrap().new_state;
        assert!(transition(listening, SessionEvent::SpeechFinished).is_err());
    }

    #[test]
    fn test_shared_state_status_text() {
        let shared = SharedSessionState::new();
        assert_eq!(shared.status_text(), "Ready to take the call...");

        shared
            .apply(SessionEvent::Start { greeting: "hi".into() })
            .unwrap();
        assert_eq!(shared.status_text(), "Speaking...");

        assert!(shared.apply(utterance()).is_err());
        assert_eq!(shared.get(), SessionState::Speaking);

        shared.apply(SessionEvent::Stop).unwrap();
        assert_eq!(shared.status_text(), "Call Ended");

        shared.fail("model unavailable");
        assert_eq!(shared.status_text(), "Connection Failed");
        assert_eq!(shared.error().as_deref(), Some("model unavailable"));
    }
}
