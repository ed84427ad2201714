//! Conversation transcript for one voice session
//!
//! The transcript always starts with the persona instruction followed by the
//! agent's opening line. It only grows by whole exchanges: a user turn and the
//! agent reply that answered it are committed together, so a failed
//! generation call leaves no dangling user turn behind.

use crate::llm::{Role, Turn};

/// Append-only, ordered list of turns
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh conversation: `[system, first agent line]`
    pub fn reset(&mut self, system_instruction: impl Into<String>, first_message: impl Into<String>) {
        self.turns.clear();
        self.turns.push(Turn::system(system_instruction));
        self.turns.push(Turn::agent(first_message));
    }

    /// The request for the next reply: everything so far plus the new user turn
    pub fn request_with(&self, user_text: &str) -> Vec<Turn> {
        let mut request = Vec::with_capacity(self.turns.len() + 1);
        request.extend(self.turns.iter().cloned());
        request.push(Turn::user(user_text));
        request
    }

    /// Record a completed exchange
    pub fn commit_exchange(&mut self, user_text: impl Into<String>, agent_text: impl Into<String>) {
        self.turns.push(Turn::user(user_text));
        self.turns.push(Turn::agent(agent_text));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub(crate) fn len(&self) -> usize {
        self.turns.len()
    }

    /// Number of completed user/agent exchanges
    pub(crate) fn exchanges(&self) -> usize {
        self.turns.iter().filter(|t| t.role == Role::User).count()
    }
}
