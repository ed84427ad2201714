//! Hosted text generation
//!
//! This module provides:
//! - The `TextGenerator` seam the voice session talks to
//! - A Gemini REST implementation with cached model discovery
//! - Persona prompt composition

mod error;
pub mod gemini;
pub mod prompts;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiClient, ModelCache};
pub use types::{Role, Turn};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// "Send a transcript, receive one reply"
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Find a usable model for the configured credential (cached)
    async fn resolve_model(&self) -> Result<String, LlmError>;

    /// Generate the next agent turn for a transcript
    async fn generate(&self, turns: &[Turn]) -> Result<String, LlmError>;

    /// Drop any cached model id so the next call resolves again
    fn invalidate_model(&self) {}

    /// Currently resolved model, if any
    fn model_id(&self) -> Option<String> {
        None
    }
}

/// Wrapper that logs every generation call
pub struct LoggingGenerator {
    inner: Arc<dyn TextGenerator>,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl TextGenerator for LoggingGenerator {
    async fn resolve_model(&self) -> Result<String, LlmError> {
        let start = Instant::now();
        let result = self.inner.resolve_model().await;
        match &result {
            Ok(model) => tracing::debug!(
                model = %model,
                duration_ms = %start.elapsed().as_millis(),
                "Model resolved"
            ),
            Err(e) => tracing::error!(
                duration_ms = %start.elapsed().as_millis(),
                error = %e.message,
                kind = ?e.kind,
                "Model resolution failed"
            ),
        }
        result
    }

    async fn generate(&self, turns: &[Turn]) -> Result<String, LlmError> {
        let start = Instant::now();
        let result = self.inner.generate(turns).await;
        let model = self.inner.model_id().unwrap_or_else(|| "unresolved".to_string());

        match &result {
            Ok(reply) => tracing::info!(
                model = %model,
                duration_ms = %start.elapsed().as_millis(),
                turns = turns.len(),
                reply_chars = reply.len(),
                "Generation completed"
            ),
            Err(e) => tracing::error!(
                model = %model,
                duration_ms = %start.elapsed().as_millis(),
                error = %e.message,
                retryable = e.kind.is_retryable(),
                "Generation failed"
            ),
        }
        result
    }

    fn invalidate_model(&self) {
        self.inner.invalidate_model();
    }

    fn model_id(&self) -> Option<String> {
        self.inner.model_id()
    }
}
