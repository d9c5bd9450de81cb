//! Guarded access to an embedding provider: input limits, a call timeout and
//! output validation.

use std::sync::Arc;
use std::time::Duration;

use quarry_llm::{EmbeddingProvider, LlmError};

/// Errors produced while embedding a single text.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("input is empty")]
    EmptyInput,

    #[error("input is {len} characters, limit is {max}")]
    InputTooLong { len: usize, max: usize },

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("provider returned an empty vector")]
    EmptyVector,

    #[error("provider returned a non-finite component")]
    NonFinite,

    #[error(transparent)]
    Provider(#[from] LlmError),
}

/// Embedder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedderConfig {
    /// Longest accepted input, in characters (default: 16384).
    pub max_input_chars: usize,
    /// Upper bound on one provider call (default: 30s).
    pub timeout: Duration,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 16_384,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Wraps a shared provider handle. Stateless per call: the same text and model
/// always yield the same vector.
#[derive(Debug)]
pub struct Embedder<P> {
    provider: Arc<P>,
    config: EmbedderConfig,
}

impl<P> Clone for Embedder<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: self.config,
        }
    }
}

impl<P: EmbeddingProvider> Embedder<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, config: EmbedderConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn config(&self) -> EmbedderConfig {
        self.config
    }

    /// Embed `text` into a dense vector.
    ///
    /// # Errors
    ///
    /// Fails on empty or oversized input, provider errors, a call exceeding
    /// the configured timeout, and empty or non-finite output.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            return Err(EmbedError::EmptyInput);
        }
        let len = text.chars().count();
        if len > self.config.max_input_chars {
            return Err(EmbedError::InputTooLong {
                len,
                max: self.config.max_input_chars,
            });
        }

        let vector = tokio::time::timeout(self.config.timeout, self.provider.embed(text))
            .await
            .map_err(|_| EmbedError::Timeout(self.config.timeout))??;

        if vector.is_empty() {
            return Err(EmbedError::EmptyVector);
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(EmbedError::NonFinite);
        }
        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            chars = len,
            dimension = vector.len(),
            "embedded text"
        );
        Ok(vector)
    }
}
