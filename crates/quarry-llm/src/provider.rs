use std::future::Future;

use crate::error::LlmError;

/// A text encoder that maps one input string to a dense vector.
///
/// Implementations are handles passed explicitly to whatever needs embeddings;
/// there is no process-wide model instance. For a fixed model the same text
/// must always produce the same vector (within floating-point tolerance).
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or its response is invalid.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Short backend identifier used in logs.
    fn name(&self) -> &str;

    /// Model identifier the vectors come from.
    fn model(&self) -> &str;
}
