#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

use crate::error::LlmError;
use crate::provider::EmbeddingProvider;

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given closure for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl EmbeddingProvider for AnyProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }

    fn model(&self) -> &str {
        delegate_provider!(self, |p| p.model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_name_and_model() {
        let provider = AnyProvider::Ollama(OllamaProvider::new(
            "http://localhost:11434",
            "all-minilm".into(),
        ));
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "all-minilm");

        let provider = AnyProvider::OpenAi(OpenAiProvider::new(
            "key".into(),
            "http://localhost:8080/v1".into(),
            "bge-small".into(),
        ));
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "bge-small");
    }

    #[cfg(feature = "mock")]
    #[tokio::test]
    async fn delegates_embed_to_mock() {
        let provider = AnyProvider::Mock(MockProvider::with_dimension(4));
        let v = provider.embed("x = 1").await.unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(provider.name(), "mock");
    }
}
