use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::EmbeddingProvider;

/// Client for any server speaking the OpenAI `/embeddings` API.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    embedding_model: String,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(api_key: String, mut base_url: String, embedding_model: String) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::embedding_client(crate::http::DEFAULT_EMBED_TIMEOUT),
            api_key,
            base_url,
            embedding_model,
        }
    }

    /// Bound every embedding request, connect included, by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = crate::http::embedding_client(timeout);
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let body = EmbeddingRequest {
            input: text,
            model: &self.embedding_model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::EmbedUnsupported { provider: "openai" });
        }
        if !status.is_success() {
            tracing::error!("OpenAI embedding API error {status}: {text}");
            return Err(LlmError::Other(format!(
                "OpenAI embedding request failed (status {status})"
            )));
        }

        let resp: EmbeddingResponse = serde_json::from_str(&text)?;

        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(LlmError::EmptyResponse { provider: "openai" })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.embedding_model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> OpenAiProvider {
        OpenAiProvider::new(
            "test-key".into(),
            "https://api.openai.com/v1/".into(),
            "text-embedding-3-small".into(),
        )
    }

    #[test]
    fn new_strips_trailing_slashes() {
        let p = test_provider();
        assert_eq!(p.base_url, "https://api.openai.com/v1");
        assert_eq!(p.model(), "text-embedding-3-small");
    }

    #[test]
    fn debug_redacts_api_key() {
        let dbg = format!("{:?}", test_provider());
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("test-key"));
    }

    #[test]
    fn parse_embedding_response() {
        let json = r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#;
        let resp: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert_eq!(resp.data[0].embedding, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn embedding_response_empty_data() {
        let json = r#"{"data":[]}"#;
        let resp: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_empty());
    }

    #[test]
    fn embedding_request_serialization() {
        let req = EmbeddingRequest {
            input: "import numpy as np",
            model: "text-embedding-3-small",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"model\":\"text-embedding-3-small\""));
        assert!(json.contains("\"input\":\"import numpy as np\""));
    }

    #[tokio::test]
    async fn embed_unreachable_endpoint_errors() {
        let p = OpenAiProvider::new(
            "key".into(),
            "http://127.0.0.1:1".into(),
            "embed-model".into(),
        )
        .with_client(reqwest::Client::new());
        assert!(p.embed("test").await.is_err());
    }

    #[tokio::test]
    async fn embed_respects_configured_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let _conn = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let p = OpenAiProvider::new("key".into(), format!("http://{addr}"), "m".into())
            .with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = p.embed("test").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(ref e) if e.is_timeout()), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    #[ignore = "requires OPENAI_API_KEY"]
    async fn integration_openai_embed() {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap();
        let provider = OpenAiProvider::new(
            api_key,
            "https://api.openai.com/v1".into(),
            "text-embedding-3-small".into(),
        );
        let embedding = provider.embed("Hello world").await.unwrap();
        assert!(!embedding.is_empty());
    }
}
