//! Application bootstrap: config resolution, provider and service construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use quarry_index::{EmbedderConfig, Lang, RetrievalConfig, RetrievalService};
use quarry_llm::EmbeddingProvider;
use quarry_llm::any::AnyProvider;
use quarry_llm::ollama::OllamaProvider;
use quarry_llm::openai::OpenAiProvider;

use crate::config::{Config, ProviderKind};

/// Priority: `--config` > `QUARRY_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("QUARRY_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Load and validate the configuration at the resolved path.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or fails validation.
pub fn load_config(cli: Option<&Path>) -> anyhow::Result<Config> {
    let path = resolve_config_path(cli);
    let config = Config::load(&path)?;
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Build the embedding backend selected by `llm.provider`.
///
/// # Errors
///
/// Returns an error if the OpenAI backend is selected without its config
/// section or API key.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    match config.llm.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.base_url,
            config.llm.embedding_model.clone(),
        ))),
        ProviderKind::OpenAi => {
            let openai_cfg = config
                .llm
                .openai
                .as_ref()
                .context("llm.openai config section required for OpenAI provider")?;
            let api_key = config
                .secrets
                .openai_api_key
                .as_ref()
                .context("QUARRY_OPENAI_API_KEY not set")?
                .expose()
                .to_owned();
            Ok(AnyProvider::OpenAi(
                OpenAiProvider::new(
                    api_key,
                    openai_cfg.base_url.clone(),
                    openai_cfg.embedding_model.clone(),
                )
                .with_timeout(Duration::from_secs(config.embedding.timeout_secs)),
            ))
        }
    }
}

#[must_use]
pub fn retrieval_config(config: &Config) -> RetrievalConfig {
    RetrievalConfig {
        lang: Lang::Python,
        comment_mode: config.index.comment_mode,
        embedder: EmbedderConfig {
            max_input_chars: config.embedding.max_input_chars,
            timeout: Duration::from_secs(config.embedding.timeout_secs),
        },
    }
}

/// Provider plus an empty index, wired from configuration.
///
/// # Errors
///
/// Returns an error if the provider cannot be created.
pub fn create_service(config: &Config) -> anyhow::Result<RetrievalService<AnyProvider>> {
    let provider = create_provider(config)?;
    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        comment_mode = %config.index.comment_mode,
        "retrieval service ready"
    );
    Ok(RetrievalService::new(Arc::new(provider), retrieval_config(config)))
}

/// Probe the backend once, giving up after `timeout`. Failures are logged,
/// not returned: ingestion still runs and reports per-record embedding
/// warnings. Returns `false` only when a probe ran and failed.
pub async fn health_check(provider: &AnyProvider, timeout: Duration) -> bool {
    let AnyProvider::Ollama(ollama) = provider else {
        return true;
    };
    match tokio::time::timeout(timeout, ollama.health_check()).await {
        Ok(Ok(())) => {
            tracing::info!("ollama health check passed");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!("ollama health check failed: {e:#}");
            false
        }
        Err(_) => {
            tracing::warn!("ollama health check timed out after {timeout:?}");
            false
        }
    }
}
