mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings no run can work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.top_k == 0 {
            bail!("index.top_k must be at least 1");
        }
        if self.embedding.max_input_chars == 0 {
            bail!("embedding.max_input_chars must be at least 1");
        }
        if self.embedding.timeout_secs == 0 {
            bail!("embedding.timeout_secs must be at least 1");
        }
        if self.llm.provider == ProviderKind::OpenAi {
            if self.llm.openai.is_none() {
                bail!("llm.openai config section required for OpenAI provider");
            }
            if self.secrets.openai_api_key.is_none() {
                bail!("QUARRY_OPENAI_API_KEY is required for OpenAI provider");
            }
        }
        Ok(())
    }
}
