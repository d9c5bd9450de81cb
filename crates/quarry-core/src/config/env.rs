use super::{Config, Secret};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("QUARRY_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid QUARRY_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("QUARRY_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("QUARRY_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("QUARRY_OPENAI_API_KEY")
            && !v.is_empty()
        {
            self.secrets.openai_api_key = Some(Secret::new(v));
        }
        if let Ok(v) = std::env::var("QUARRY_EMBEDDING_MAX_INPUT_CHARS") {
            match v.parse::<usize>() {
                Ok(n) => self.embedding.max_input_chars = n,
                Err(_) => tracing::warn!("ignoring invalid QUARRY_EMBEDDING_MAX_INPUT_CHARS value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("QUARRY_EMBEDDING_TIMEOUT") {
            match v.parse::<u64>() {
                Ok(secs) => self.embedding.timeout_secs = secs,
                Err(_) => tracing::warn!("ignoring invalid QUARRY_EMBEDDING_TIMEOUT value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("QUARRY_INDEX_COMMENT_MODE") {
            if let Ok(mode) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.index.comment_mode = mode;
            } else {
                tracing::warn!("ignoring invalid QUARRY_INDEX_COMMENT_MODE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("QUARRY_INDEX_TOP_K") {
            match v.parse::<usize>() {
                Ok(k) => self.index.top_k = k,
                Err(_) => tracing::warn!("ignoring invalid QUARRY_INDEX_TOP_K value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("QUARRY_LOG_LEVEL") {
            self.observability.log_level = v;
        }
    }
}
