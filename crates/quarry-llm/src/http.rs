//! HTTP client used by the embedding backends.

use std::time::Duration;

/// Request timeout used until a caller supplies its own.
pub(crate) const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client whose whole request, connect included, is bounded by `timeout`.
pub(crate) fn embedding_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout(timeout))
        .timeout(timeout)
        .user_agent(concat!("quarry/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

fn connect_timeout(timeout: Duration) -> Duration {
    timeout.min(MAX_CONNECT_TIMEOUT)
}
