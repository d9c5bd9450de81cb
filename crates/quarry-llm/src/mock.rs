//! Test-only mock embedding provider.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::LlmError;
use crate::provider::EmbeddingProvider;

/// Deterministic in-process encoder.
///
/// Texts registered with [`MockProvider::with_embedding`] return their fixed
/// vector; every other text gets a pseudo-random unit-range vector seeded by
/// the text bytes, so equal texts always map to equal vectors.
#[derive(Debug, Clone)]
pub struct MockProvider {
    pub dimension: usize,
    fixed: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    pub fail_all: bool,
    /// Milliseconds to sleep before answering.
    pub delay_ms: u64,
    calls: Arc<AtomicUsize>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            dimension: 8,
            fixed: HashMap::new(),
            failing: HashSet::new(),
            fail_all: false,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.insert(text.into(), vector);
        self
    }

    /// Make `embed` fail for exactly this text.
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Number of `embed` calls made so far, across clones.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl EmbeddingProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_all || self.failing.contains(text) {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        if let Some(vector) = self.fixed.get(text) {
            return Ok(vector.clone());
        }
        Ok(hashed_vector(text, self.dimension))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn model(&self) -> &str {
        "mock-hash"
    }
}

#[allow(clippy::cast_precision_loss)]
fn hashed_vector(text: &str, dimension: usize) -> Vec<f32> {
    // FNV-1a seed, xorshift expansion.
    let mut state: u64 = 0xcbf2_9ce4_8422_2325;
    for b in text.bytes() {
        state ^= u64::from(b);
        state = state.wrapping_mul(0x0100_0000_01b3);
    }
    if state == 0 {
        state = 1;
    }
    (0..dimension)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn same_text_same_vector() {
        let p = MockProvider::default();
        let a = p.embed("def add(a, b): return a + b").await.unwrap();
        let b = p.embed("def add(a, b): return a + b").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn different_text_different_vector() {
        let p = MockProvider::default();
        let a = p.embed("add(5, 3)").await.unwrap();
        let b = p.embed("import numpy as np").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn fixed_embedding_wins() {
        let p = MockProvider::with_dimension(2).with_embedding("origin", vec![0.0, 0.0]);
        assert_eq!(p.embed("origin").await.unwrap(), vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn failing_on_specific_text() {
        let p = MockProvider::default().failing_on("boom");
        assert!(p.embed("boom").await.is_err());
        assert!(p.embed("fine").await.is_ok());
        assert_eq!(p.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_all() {
        let p = MockProvider::failing();
        let err = p.embed("anything").await.unwrap_err();
        assert!(err.to_string().contains("mock embedding error"));
    }

    #[tokio::test]
    async fn call_count_shared_between_clones() {
        let p = MockProvider::default();
        let clone = p.clone();
        clone.embed("x").await.unwrap();
        assert_eq!(p.call_count(), 1);
    }

    proptest! {
        #[test]
        fn hashed_vector_components_in_range(text in "\\PC{0,200}", dimension in 1usize..64) {
            let v = hashed_vector(&text, dimension);
            prop_assert_eq!(v.len(), dimension);
            prop_assert!(v.iter().all(|x| x.is_finite() && (-1.0..=1.0).contains(x)));
        }
    }
}
