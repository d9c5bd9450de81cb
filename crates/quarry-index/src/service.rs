//! Retrieval orchestrator: canonicalize → extract → embed → index, and
//! query → embed → search.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::canonical::{CanonicalText, Canonicalizer, CommentMode};
use crate::embedder::{Embedder, EmbedderConfig};
use crate::error::{IndexError, Result};
use crate::extractor::{Artifacts, extract};
use crate::index::{EmbeddingRecord, FlatIndex, QueryResult, VectorIndex};
use crate::languages::Lang;
use quarry_llm::EmbeddingProvider;

const QUERY_CONTEXT_CHARS: usize = 40;

/// Retrieval service configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalConfig {
    pub lang: Lang,
    pub comment_mode: CommentMode,
    pub embedder: EmbedderConfig,
}

/// Canonical text and artifacts of one source, without embeddings.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedSource {
    pub canonical: CanonicalText,
    pub artifacts: Artifacts,
}

/// A record left out of the index because its embedding failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedWarning {
    pub label: String,
    pub message: String,
}

/// Summary of one ingestion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub origin: String,
    /// Extracted artifacts, not counting the whole-text record.
    pub artifact_count: usize,
    /// Records inserted into the index, whole-text record included.
    pub embedding_count: usize,
    pub warnings: Vec<EmbedWarning>,
    pub duration_ms: u64,
}

/// Owns one index and the encoder feeding it.
pub struct RetrievalService<P, I = FlatIndex> {
    canonicalizer: Canonicalizer,
    embedder: Embedder<P>,
    index: I,
}

impl<P: EmbeddingProvider> RetrievalService<P, FlatIndex> {
    #[must_use]
    pub fn new(provider: Arc<P>, config: RetrievalConfig) -> Self {
        Self::with_index(provider, config, FlatIndex::new())
    }
}

impl<P: EmbeddingProvider, I: VectorIndex> RetrievalService<P, I> {
    #[must_use]
    pub fn with_index(provider: Arc<P>, config: RetrievalConfig, index: I) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(config.lang, config.comment_mode),
            embedder: Embedder::new(provider, config.embedder),
            index,
        }
    }

    #[must_use]
    pub fn index(&self) -> &I {
        &self.index
    }

    #[must_use]
    pub fn embedder(&self) -> &Embedder<P> {
        &self.embedder
    }

    /// Canonicalize and extract without embedding anything.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Parse` if `raw` is not valid source.
    pub fn inspect(&self, raw: &str) -> Result<ProcessedSource> {
        let canonical = self.canonicalizer.canonicalize(raw)?;
        let artifacts = extract(canonical.as_str(), self.canonicalizer.lang())?;
        Ok(ProcessedSource {
            canonical,
            artifacts,
        })
    }

    /// Read a source file and ingest it under its path.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or [`Self::ingest_source`] fails. The
    /// file name is not consulted; the text is parsed as the configured
    /// language.
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport> {
        let origin = path.display().to_string();
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IndexError::in_source(&origin, e.into()))?;
        self.ingest_source(&origin, &source).await
    }

    /// Canonicalize, extract and embed `raw`, then append the records in one
    /// batch: whole text, definitions, calls, imports.
    ///
    /// A record whose embedding fails is skipped and reported in
    /// [`IngestReport::warnings`].
    ///
    /// # Errors
    ///
    /// Parse and dimension errors abort the ingestion with the index untouched.
    pub async fn ingest_source(&self, origin: &str, raw: &str) -> Result<IngestReport> {
        let start = std::time::Instant::now();
        let processed = self
            .inspect(raw)
            .map_err(|e| IndexError::in_source(origin, e))?;

        let pending = pending_records(&processed);
        tracing::info!(
            origin,
            artifacts = processed.artifacts.len(),
            "ingestion started"
        );

        let mut report = IngestReport {
            origin: origin.to_owned(),
            artifact_count: processed.artifacts.len(),
            ..IngestReport::default()
        };

        let mut records = Vec::with_capacity(pending.len());
        for (label, snippet) in pending {
            match self.embedder.embed(snippet).await {
                Ok(vector) => {
                    tracing::debug!(origin, label = %label, "embedded artifact");
                    records.push(
                        EmbeddingRecord::new(vector, label)
                            .with_origin(origin)
                            .with_snippet(snippet),
                    );
                }
                Err(e) => {
                    tracing::warn!(origin, label = %label, "skipping record: {e}");
                    report.warnings.push(EmbedWarning {
                        label,
                        message: e.to_string(),
                    });
                }
            }
        }

        if !records.is_empty() {
            let ids = self
                .index
                .insert_batch(records)
                .map_err(|e| IndexError::in_source(origin, e))?;
            report.embedding_count = ids.len();
        }

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            origin,
            embedded = report.embedding_count,
            skipped = report.warnings.len(),
            duration_ms = report.duration_ms,
            "ingestion complete"
        );
        Ok(report)
    }

    /// The `k` records closest to `text`. An empty index yields no results.
    ///
    /// # Errors
    ///
    /// Fails if the query cannot be embedded or its dimension differs from
    /// the index.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<QueryResult>> {
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|source| IndexError::Embedding {
                context: format!("query `{}`", abbreviate(text)),
                source,
            })?;
        let results = self.index.search(&vector, k)?;
        tracing::debug!(k, hits = results.len(), "query answered");
        Ok(results)
    }

    /// Like [`Self::query`], but an empty index is an error.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::EmptyIndex` when nothing has been ingested yet.
    pub async fn query_non_empty(&self, text: &str, k: usize) -> Result<Vec<QueryResult>> {
        if self.index.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        self.query(text, k).await
    }
}

fn pending_records(processed: &ProcessedSource) -> Vec<(String, &str)> {
    let artifacts = &processed.artifacts;
    let mut pending = Vec::with_capacity(artifacts.len() + 1);
    pending.push(("cleaned_code".to_owned(), processed.canonical.as_str()));
    for def in &artifacts.function_definitions {
        pending.push((
            format!("function_definition: {}", def.name),
            def.source_text.as_str(),
        ));
    }
    for call in &artifacts.function_calls {
        pending.push((
            format!("function_call: {}", call.callee_name),
            call.source_text.as_str(),
        ));
    }
    for (i, import) in artifacts.imports.iter().enumerate() {
        pending.push((
            format!("external_dependency: {}", i + 1),
            import.source_text.as_str(),
        ));
    }
    pending
}

fn abbreviate(text: &str) -> String {
    let mut short: String = text.chars().take(QUERY_CONTEXT_CHARS).collect();
    if short.len() < text.len() {
        short.push('…');
    }
    short.replace('\n', " ")
}

/// Render ranked results as numbered plain-text lines.
#[must_use]
pub fn format_results(results: &[QueryResult]) -> String {
    if results.is_empty() {
        return "no results\n".to_owned();
    }
    let mut out = String::new();
    for (rank, r) in results.iter().enumerate() {
        let _ = match &r.origin {
            Some(origin) => writeln!(
                out,
                "{}. {} ({origin}) distance: {:.4}",
                rank + 1,
                r.label,
                r.distance
            ),
            None => writeln!(out, "{}. {} distance: {:.4}", rank + 1, r.label, r.distance),
        };
    }
    out
}
