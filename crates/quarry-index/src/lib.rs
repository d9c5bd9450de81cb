//! Artifact extraction and embedding retrieval over Python sources.
//!
//! Source text is canonicalized (comments and docstrings removed), decomposed
//! into function definitions, call sites and imports via tree-sitter, embedded
//! through an injected [`quarry_llm::EmbeddingProvider`], and stored in an
//! in-memory L2 index that answers k-nearest-neighbor queries.

pub mod canonical;
pub mod embedder;
pub mod error;
pub mod extractor;
pub mod index;
pub mod languages;
pub mod service;
pub(crate) mod syntax;

pub use canonical::{CanonicalText, Canonicalizer, CommentMode};
pub use embedder::{EmbedError, Embedder, EmbedderConfig};
pub use error::{IndexError, Result};
pub use extractor::{Artifacts, FunctionCall, FunctionDefinition, ImportDeclaration, extract};
pub use index::{EmbeddingRecord, FlatIndex, QueryResult, VectorIndex};
pub use languages::{Lang, detect_language};
pub use service::{
    EmbedWarning, IngestReport, ProcessedSource, RetrievalConfig, RetrievalService, format_results,
};
