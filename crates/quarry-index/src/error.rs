//! Error types for quarry-index.

use crate::embedder::EmbedError;

/// Errors that can occur while canonicalizing, indexing, or querying.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source text is not valid in the grammar. `line` and `column` are 1-based.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Vector length differs from the dimensionality fixed by the first insert.
    #[error("dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Zero-length vectors cannot fix or match a dimensionality.
    #[error("empty vector")]
    EmptyVector,

    /// Embedding failed for a query or an artifact.
    #[error("embedding failed for {context}: {source}")]
    Embedding {
        context: String,
        #[source]
        source: EmbedError,
    },

    /// A non-empty result was required but the index holds no records.
    #[error("index is empty")]
    EmptyIndex,

    /// No grammar is compiled in for the configured language.
    #[error("unsupported language")]
    UnsupportedLanguage,

    /// A panic while holding the index lock left it unusable.
    #[error("index lock poisoned")]
    LockPoisoned,

    /// Failure scoped to one ingested source.
    #[error("{origin}: {source}")]
    Source {
        origin: String,
        #[source]
        source: Box<IndexError>,
    },

    /// Generic catch-all error.
    #[error("{0}")]
    Other(String),
}

impl IndexError {
    /// Attach the file or source name that triggered the error.
    #[must_use]
    pub fn in_source(origin: &str, err: IndexError) -> Self {
        Self::Source {
            origin: origin.to_owned(),
            source: Box::new(err),
        }
    }

    /// The underlying error with any source wrapping removed.
    #[must_use]
    pub fn root(&self) -> &IndexError {
        match self {
            Self::Source { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
