//! In-memory k-nearest-neighbor index under squared L2 distance.

use std::cmp::Ordering;
use std::ops::Range;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use crate::error::{IndexError, Result};

/// One vector with the metadata describing where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingRecord {
    #[serde(skip)]
    pub vector: Vec<f32>,
    /// `cleaned_code`, `function_definition: <name>`, `function_call: <name>`
    /// or `external_dependency: <ordinal>`.
    pub label: String,
    /// File or source name the record was ingested from.
    pub origin: Option<String>,
    /// Text that was embedded.
    pub snippet: String,
}

impl EmbeddingRecord {
    #[must_use]
    pub fn new(vector: Vec<f32>, label: impl Into<String>) -> Self {
        Self {
            vector,
            label: label.into(),
            origin: None,
            snippet: String::new(),
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

/// A search hit. `id` is the record's insertion position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub id: usize,
    pub label: String,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
    pub origin: Option<String>,
    pub snippet: String,
}

/// Append-only vector collection answering nearest-neighbor queries.
///
/// All vectors share the dimensionality fixed by the first insert.
pub trait VectorIndex: Send + Sync {
    /// Append one record and return its id.
    ///
    /// # Errors
    ///
    /// Returns `EmptyVector` or `DimensionMismatch` for a vector that does not
    /// fit the index.
    fn insert(&self, record: EmbeddingRecord) -> Result<usize>;

    /// Append every record or none of them. Returns the id range assigned.
    ///
    /// # Errors
    ///
    /// Fails without inserting anything if any vector does not fit.
    fn insert_batch(&self, records: Vec<EmbeddingRecord>) -> Result<Range<usize>>;

    /// The `min(k, len)` records closest to `query`, closest first, ties by
    /// ascending id.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `query` has the wrong length.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>>;

    fn get(&self, id: usize) -> Option<EmbeddingRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality, once the first record has been inserted.
    fn dimension(&self) -> Option<usize>;
}

#[derive(Default)]
struct FlatData {
    dimension: Option<usize>,
    records: Vec<EmbeddingRecord>,
}

fn check_vector(expected: Option<usize>, vector: &[f32]) -> Result<()> {
    if vector.is_empty() {
        return Err(IndexError::EmptyVector);
    }
    match expected {
        Some(expected) if expected != vector.len() => Err(IndexError::DimensionMismatch {
            expected,
            actual: vector.len(),
        }),
        _ => Ok(()),
    }
}

/// Exhaustive index: every query scans every stored vector.
#[derive(Default)]
pub struct FlatIndex {
    data: RwLock<FlatData>,
}

impl FlatIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for FlatIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatIndex")
            .field("len", &self.len())
            .field("dimension", &self.dimension())
            .finish_non_exhaustive()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn by_distance_then_id(a: &(f32, usize), b: &(f32, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

impl VectorIndex for FlatIndex {
    fn insert(&self, record: EmbeddingRecord) -> Result<usize> {
        let mut data = self.data.write().map_err(|_| IndexError::LockPoisoned)?;
        check_vector(data.dimension, &record.vector)?;
        data.dimension = Some(record.vector.len());
        data.records.push(record);
        Ok(data.records.len() - 1)
    }

    fn insert_batch(&self, records: Vec<EmbeddingRecord>) -> Result<Range<usize>> {
        let mut data = self.data.write().map_err(|_| IndexError::LockPoisoned)?;

        let mut dimension = data.dimension;
        for record in &records {
            check_vector(dimension, &record.vector)?;
            dimension = Some(record.vector.len());
        }

        let start = data.records.len();
        data.dimension = dimension;
        data.records.extend(records);
        Ok(start..data.records.len())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        let data = self.data.read().map_err(|_| IndexError::LockPoisoned)?;
        let Some(dimension) = data.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = data
            .records
            .iter()
            .enumerate()
            .map(|(id, r)| (squared_l2(query, &r.vector), id))
            .collect();
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_id);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_id);

        Ok(scored
            .into_iter()
            .map(|(distance, id)| {
                let record = &data.records[id];
                QueryResult {
                    id,
                    label: record.label.clone(),
                    distance,
                    origin: record.origin.clone(),
                    snippet: record.snippet.clone(),
                }
            })
            .collect())
    }

    fn get(&self, id: usize) -> Option<EmbeddingRecord> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.records.get(id).cloned()
    }

    fn len(&self) -> usize {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.records.len()
    }

    fn dimension(&self) -> Option<usize> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        data.dimension
    }
}
