//! Flat vector index with exact nearest-neighbor search.
//!
//! The index owns the embedding matrix (one row per corpus record, in
//! ingestion order) and answers top-k queries by squared Euclidean
//! distance. It is built once per ingestion and read-only afterward;
//! replacing the corpus means building a fresh index and swapping the
//! whole snapshot (see `engine`).

use crate::errors::{EngineError, Result};

/// Exact L2 nearest-neighbor index over a dense embedding matrix.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    // Row-major matrix, rows * dimension values.
    data: Vec<f32>,
    rows: usize,
}

impl VectorIndex {
    /// Build an index from an ordered batch of embeddings.
    ///
    /// Row order is preserved exactly: row `i` of the index is
    /// `embeddings[i]`, which must correspond to corpus record `i`.
    pub fn build(dimension: usize, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if dimension == 0 {
            return Err(EngineError::InvalidArgument(
                "embedding dimension must be positive".to_string(),
            ));
        }

        let rows = embeddings.len();
        let mut data = Vec::with_capacity(rows * dimension);
        for (row, embedding) in embeddings.into_iter().enumerate() {
            if embedding.len() != dimension {
                return Err(EngineError::InvalidArgument(format!(
                    "embedding row {} has dimension {} (expected {})",
                    row,
                    embedding.len(),
                    dimension
                )));
            }
            data.extend_from_slice(&embedding);
        }

        Ok(Self {
            dimension,
            data,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Iterate the stored rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension)
    }

    /// Find the `k` nearest rows to `query` by squared L2 distance.
    ///
    /// Returns `min(k, len)` pairs of `(distance, position)` in ascending
    /// distance order; equal distances keep insertion order. The query
    /// must come from the same embedding space as the stored rows.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(f32, usize)>> {
        if self.rows == 0 {
            return Err(EngineError::NotReady);
        }
        if k == 0 {
            return Err(EngineError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }
        if query.len() != self.dimension {
            return Err(EngineError::InvalidArgument(format!(
                "query has dimension {} (expected {})",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(f32, usize)> = self
            .rows()
            .enumerate()
            .map(|(position, row)| (squared_l2(query, row), position))
            .collect();

        // Stable sort: ties keep insertion order.
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k.min(self.rows));

        Ok(scored)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
