use crate::error::{IngestError, QueryError};
use crate::models::Chunk;
use std::sync::{Arc, RwLock};

/// Flat in-memory index over (chunk, vector) pairs. Write-once: built in
/// full, queried many times, discarded when the next build replaces it.
#[derive(Debug)]
pub struct VectorIndex {
    dimensions: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn build(pairs: Vec<(Chunk, Vec<f32>)>) -> Result<Self, IngestError> {
        let dimensions = match pairs.first() {
            Some((_, vector)) => vector.len(),
            None => return Err(IngestError::EmptyIndex),
        };

        let mut chunks = Vec::with_capacity(pairs.len());
        let mut vectors = Vec::with_capacity(pairs.len());

        for (chunk, vector) in pairs {
            if vector.len() != dimensions {
                return Err(IngestError::DimensionMismatch {
                    expected: dimensions,
                    got: vector.len(),
                });
            }
            chunks.push(chunk);
            vectors.push(vector);
        }

        Ok(Self {
            dimensions,
            chunks,
            vectors,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the `k` chunks whose vectors are nearest to `query` under
    /// squared Euclidean distance, nearest first. Ties fall back to
    /// insertion order. Asking for more than is stored returns everything.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Chunk>, QueryError> {
        if query.len() != self.dimensions {
            return Err(QueryError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        let mut ranked: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (squared_distance(query, vector), position))
            .collect();

        ranked.sort_by(|left, right| {
            left.0
                .total_cmp(&right.0)
                .then_with(|| left.1.cmp(&right.1))
        });

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(_, position)| self.chunks[position].clone())
            .collect())
    }
}

fn squared_distance(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right)
        .map(|(a, b)| {
            let delta = a - b;
            delta * delta
        })
        .sum()
}

/// Shared handle to the one live index. A build installs a complete
/// snapshot in a single pointer store, so readers observe either the old
/// index or the new one, never a partially built one. Concurrent installs
/// race last-writer-wins.
#[derive(Debug, Default, Clone)]
pub struct IndexCell {
    inner: Arc<RwLock<Option<Arc<VectorIndex>>>>,
}

impl IndexCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, index: VectorIndex) {
        let mut slot = self.inner.write().unwrap_or_else(|poison| poison.into_inner());
        *slot = Some(Arc::new(index));
    }

    /// Clones the current snapshot out of the cell. Searching happens on
    /// the snapshot without holding the lock.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        let slot = self.inner.read().unwrap_or_else(|poison| poison.into_inner());
        slot.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }
}
