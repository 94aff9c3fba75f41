//! Exact nearest-neighbour index over fixed-dimension vectors.
//!
//! Vectors are appended in order and addressed by their zero-based ordinal.
//! Search is brute force over every stored vector using squared Euclidean
//! distance, so a query costs O(n * d).

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A single k-NN match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub ordinal: usize,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

/// Append-only flat vector index.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    /// Row-major storage, `dimension` floats per vector
    data: Vec<f32>,
}

impl VectorIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the stored vector at `ordinal`, if any.
    #[inline]
    pub fn get(&self, ordinal: usize) -> Option<&[f32]> {
        if ordinal >= self.len() {
            return None;
        }
        let start = ordinal * self.dimension;
        self.data.get(start..start + self.dimension)
    }

    /// Appends a vector at the next ordinal and returns that ordinal.
    #[inline]
    pub fn append(&mut self, vector: &[f32]) -> Result<usize, IndexError> {
        self.check_dimension(vector)?;

        let ordinal = self.len();
        self.data.extend_from_slice(vector);
        Ok(ordinal)
    }

    /// Finds the `k` nearest vectors to `query`.
    ///
    /// Returns `min(k, len)` neighbours ordered by ascending distance, with
    /// ties going to the lower ordinal. A shorter result means the index holds
    /// fewer than `k` vectors; no placeholder entries are produced.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_dimension(query)?;

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(ordinal, row)| Neighbor {
                ordinal,
                distance: squared_l2(query, row),
            })
            .collect();

        if candidates.len() > k {
            candidates.select_nth_unstable_by(k - 1, compare_neighbors);
            candidates.truncate(k);
        }
        candidates.sort_unstable_by(compare_neighbors);

        Ok(candidates)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}

#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
