//! Dense pairwise cosine similarity matrix
//!
//! Row and column `i` refer to row `i` of the record table. The upper
//! triangle is computed once and mirrored, so `get(i, j) == get(j, i)`
//! holds bit for bit.

use furnrec_core::{Error, Result, SparseVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    dim: usize,
    /// Row-major, `dim * dim` entries
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Cosine similarity of every pair of vectors.
    ///
    /// The diagonal is exactly 1.0 for non-zero vectors; zero vectors score
    /// 0.0 against everything, themselves included.
    pub fn build(vectors: &[SparseVector]) -> Self {
        let dim = vectors.len();
        let norms: Vec<f32> = vectors.iter().map(SparseVector::norm).collect();
        let mut data = vec![0.0f32; dim * dim];

        for i in 0..dim {
            if norms[i] == 0.0 {
                continue;
            }
            data[i * dim + i] = 1.0;
            for j in (i + 1)..dim {
                if norms[j] == 0.0 {
                    continue;
                }
                // identical rows score exactly like the diagonal
                let score = if vectors[i] == vectors[j] {
                    1.0
                } else {
                    (vectors[i].dot(&vectors[j]) / (norms[i] * norms[j])).clamp(0.0, 1.0)
                };
                data[i * dim + j] = score;
                data[j * dim + i] = score;
            }
        }

        debug!(dim, "built similarity matrix");
        Self { dim, data }
    }

    /// Rebuild from persisted row-major data
    pub fn from_parts(dim: usize, data: Vec<f32>) -> Result<Self> {
        let matrix = Self { dim, data };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Number of rows (and columns)
    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.dim && j < self.dim {
            Some(self.data[i * self.dim + j])
        } else {
            None
        }
    }

    #[inline]
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        (i < self.dim).then(|| &self.data[i * self.dim..(i + 1) * self.dim])
    }

    /// Check shape, range, symmetry and diagonal
    pub fn validate(&self) -> Result<()> {
        let Some(expected) = self.dim.checked_mul(self.dim) else {
            return Err(Error::BundleIntegrity(format!(
                "similarity matrix dimension {} is too large",
                self.dim
            )));
        };
        if self.data.len() != expected {
            return Err(Error::BundleIntegrity(format!(
                "similarity matrix has {} entries, expected {}x{}",
                self.data.len(),
                self.dim,
                self.dim
            )));
        }
        for i in 0..self.dim {
            let diag = self.data[i * self.dim + i];
            if diag != 0.0 && diag != 1.0 {
                return Err(Error::BundleIntegrity(format!(
                    "similarity matrix diagonal at {} is {}",
                    i, diag
                )));
            }
            for j in i..self.dim {
                let a = self.data[i * self.dim + j];
                if !(0.0..=1.0).contains(&a) {
                    return Err(Error::BundleIntegrity(format!(
                        "similarity at ({}, {}) is out of range: {}",
                        i, j, a
                    )));
                }
                if a.to_bits() != self.data[j * self.dim + i].to_bits() {
                    return Err(Error::BundleIntegrity(format!(
                        "similarity matrix is not symmetric at ({}, {})",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Cosine similarity matrix of `vectors`
pub fn similarity(vectors: &[SparseVector]) -> SimilarityMatrix {
    SimilarityMatrix::build(vectors)
}
