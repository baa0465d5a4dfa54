//! Permutation value type.
//!
//! Convention: position `i` of the permuted problem holds original index
//! `p[i]`, so `(P·A·Pᵗ)[i][j] = A[p[i]][p[j]]` and `(P·x)[i] = x[p[i]]`.

use serde::{Deserialize, Serialize};

use matdecomp_math::{Mat, SymmetricMatrix};
use matdecomp_types::{DecompError, DecompResult};

/// A bijection on `0..n` with its inverse.
///
/// Invariant: `p[p_inverse[i]] == i` for all `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation {
    p: Vec<usize>,
    p_inverse: Vec<usize>,
}

impl Permutation {
    /// The identity on `0..n`.
    pub fn identity(n: usize) -> Self {
        Self {
            p: (0..n).collect(),
            p_inverse: (0..n).collect(),
        }
    }

    /// Validates `p` as a bijection on `0..p.len()` and computes its inverse.
    pub fn from_vec(p: Vec<usize>) -> DecompResult<Self> {
        let n = p.len();
        let mut p_inverse = vec![usize::MAX; n];
        for (i, &pi) in p.iter().enumerate() {
            if pi >= n {
                return Err(DecompError::InvalidPermutation(format!(
                    "index {pi} at position {i} is out of range for length {n}"
                )));
            }
            if p_inverse[pi] != usize::MAX {
                return Err(DecompError::InvalidPermutation(format!(
                    "index {pi} appears more than once"
                )));
            }
            p_inverse[pi] = i;
        }
        Ok(Self { p, p_inverse })
    }

    pub fn len(&self) -> usize {
        self.p.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    /// The forward index sequence `p`.
    pub fn p(&self) -> &[usize] {
        &self.p
    }

    /// The inverse index sequence.
    pub fn p_inverse(&self) -> &[usize] {
        &self.p_inverse
    }

    pub fn is_identity(&self) -> bool {
        self.p.iter().enumerate().all(|(i, &pi)| i == pi)
    }

    /// Returns the inverse permutation.
    pub fn inverse(&self) -> Self {
        Self {
            p: self.p_inverse.clone(),
            p_inverse: self.p.clone(),
        }
    }

    /// Composition: applying the result equals applying `self`, then `other`.
    pub fn then(&self, other: &Permutation) -> DecompResult<Self> {
        self.check_len(other.len())?;
        let p: Vec<usize> = other.p.iter().map(|&i| self.p[i]).collect();
        let mut p_inverse = vec![0; p.len()];
        for (i, &pi) in p.iter().enumerate() {
            p_inverse[pi] = i;
        }
        Ok(Self { p, p_inverse })
    }

    fn check_len(&self, found: usize) -> DecompResult<()> {
        if found != self.len() {
            return Err(DecompError::DimensionMismatch {
                expected: self.len(),
                found,
            });
        }
        Ok(())
    }

    /// Returns `P·x`.
    pub fn permute_vec(&self, x: &[f64]) -> DecompResult<Vec<f64>> {
        self.check_len(x.len())?;
        Ok(self.p.iter().map(|&i| x[i]).collect())
    }

    /// Returns `Pᵗ·y`, undoing [`permute_vec`](Self::permute_vec).
    pub fn unpermute_vec(&self, y: &[f64]) -> DecompResult<Vec<f64>> {
        self.check_len(y.len())?;
        Ok(self.p_inverse.iter().map(|&i| y[i]).collect())
    }

    /// Returns `P·X` (rows of a dense block permuted).
    pub fn permute_rows(&self, x: &Mat<f64>) -> DecompResult<Mat<f64>> {
        self.check_len(x.nrows())?;
        Ok(Mat::from_fn(x.nrows(), x.ncols(), |i, j| x[(self.p[i], j)]))
    }

    /// Returns `Pᵗ·Y`.
    pub fn unpermute_rows(&self, y: &Mat<f64>) -> DecompResult<Mat<f64>> {
        self.check_len(y.nrows())?;
        Ok(Mat::from_fn(y.nrows(), y.ncols(), |i, j| y[(self.p_inverse[i], j)]))
    }

    /// Returns `P·A·Pᵗ` in the storage class of `a`.
    pub fn permute_matrix(&self, a: &SymmetricMatrix) -> DecompResult<SymmetricMatrix> {
        self.apply_symmetric(a, &self.p, &self.p_inverse)
    }

    /// Returns `Pᵗ·A·P`, undoing [`permute_matrix`](Self::permute_matrix).
    pub fn unpermute_matrix(&self, a: &SymmetricMatrix) -> DecompResult<SymmetricMatrix> {
        self.apply_symmetric(a, &self.p_inverse, &self.p)
    }

    fn apply_symmetric(
        &self,
        a: &SymmetricMatrix,
        fwd: &[usize],
        inv: &[usize],
    ) -> DecompResult<SymmetricMatrix> {
        a.check_square()?;
        self.check_len(a.n())?;
        if self.is_identity() {
            return Ok(a.clone());
        }
        Ok(match a {
            SymmetricMatrix::Dense(m) => {
                SymmetricMatrix::Dense(Mat::from_fn(m.nrows(), m.ncols(), |i, j| {
                    m[(fwd[i], fwd[j])]
                }))
            }
            SymmetricMatrix::Sparse(m) => SymmetricMatrix::Sparse(m.symmetric_permute(fwd, inv)),
        })
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = DecompError;

    fn try_from(p: Vec<usize>) -> DecompResult<Self> {
        Self::from_vec(p)
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(perm: Permutation) -> Self {
        perm.p
    }
}
