//! Dense working copy for the factorizations that pivot while they
//! eliminate (Bunch–Kaufman and the SE family).
//!
//! The working matrix is kept fully symmetric so that a symmetric
//! interchange is a plain row and column swap.

use matdecomp_math::{CsrMatrix, Mat, SymmetricMatrix};
use matdecomp_permute::Permutation;
use matdecomp_types::constants::SPARSE_DROP_TOLERANCE;
use matdecomp_types::{DecompError, DecompResult};
use matdecomp_decomposition::TriangularFactor;

pub(crate) struct DenseWorkspace {
    /// Trailing matrix still to be eliminated (rows and columns `≥ k`).
    pub a: Mat<f64>,
    /// Unit lower factor, columns `< k` finished.
    pub l: Mat<f64>,
    /// `order[i]` is the position in the input of working position `i`.
    pub order: Vec<usize>,
}

impl DenseWorkspace {
    /// Copies `P·A·Pᵗ` densely, mirroring its lower triangle, subject to
    /// the entry ceiling for sparse input.
    pub fn new(
        matrix: &SymmetricMatrix,
        permutation: &Permutation,
        max_dense_entries: usize,
    ) -> DecompResult<Self> {
        let n = matrix.n();
        if permutation.len() != n {
            return Err(DecompError::DimensionMismatch {
                expected: n,
                found: permutation.len(),
            });
        }
        let entries = n.saturating_mul(n);
        if matrix.is_sparse() && entries > max_dense_entries {
            return Err(DecompError::NoDecompositionPossibleTooManyEntries {
                entries,
                limit: max_dense_entries,
            });
        }
        let mut a = permutation.permute_matrix(matrix)?.into_dense();
        for j in 0..n {
            for i in j + 1..n {
                a[(j, i)] = a[(i, j)];
            }
        }
        Ok(Self {
            a,
            l: Mat::<f64>::identity(n, n),
            order: (0..n).collect(),
        })
    }

    pub fn n(&self) -> usize {
        self.a.nrows()
    }

    /// Exchanges working positions `p` and `q`, both `≥ k`, given that
    /// columns `0..k` of `L` are finished.
    pub fn swap(&mut self, k: usize, p: usize, q: usize) {
        if p == q {
            return;
        }
        let n = self.n();
        for j in 0..n {
            let t = self.a[(p, j)];
            self.a[(p, j)] = self.a[(q, j)];
            self.a[(q, j)] = t;
        }
        for i in 0..n {
            let t = self.a[(i, p)];
            self.a[(i, p)] = self.a[(i, q)];
            self.a[(i, q)] = t;
        }
        for j in 0..k {
            let t = self.l[(p, j)];
            self.l[(p, j)] = self.l[(q, j)];
            self.l[(q, j)] = t;
        }
        self.order.swap(p, q);
    }

    /// Largest `|a_ik|` over `i > k`, with its row.
    pub fn column_max(&self, k: usize) -> (f64, usize) {
        let mut best = (0.0, k);
        for i in k + 1..self.n() {
            let v = self.a[(i, k)].abs();
            if v > best.0 {
                best = (v, i);
            }
        }
        best
    }

    /// Eliminates column `k` with the 1×1 pivot `a_kk`.
    pub fn eliminate_1x1(&mut self, k: usize) -> DecompResult<()> {
        let n = self.n();
        let d = self.a[(k, k)];
        if d == 0.0 {
            for i in k + 1..n {
                self.l[(i, k)] = 0.0;
            }
            return Ok(());
        }
        for i in k + 1..n {
            let v = self.a[(i, k)] / d;
            if !v.is_finite() {
                return Err(DecompError::DecompositionNotFinite { index: k });
            }
            self.l[(i, k)] = v;
        }
        for j in k + 1..n {
            let a_jk = self.a[(j, k)];
            for i in k + 1..n {
                self.a[(i, j)] -= self.l[(i, k)] * a_jk;
            }
        }
        Ok(())
    }

    /// Eliminates columns `k` and `k + 1` with the 2×2 pivot block.
    pub fn eliminate_2x2(&mut self, k: usize) -> DecompResult<()> {
        let n = self.n();
        let d11 = self.a[(k, k)];
        let d21 = self.a[(k + 1, k)];
        let d22 = self.a[(k + 1, k + 1)];
        let det = d11 * d22 - d21 * d21;
        for i in k + 2..n {
            let x = self.a[(i, k)];
            let y = self.a[(i, k + 1)];
            let l0 = (x * d22 - y * d21) / det;
            let l1 = (y * d11 - x * d21) / det;
            if !(l0.is_finite() && l1.is_finite()) {
                return Err(DecompError::DecompositionNotFinite { index: k });
            }
            self.l[(i, k)] = l0;
            self.l[(i, k + 1)] = l1;
        }
        for j in k + 2..n {
            let a_jk = self.a[(j, k)];
            let a_jk1 = self.a[(j, k + 1)];
            for i in k + 2..n {
                self.a[(i, j)] -= self.l[(i, k)] * a_jk + self.l[(i, k + 1)] * a_jk1;
            }
        }
        Ok(())
    }

    /// The interchanges as a permutation composed onto `permutation`.
    pub fn final_permutation(&self, permutation: &Permutation) -> DecompResult<Permutation> {
        let pivoting = Permutation::from_vec(self.order.clone())?;
        permutation.then(&pivoting)
    }
}

/// Wraps a dense factor in the storage class of `like`.
pub(crate) fn factor_like(like: &SymmetricMatrix, l: Mat<f64>) -> TriangularFactor {
    if like.is_sparse() {
        TriangularFactor::Sparse(CsrMatrix::from_dense(&l, SPARSE_DROP_TOLERANCE))
    } else {
        TriangularFactor::Dense(l)
    }
}
