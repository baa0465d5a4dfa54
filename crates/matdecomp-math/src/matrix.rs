//! Uniform view over dense and sparse symmetric matrices.
//!
//! [`SymmetricMatrix`] is what every other matdecomp crate consumes. It
//! answers shape and diagonal queries, validates input (square, finite,
//! symmetric) and converts between storage classes without ever mutating
//! the caller's data.

use faer::Mat;
use serde::{Deserialize, Serialize};

use matdecomp_types::{DecompError, DecompResult, StorageKind, Tolerance};

use crate::dense;
use crate::sparse::CsrMatrix;

/// A square matrix expected to be symmetric, in dense or sparse storage.
#[derive(Debug, Clone)]
pub enum SymmetricMatrix {
    /// Full n×n storage.
    Dense(Mat<f64>),
    /// CSR storage with both triangles present.
    Sparse(CsrMatrix),
}

impl SymmetricMatrix {
    /// Builds a dense matrix from rows.
    ///
    /// Ragged rows give `MatrixNotSquare`.
    pub fn from_rows(rows: &[Vec<f64>]) -> DecompResult<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(DecompError::MatrixNotSquare {
                rows: n,
                cols: bad.len(),
            });
        }
        Ok(Self::Dense(Mat::from_fn(n, n, |i, j| rows[i][j])))
    }

    /// Builds a dense diagonal matrix.
    pub fn from_diagonal(diagonal: &[f64]) -> Self {
        let n = diagonal.len();
        Self::Dense(Mat::from_fn(n, n, |i, j| if i == j { diagonal[i] } else { 0.0 }))
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Dense(m) => (m.nrows(), m.ncols()),
            Self::Sparse(m) => (m.rows, m.cols),
        }
    }

    /// Returns the number of rows.
    pub fn n(&self) -> usize {
        self.shape().0
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }

    pub fn storage(&self) -> StorageKind {
        match self {
            Self::Dense(_) => StorageKind::Dense,
            Self::Sparse(_) => StorageKind::Sparse,
        }
    }

    /// Returns entry `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match self {
            Self::Dense(m) => m[(i, j)],
            Self::Sparse(m) => m.get(i, j),
        }
    }

    /// Returns the main diagonal.
    pub fn diagonal(&self) -> Vec<f64> {
        match self {
            Self::Dense(m) => (0..m.nrows().min(m.ncols())).map(|i| m[(i, i)]).collect(),
            Self::Sparse(m) => m.diagonal(),
        }
    }

    /// Returns true if no entry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    fn first_non_finite(&self) -> Option<(usize, usize)> {
        match self {
            Self::Dense(m) => (0..m.nrows()).find_map(|i| {
                (0..m.ncols())
                    .find(|&j| !m[(i, j)].is_finite())
                    .map(|j| (i, j))
            }),
            Self::Sparse(m) => m.first_non_finite(),
        }
    }

    /// Fails with `MatrixNotSquare` if rows ≠ cols.
    pub fn check_square(&self) -> DecompResult<()> {
        let (rows, cols) = self.shape();
        if rows != cols {
            return Err(DecompError::MatrixNotSquare { rows, cols });
        }
        Ok(())
    }

    /// Fails with `MatrixNotFinite` at the first NaN or infinite entry.
    pub fn check_finite(&self) -> DecompResult<()> {
        match self.first_non_finite() {
            Some((row, col)) => Err(DecompError::MatrixNotFinite { row, col }),
            None => Ok(()),
        }
    }

    /// Fails with `MatrixNotHermitian` at the first pair `(i, j)` with
    /// `A[i][j]` not close to `A[j][i]`.
    pub fn check_hermitian(&self, tolerance: &Tolerance) -> DecompResult<()> {
        self.check_square()?;
        let close = |a: f64, b: f64| tolerance.is_close(a, b) || tolerance.is_close(b, a);
        match self {
            Self::Dense(m) => {
                for j in 0..m.ncols() {
                    for i in (j + 1)..m.nrows() {
                        if !close(m[(i, j)], m[(j, i)]) {
                            return Err(DecompError::MatrixNotHermitian { row: i, col: j });
                        }
                    }
                }
            }
            Self::Sparse(m) => {
                // Every stored entry is checked against its mirror, which
                // also catches entries stored on one side only.
                for i in 0..m.rows {
                    for (j, v) in m.row(i) {
                        if j != i && !close(v, m.get(j, i)) {
                            let (row, col) = if i > j { (i, j) } else { (j, i) };
                            return Err(DecompError::MatrixNotHermitian { row, col });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true if [`check_hermitian`](Self::check_hermitian) passes.
    pub fn is_hermitian(&self, tolerance: &Tolerance) -> bool {
        self.check_hermitian(tolerance).is_ok()
    }

    /// Returns a dense copy.
    pub fn to_dense(&self) -> Mat<f64> {
        match self {
            Self::Dense(m) => m.clone(),
            Self::Sparse(m) => m.to_dense(),
        }
    }

    /// Consumes the matrix and returns dense storage, reusing the buffer
    /// when already dense.
    pub fn into_dense(self) -> Mat<f64> {
        match self {
            Self::Dense(m) => m,
            Self::Sparse(m) => m.to_dense(),
        }
    }

    /// Returns a sparse copy (exact zeros off the diagonal are dropped).
    pub fn to_sparse(&self) -> CsrMatrix {
        match self {
            Self::Dense(m) => CsrMatrix::from_dense(m, 0.0),
            Self::Sparse(m) => m.clone(),
        }
    }

    /// Computes `A·x`.
    pub fn mul_vec(&self, x: &[f64]) -> DecompResult<Vec<f64>> {
        let (rows, cols) = self.shape();
        if x.len() != cols {
            return Err(DecompError::DimensionMismatch {
                expected: cols,
                found: x.len(),
            });
        }
        Ok(match self {
            Self::Dense(m) => {
                let y = dense::mat_mul(m.as_ref(), dense::column(x).as_ref());
                (0..rows).map(|i| y[(i, 0)]).collect()
            }
            Self::Sparse(m) => m.mul_vec(x),
        })
    }

    /// Computes `A·X`.
    pub fn mul_mat(&self, x: &Mat<f64>) -> DecompResult<Mat<f64>> {
        let cols = self.shape().1;
        if x.nrows() != cols {
            return Err(DecompError::DimensionMismatch {
                expected: cols,
                found: x.nrows(),
            });
        }
        Ok(match self {
            Self::Dense(m) => dense::mat_mul(m.as_ref(), x.as_ref()),
            Self::Sparse(m) => m.mul_dense(x),
        })
    }

    /// Largest absolute diagonal entry (0 for an empty matrix).
    pub fn max_abs_diagonal(&self) -> f64 {
        self.diagonal().iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// Largest absolute off-diagonal entry of the lower triangle.
    pub fn max_abs_off_diagonal(&self) -> f64 {
        let mut max = 0.0f64;
        match self {
            Self::Dense(m) => {
                for j in 0..m.ncols() {
                    for i in (j + 1)..m.nrows() {
                        max = max.max(m[(i, j)].abs());
                    }
                }
            }
            Self::Sparse(m) => {
                for i in 0..m.rows {
                    for (j, v) in m.row(i) {
                        if j < i {
                            max = max.max(v.abs());
                        }
                    }
                }
            }
        }
        max
    }

    /// Number of stored entries (n² for dense).
    pub fn entries(&self) -> usize {
        match self {
            Self::Dense(m) => m.nrows() * m.ncols(),
            Self::Sparse(m) => m.nnz(),
        }
    }

    /// Largest absolute entry-wise difference to `other` (infinite if
    /// shapes differ).
    pub fn max_abs_diff(&self, other: &SymmetricMatrix) -> f64 {
        match (self, other) {
            (Self::Dense(a), Self::Dense(b)) => dense::max_abs_diff(a.as_ref(), b.as_ref()),
            _ => dense::max_abs_diff(self.to_dense().as_ref(), other.to_dense().as_ref()),
        }
    }

    /// Returns true if all entries are close to those of `other`.
    pub fn is_close(&self, other: &SymmetricMatrix, tolerance: &Tolerance) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        let (rows, cols) = self.shape();
        match (self, other) {
            (Self::Sparse(a), Self::Sparse(b)) => (0..rows).all(|i| {
                a.row(i).all(|(j, v)| tolerance.is_close(v, b.get(i, j)))
                    && b.row(i).all(|(j, v)| tolerance.is_close(a.get(i, j), v))
            }),
            _ => {
                let (a, b) = (self.to_dense(), other.to_dense());
                (0..cols).all(|j| (0..rows).all(|i| tolerance.is_close(a[(i, j)], b[(i, j)])))
            }
        }
    }
}

impl From<Mat<f64>> for SymmetricMatrix {
    fn from(m: Mat<f64>) -> Self {
        Self::Dense(m)
    }
}

impl From<CsrMatrix> for SymmetricMatrix {
    fn from(m: CsrMatrix) -> Self {
        Self::Sparse(m)
    }
}

/// Serializable form of a [`SymmetricMatrix`].
///
/// Dense storage is written column-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoredMatrix {
    Dense {
        rows: usize,
        cols: usize,
        values: Vec<f64>,
    },
    Sparse(CsrMatrix),
}

impl From<&SymmetricMatrix> for StoredMatrix {
    fn from(m: &SymmetricMatrix) -> Self {
        match m {
            SymmetricMatrix::Dense(d) => {
                let (rows, cols) = (d.nrows(), d.ncols());
                let mut values = Vec::with_capacity(rows * cols);
                for j in 0..cols {
                    for i in 0..rows {
                        values.push(d[(i, j)]);
                    }
                }
                StoredMatrix::Dense { rows, cols, values }
            }
            SymmetricMatrix::Sparse(s) => StoredMatrix::Sparse(s.clone()),
        }
    }
}

impl TryFrom<StoredMatrix> for SymmetricMatrix {
    type Error = DecompError;

    fn try_from(stored: StoredMatrix) -> DecompResult<Self> {
        match stored {
            StoredMatrix::Dense { rows, cols, values } => {
                if values.len() != rows * cols {
                    return Err(DecompError::DimensionMismatch {
                        expected: rows * cols,
                        found: values.len(),
                    });
                }
                Ok(Self::Dense(Mat::from_fn(rows, cols, |i, j| values[j * rows + i])))
            }
            StoredMatrix::Sparse(s) => {
                s.validate()?;
                Ok(Self::Sparse(s))
            }
        }
    }
}
