//! Sparse matrix representation and solver interface.
//!
//! Provides a CSR (Compressed Sparse Row) matrix of `f64` values and a
//! trait for direct solvers. Symmetric matrices are stored in full
//! (both triangles); the factorizations read the lower triangle.

use faer::Mat;
use serde::{Deserialize, Serialize};

use matdecomp_types::{DecompError, DecompResult};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. Column indices within a row
/// are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates the n×n identity.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: n,
            cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![1.0; n],
        }
    }

    /// Returns the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> DecompResult<Self> {
        if let Some(&(row, col, _)) = triplets.iter().find(|&&(r, c, _)| r >= rows || c >= cols) {
            return Err(DecompError::MatrixIndexOutOfBounds { row, col, rows, cols });
        }
        Ok(Self::assemble(rows, cols, triplets))
    }

    /// Assembles triplets whose indices are known to be in range.
    fn assemble(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        // Count entries per row
        let mut row_counts = vec![0usize; rows];
        for &(r, _, _) in triplets {
            row_counts[r] += 1;
        }

        // Build row_ptr
        let mut row_ptr = vec![0usize; rows + 1];
        for i in 0..rows {
            row_ptr[i + 1] = row_ptr[i] + row_counts[i];
        }

        let nnz = row_ptr[rows];
        let mut entries = vec![(0usize, 0.0f64); nnz];

        // Fill in — use a copy of row_ptr as write cursor
        let mut cursor = row_ptr[..rows].to_vec();
        for &(r, c, v) in triplets {
            entries[cursor[r]] = (c, v);
            cursor[r] += 1;
        }

        // Sort each row by column index and merge duplicates
        let mut out_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        for i in 0..rows {
            let row = &mut entries[row_ptr[i]..row_ptr[i + 1]];
            row.sort_by_key(|&(c, _)| c);
            let row_start = col_idx.len();
            for &(c, v) in row.iter() {
                if col_idx.len() > row_start && col_idx[col_idx.len() - 1] == c {
                    let last = values.len() - 1;
                    values[last] += v;
                } else {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            out_ptr[i + 1] = col_idx.len();
        }

        Self {
            rows,
            cols,
            row_ptr: out_ptr,
            col_idx,
            values,
        }
    }

    /// Converts a dense matrix, keeping entries with `|v| > drop_tolerance`
    /// and always keeping the diagonal.
    pub fn from_dense(mat: &Mat<f64>, drop_tolerance: f64) -> Self {
        let (rows, cols) = (mat.nrows(), mat.ncols());
        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..rows {
            for j in 0..cols {
                let v = mat[(i, j)];
                if i == j || v.abs() > drop_tolerance || v.is_nan() {
                    col_idx.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Checks the structural invariants (used after deserialization).
    pub fn validate(&self) -> DecompResult<()> {
        let fail = |reason: String| Err(DecompError::InvalidOption(reason));
        if self.row_ptr.len() != self.rows + 1 {
            return fail(format!(
                "row_ptr length {} != rows + 1 = {}",
                self.row_ptr.len(),
                self.rows + 1
            ));
        }
        if self.col_idx.len() != self.values.len() {
            return fail("col_idx and values lengths differ".into());
        }
        if self.row_ptr[0] != 0 || self.row_ptr[self.rows] != self.values.len() {
            return fail("row_ptr does not span the stored entries".into());
        }
        for i in 0..self.rows {
            if self.row_ptr[i] > self.row_ptr[i + 1] {
                return fail(format!("row_ptr decreases at row {i}"));
            }
            let idx = self.row_indices(i);
            if idx.iter().any(|&c| c >= self.cols) {
                return fail(format!("column index out of range in row {i}"));
            }
            if idx.windows(2).any(|w| w[0] >= w[1]) {
                return fail(format!("column indices of row {i} are not increasing"));
            }
        }
        Ok(())
    }

    /// Column indices stored in row `i`.
    #[inline]
    pub fn row_indices(&self, i: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[i]..self.row_ptr[i + 1]]
    }

    /// Values stored in row `i`.
    #[inline]
    pub fn row_values(&self, i: usize) -> &[f64] {
        &self.values[self.row_ptr[i]..self.row_ptr[i + 1]]
    }

    /// Iterates over `(col, value)` pairs of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.row_indices(i)
            .iter()
            .copied()
            .zip(self.row_values(i).iter().copied())
    }

    /// Returns entry `(i, j)`, zero if not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let idx = self.row_indices(i);
        match idx.binary_search(&j) {
            Ok(pos) => self.values[self.row_ptr[i] + pos],
            Err(_) => 0.0,
        }
    }

    /// Returns the main diagonal.
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    /// Returns the position of the first NaN or infinite entry.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        (0..self.rows).find_map(|i| {
            self.row(i)
                .find(|(_, v)| !v.is_finite())
                .map(|(j, _)| (i, j))
        })
    }

    /// Returns the transpose.
    pub fn transpose(&self) -> Self {
        let mut counts = vec![0usize; self.cols + 1];
        for &c in &self.col_idx {
            counts[c + 1] += 1;
        }
        for j in 0..self.cols {
            counts[j + 1] += counts[j];
        }
        let row_ptr = counts.clone();
        let mut cursor = counts;
        let mut col_idx = vec![0usize; self.nnz()];
        let mut values = vec![0.0f64; self.nnz()];
        // Rows are visited in order, so each output row stays sorted.
        for i in 0..self.rows {
            for (j, v) in self.row(i) {
                let pos = cursor[j];
                col_idx[pos] = i;
                values[pos] = v;
                cursor[j] += 1;
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns the lower triangle (entries with `col <= row`).
    pub fn lower_triangle(&self) -> Self {
        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..self.rows {
            for (j, v) in self.row(i) {
                if j <= i {
                    col_idx.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns `B` with `B[i][j] = A[p[i]][p[j]]` for a permutation vector
    /// `p` and its inverse `p_inverse`.
    pub fn symmetric_permute(&self, p: &[usize], p_inverse: &[usize]) -> Self {
        debug_assert_eq!(p.len(), self.rows);
        let mut triplets = Vec::with_capacity(self.nnz());
        for (new_i, &old_i) in p.iter().enumerate() {
            for (old_j, v) in self.row(old_i) {
                triplets.push((new_i, p_inverse[old_j], v));
            }
        }
        Self::assemble(self.rows, self.cols, &triplets)
    }

    /// Returns `A + diag(e)`, inserting diagonal entries where needed.
    pub fn add_diagonal(&self, e: &[f64]) -> DecompResult<Self> {
        if e.len() != self.rows.min(self.cols) {
            return Err(DecompError::DimensionMismatch {
                expected: self.rows.min(self.cols),
                found: e.len(),
            });
        }
        let mut triplets: Vec<(usize, usize, f64)> = (0..self.rows)
            .flat_map(|i| self.row(i).map(move |(j, v)| (i, j, v)))
            .collect();
        triplets.extend(e.iter().enumerate().filter(|&(_, &v)| v != 0.0).map(|(i, &v)| (i, i, v)));
        Ok(Self::assemble(self.rows, self.cols, &triplets))
    }

    /// Computes `A·x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.cols);
        (0..self.rows)
            .map(|i| self.row(i).map(|(j, v)| v * x[j]).sum())
            .collect()
    }

    /// Computes `A·X` for a dense `X`.
    pub fn mul_dense(&self, x: &Mat<f64>) -> Mat<f64> {
        debug_assert_eq!(x.nrows(), self.cols);
        let mut out = Mat::<f64>::zeros(self.rows, x.ncols());
        for i in 0..self.rows {
            for (k, v) in self.row(i) {
                for j in 0..x.ncols() {
                    out[(i, j)] += v * x[(k, j)];
                }
            }
        }
        out
    }

    /// Converts to dense storage.
    pub fn to_dense(&self) -> Mat<f64> {
        let mut out = Mat::<f64>::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for (j, v) in self.row(i) {
                out[(i, j)] = v;
            }
        }
        out
    }

    /// Returns a copy with entries `|v| <= tolerance` removed (diagonal kept).
    pub fn pruned(&self, tolerance: f64) -> Self {
        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for i in 0..self.rows {
            for (j, v) in self.row(i) {
                if i == j || v.abs() > tolerance || v.is_nan() {
                    col_idx.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        }
    }
}

/// Trait for direct solvers of symmetric positive-definite systems.
///
/// Implementations: [`FaerSolver`](crate::faer_solver::FaerSolver).
pub trait DirectSolver {
    /// Factorize the matrix. Call once per matrix.
    fn factorize(&mut self, matrix: &CsrMatrix) -> DecompResult<()>;

    /// Solve `A x = b` using the pre-computed factorization.
    /// Returns `x` in the provided output buffer.
    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> DecompResult<()>;

    /// Returns true if the solver holds a valid factorization.
    fn is_factorized(&self) -> bool;
}
