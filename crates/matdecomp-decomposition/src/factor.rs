//! Lower-triangular factor storage.
//!
//! A [`TriangularFactor`] is dense or sparse like the matrix it came from.
//! With `unit_diagonal` set, the stored diagonal is ignored and taken as
//! one; this lets the compressed layout keep `D` on the diagonal.

use matdecomp_math::{CsrMatrix, Mat, StoredMatrix, SymmetricMatrix, dense};
use matdecomp_types::{DecompError, DecompResult};

use crate::blocks::DiagonalPart;

/// Lower-triangular `L`. Entries above the diagonal are never read.
#[derive(Debug, Clone)]
pub enum TriangularFactor {
    Dense(Mat<f64>),
    Sparse(CsrMatrix),
}

impl TriangularFactor {
    pub fn n(&self) -> usize {
        match self {
            Self::Dense(m) => m.nrows(),
            Self::Sparse(m) => m.rows,
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }

    /// Returns `L[i][j]` (zero above the diagonal).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            return 0.0;
        }
        match self {
            Self::Dense(m) => m[(i, j)],
            Self::Sparse(m) => m.get(i, j),
        }
    }

    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.n()).map(|i| self.get(i, i)).collect()
    }

    /// Stored off-diagonal entries of row `i` as `(col, value)`.
    fn row_lower(&self, i: usize) -> Vec<(usize, f64)> {
        match self {
            Self::Dense(m) => (0..i).map(|j| (j, m[(i, j)])).filter(|&(_, v)| v != 0.0).collect(),
            Self::Sparse(m) => m.row(i).filter(|&(j, _)| j < i).collect(),
        }
    }

    /// For each column, whether any entry below the diagonal is non-zero.
    pub fn columns_with_off_diagonal(&self) -> Vec<bool> {
        let mut has = vec![false; self.n()];
        for i in 0..self.n() {
            for (j, v) in self.row_lower(i) {
                if v != 0.0 {
                    has[j] = true;
                }
            }
        }
        has
    }

    /// Column of the first NaN or infinite entry in the lower triangle.
    pub fn first_non_finite_column(&self, unit_diagonal: bool) -> Option<usize> {
        let mut first: Option<usize> = None;
        for i in 0..self.n() {
            if !unit_diagonal && !self.get(i, i).is_finite() {
                first = Some(first.map_or(i, |f| f.min(i)));
            }
            for (j, v) in self.row_lower(i) {
                if !v.is_finite() {
                    first = Some(first.map_or(j, |f| f.min(j)));
                }
            }
        }
        first
    }

    /// Returns a copy with every entry replaced by `f(i, j, value)`.
    /// The diagonal is always kept in sparse storage.
    pub fn map(&self, f: impl Fn(usize, usize, f64) -> f64) -> Self {
        match self {
            Self::Dense(m) => Self::Dense(Mat::from_fn(m.nrows(), m.ncols(), |i, j| {
                if j > i { 0.0 } else { f(i, j, m[(i, j)]) }
            })),
            Self::Sparse(m) => {
                // Rows are sorted, so the strict lower part comes first and
                // the diagonal closes each row.
                let mut out = CsrMatrix::new(m.rows, m.cols);
                for i in 0..m.rows {
                    let mut diagonal = 0.0;
                    for (j, v) in m.row(i) {
                        if j < i {
                            let w = f(i, j, v);
                            if w != 0.0 {
                                out.col_idx.push(j);
                                out.values.push(w);
                            }
                        } else if j == i {
                            diagonal = v;
                        }
                    }
                    out.col_idx.push(i);
                    out.values.push(f(i, i, diagonal));
                    out.row_ptr[i + 1] = out.col_idx.len();
                }
                Self::Sparse(out)
            }
        }
    }

    /// Returns `L·diag(scale)`.
    pub fn scale_columns(&self, scale: &[f64]) -> Self {
        self.map(|_, j, v| v * scale[j])
    }

    /// Returns a copy whose diagonal is `diagonal`.
    pub fn with_diagonal(&self, diagonal: &[f64]) -> Self {
        self.map(|i, j, v| if i == j { diagonal[i] } else { v })
    }

    /// Solves `L·X = B` in place.
    pub fn solve_in_place(&self, rhs: &mut Mat<f64>, unit_diagonal: bool) {
        match self {
            Self::Dense(l) => dense::solve_lower_in_place(l.as_ref(), rhs.as_mut(), unit_diagonal),
            Self::Sparse(l) => {
                for c in 0..rhs.ncols() {
                    for i in 0..l.rows {
                        let mut acc = rhs[(i, c)];
                        let mut pivot = 1.0;
                        for (j, v) in l.row(i) {
                            if j < i {
                                acc -= v * rhs[(j, c)];
                            } else if j == i && !unit_diagonal {
                                pivot = v;
                            }
                        }
                        rhs[(i, c)] = acc / pivot;
                    }
                }
            }
        }
    }

    /// Solves `Lᵗ·X = B` in place.
    pub fn solve_transpose_in_place(&self, rhs: &mut Mat<f64>, unit_diagonal: bool) {
        match self {
            Self::Dense(l) => {
                dense::solve_lower_transpose_in_place(l.as_ref(), rhs.as_mut(), unit_diagonal)
            }
            Self::Sparse(l) => {
                // Column-oriented on Lᵗ: finalize x_i, then eliminate it from
                // the rows above.
                for c in 0..rhs.ncols() {
                    for i in (0..l.rows).rev() {
                        if !unit_diagonal {
                            rhs[(i, c)] /= l.get(i, i);
                        }
                        let xi = rhs[(i, c)];
                        for (j, v) in l.row(i) {
                            if j < i {
                                rhs[(j, c)] -= v * xi;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Computes `L·X`.
    pub fn mul(&self, x: &Mat<f64>, unit_diagonal: bool) -> Mat<f64> {
        let n = self.n();
        let mut out = Mat::<f64>::zeros(n, x.ncols());
        for i in 0..n {
            let d = if unit_diagonal { 1.0 } else { self.get(i, i) };
            let lower = self.row_lower(i);
            for c in 0..x.ncols() {
                let mut acc = d * x[(i, c)];
                for &(j, v) in &lower {
                    acc += v * x[(j, c)];
                }
                out[(i, c)] = acc;
            }
        }
        out
    }

    /// Computes `Lᵗ·X`.
    pub fn transpose_mul(&self, x: &Mat<f64>, unit_diagonal: bool) -> Mat<f64> {
        let n = self.n();
        let mut out = Mat::<f64>::zeros(n, x.ncols());
        for i in 0..n {
            let d = if unit_diagonal { 1.0 } else { self.get(i, i) };
            let lower = self.row_lower(i);
            for c in 0..x.ncols() {
                let xi = x[(i, c)];
                out[(i, c)] += d * xi;
                for &(j, v) in &lower {
                    out[(j, c)] += v * xi;
                }
            }
        }
        out
    }

    /// Computes `L·D·Lᵗ` in the storage class of `L`.
    pub fn compose(&self, unit_diagonal: bool, d: &DiagonalPart<'_>) -> DecompResult<SymmetricMatrix> {
        match self {
            Self::Dense(l) => {
                let n = l.nrows();
                let unit = Mat::from_fn(n, n, |i, j| match (i == j, j < i) {
                    (true, _) if unit_diagonal => 1.0,
                    (true, _) | (false, true) => l[(i, j)],
                    _ => 0.0,
                });
                let mut ld = unit.clone();
                d.apply_right(&mut ld);
                Ok(SymmetricMatrix::Dense(dense::mat_mul(ld.as_ref(), unit.transpose())))
            }
            Self::Sparse(l) => {
                let n = l.rows;
                // Columns of L as (row, value) lists.
                let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
                for i in 0..n {
                    for (j, v) in l.row(i) {
                        if j < i {
                            columns[j].push((i, v));
                        } else if j == i && !unit_diagonal {
                            columns[j].push((i, v));
                        }
                    }
                    if unit_diagonal {
                        columns[i].push((i, 1.0));
                    }
                }
                for col in &mut columns {
                    col.sort_unstable_by_key(|&(r, _)| r);
                }

                let mut triplets = Vec::new();
                for k in 0..n {
                    let coupling = d.block_partner(k);
                    for &(i, vi) in &columns[k] {
                        for &(j, vj) in &columns[k] {
                            triplets.push((i, j, d.diagonal_value(k) * vi * vj));
                        }
                        if let Some((partner, b)) = coupling {
                            for &(j, vj) in &columns[partner] {
                                triplets.push((i, j, b * vi * vj));
                            }
                        }
                    }
                }
                let composed = CsrMatrix::from_triplets(n, n, &triplets)?;
                Ok(SymmetricMatrix::Sparse(composed.pruned(0.0)))
            }
        }
    }
}

impl From<&TriangularFactor> for StoredMatrix {
    fn from(factor: &TriangularFactor) -> Self {
        match factor {
            TriangularFactor::Dense(m) => StoredMatrix::from(&SymmetricMatrix::Dense(m.clone())),
            TriangularFactor::Sparse(m) => StoredMatrix::Sparse(m.clone()),
        }
    }
}

impl TryFrom<StoredMatrix> for TriangularFactor {
    type Error = DecompError;

    fn try_from(stored: StoredMatrix) -> DecompResult<Self> {
        let matrix = SymmetricMatrix::try_from(stored)?;
        matrix.check_square()?;
        Ok(match matrix {
            SymmetricMatrix::Dense(m) => Self::Dense(m),
            SymmetricMatrix::Sparse(m) => Self::Sparse(m),
        })
    }
}
