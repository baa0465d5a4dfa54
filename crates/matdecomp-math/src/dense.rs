//! Dense kernels delegated to `faer`.
//!
//! Products and triangular solves on `Mat<f64>`. All kernels run
//! sequentially (`Par::Seq`); the engine is single-threaded.

use faer::linalg::matmul::matmul;
use faer::linalg::triangular_solve;
use faer::{Accum, Mat, MatMut, MatRef, Par};

/// Computes `lhs · rhs`.
pub fn mat_mul(lhs: MatRef<'_, f64>, rhs: MatRef<'_, f64>) -> Mat<f64> {
    let mut out = Mat::<f64>::zeros(lhs.nrows(), rhs.ncols());
    matmul(out.as_mut(), Accum::Replace, lhs, rhs, 1.0, Par::Seq);
    out
}

/// Computes `Xᵗ · A · X`.
pub fn congruence(a: MatRef<'_, f64>, x: MatRef<'_, f64>) -> Mat<f64> {
    let ax = mat_mul(a, x);
    mat_mul(x.transpose(), ax.as_ref())
}

/// Computes `L · diag(d) · Lᵗ` (or `L · Lᵗ` when `d` is `None`).
pub fn lower_product(l: MatRef<'_, f64>, d: Option<&[f64]>) -> Mat<f64> {
    let scaled = match d {
        Some(d) => Mat::from_fn(l.nrows(), l.ncols(), |i, j| l[(i, j)] * d[j]),
        None => l.to_owned(),
    };
    mat_mul(scaled.as_ref(), l.transpose())
}

/// Solves `L · X = B` in place, `L` lower triangular.
/// With `unit_diagonal`, the stored diagonal of `L` is ignored and taken as one.
pub fn solve_lower_in_place(l: MatRef<'_, f64>, rhs: MatMut<'_, f64>, unit_diagonal: bool) {
    if unit_diagonal {
        triangular_solve::solve_unit_lower_triangular_in_place(l, rhs, Par::Seq);
    } else {
        triangular_solve::solve_lower_triangular_in_place(l, rhs, Par::Seq);
    }
}

/// Solves `Lᵗ · X = B` in place, `L` lower triangular.
pub fn solve_lower_transpose_in_place(
    l: MatRef<'_, f64>,
    rhs: MatMut<'_, f64>,
    unit_diagonal: bool,
) {
    if unit_diagonal {
        triangular_solve::solve_unit_upper_triangular_in_place(l.transpose(), rhs, Par::Seq);
    } else {
        triangular_solve::solve_upper_triangular_in_place(l.transpose(), rhs, Par::Seq);
    }
}

/// Largest absolute entry-wise difference; infinite if shapes differ.
pub fn max_abs_diff(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> f64 {
    if a.nrows() != b.nrows() || a.ncols() != b.ncols() {
        return f64::INFINITY;
    }
    let mut max = 0.0f64;
    for j in 0..a.ncols() {
        for i in 0..a.nrows() {
            max = max.max((a[(i, j)] - b[(i, j)]).abs());
        }
    }
    max
}

/// Wraps a slice as an n×1 column.
pub fn column(values: &[f64]) -> Mat<f64> {
    Mat::from_fn(values.len(), 1, |i, _| values[i])
}
