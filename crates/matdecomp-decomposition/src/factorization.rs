//! The capability set shared by every decomposition shape.
//!
//! A shape only has to expose its permutation, its factors `L` and `D`
//! and a cache slot; solving, reconstruction, products and the definiteness
//! tests are provided here once for all three.

use std::sync::OnceLock;

use matdecomp_math::{Mat, SymmetricMatrix, dense};
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult, DecompositionType, Tolerance};

use crate::blocks::DiagonalPart;
use crate::factor::TriangularFactor;

/// Borrowed factors with `P·A·Pᵗ = L·D·Lᵗ`.
#[derive(Debug, Clone, Copy)]
pub struct Factors<'a> {
    pub l: &'a TriangularFactor,
    /// The diagonal of `L` is one regardless of what is stored.
    pub unit_diagonal: bool,
    pub d: DiagonalPart<'a>,
}

/// Operations of a decomposition `P·A·Pᵗ = L·D·Lᵗ`.
pub trait Factorization {
    fn decomposition_type(&self) -> DecompositionType;

    fn permutation(&self) -> &Permutation;

    fn factors(&self) -> Factors<'_>;

    /// Slot for the lazily reconstructed (unpermuted) matrix.
    fn composed_cache(&self) -> &OnceLock<SymmetricMatrix>;

    fn n(&self) -> usize {
        self.permutation().len()
    }

    fn p(&self) -> &[usize] {
        self.permutation().p()
    }

    fn p_inverse(&self) -> &[usize] {
        self.permutation().p_inverse()
    }

    fn type_str(&self) -> &'static str {
        self.decomposition_type().type_str()
    }

    fn is_sparse(&self) -> bool {
        self.factors().l.is_sparse()
    }

    fn is_permuted(&self) -> bool {
        !self.permutation().is_identity()
    }

    /// Index of the first column with a NaN or infinite factor entry.
    fn first_non_finite(&self) -> Option<usize> {
        let f = self.factors();
        match (f.l.first_non_finite_column(f.unit_diagonal), f.d.first_non_finite()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    fn check_finite(&self) -> DecompResult<()> {
        match self.first_non_finite() {
            Some(index) => Err(DecompError::DecompositionNotFinite { index }),
            None => Ok(()),
        }
    }

    /// Values whose signs give the inertia of `A` (Sylvester's law):
    /// the eigenvalues of `D`, or `diag(L)²` for the LL shape.
    fn pivot_values(&self) -> Vec<f64> {
        let f = self.factors();
        match f.d {
            DiagonalPart::Identity(_) if !f.unit_diagonal => {
                f.l.diagonal().iter().map(|v| v * v).collect()
            }
            d => d.eigenvalues(),
        }
    }

    /// Threshold below which a pivot value counts as zero.
    fn pivot_threshold(&self, tolerance: &Tolerance) -> f64 {
        let scale = self.pivot_values().iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        tolerance.zero_threshold(scale)
    }

    fn is_positive_definite(&self, tolerance: &Tolerance) -> bool {
        let threshold = self.pivot_threshold(tolerance);
        self.pivot_values().iter().all(|&v| v > threshold)
    }

    fn is_positive_semidefinite(&self, tolerance: &Tolerance) -> bool {
        let threshold = self.pivot_threshold(tolerance);
        self.pivot_values().iter().all(|&v| v >= -threshold)
    }

    fn is_singular(&self, tolerance: &Tolerance) -> bool {
        self.check_invertible(tolerance).is_err()
    }

    fn is_invertible(&self, tolerance: &Tolerance) -> bool {
        self.check_invertible(tolerance).is_ok()
    }

    /// Fails at the first pivot that is non-finite or zero within tolerance.
    fn check_invertible(&self, tolerance: &Tolerance) -> DecompResult<()> {
        let values = self.pivot_values();
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(DecompError::DecompositionNotFinite { index });
        }
        let threshold = self.pivot_threshold(tolerance);
        match values.iter().position(|v| v.abs() <= threshold) {
            Some(index) => Err(DecompError::DecompositionSingular {
                index,
                pivot: values[index],
            }),
            None => Ok(()),
        }
    }

    /// `L·D·Lᵗ`, i.e. the permuted matrix `P·A·Pᵗ`.
    fn composed_permuted_matrix(&self) -> DecompResult<SymmetricMatrix> {
        let f = self.factors();
        f.l.compose(f.unit_diagonal, &f.d)
    }

    /// The matrix `A` this decomposition represents, reconstructed once.
    fn composed_matrix(&self) -> DecompResult<&SymmetricMatrix> {
        if let Some(a) = self.composed_cache().get() {
            return Ok(a);
        }
        let a = self
            .permutation()
            .unpermute_matrix(&self.composed_permuted_matrix()?)?;
        Ok(self.composed_cache().get_or_init(|| a))
    }

    fn check_rows(&self, rows: usize) -> DecompResult<()> {
        if rows != self.n() {
            return Err(DecompError::DimensionMismatch {
                expected: self.n(),
                found: rows,
            });
        }
        Ok(())
    }

    /// Solves `A·X = B`.
    fn solve_matrix(&self, b: &Mat<f64>) -> DecompResult<Mat<f64>> {
        self.check_rows(b.nrows())?;
        self.check_invertible(&Tolerance::PIVOT)?;
        let f = self.factors();
        let mut y = self.permutation().permute_rows(b)?;
        f.l.solve_in_place(&mut y, f.unit_diagonal);
        f.d.solve_left(&mut y);
        f.l.solve_transpose_in_place(&mut y, f.unit_diagonal);
        self.permutation().unpermute_rows(&y)
    }

    /// Solves `A·x = b`.
    fn solve(&self, b: &[f64]) -> DecompResult<Vec<f64>> {
        let x = self.solve_matrix(&dense::column(b))?;
        Ok((0..x.nrows()).map(|i| x[(i, 0)]).collect())
    }

    /// Solves `A·x = b`, overwriting `b` with `x`.
    fn solve_in_place(&self, b: &mut [f64]) -> DecompResult<()> {
        let x = self.solve(b)?;
        b.copy_from_slice(&x);
        Ok(())
    }

    /// `A·X` from the factors.
    fn matrix_right_side_multiplication(&self, x: &Mat<f64>) -> DecompResult<Mat<f64>> {
        self.check_rows(x.nrows())?;
        let f = self.factors();
        let y = self.permutation().permute_rows(x)?;
        let mut w = f.l.transpose_mul(&y, f.unit_diagonal);
        f.d.apply_left(&mut w);
        let z = f.l.mul(&w, f.unit_diagonal);
        self.permutation().unpermute_rows(&z)
    }

    /// `Xᵗ·A·X` from the factors.
    fn matrix_both_sides_multiplication(&self, x: &Mat<f64>) -> DecompResult<Mat<f64>> {
        self.check_rows(x.nrows())?;
        let f = self.factors();
        let y = self.permutation().permute_rows(x)?;
        let w = f.l.transpose_mul(&y, f.unit_diagonal);
        let mut dw = w.clone();
        f.d.apply_left(&mut dw);
        Ok(dense::mat_mul(w.transpose(), dw.as_ref()))
    }

    /// `A⁻¹·X` without forming `A⁻¹`.
    fn inverse_matrix_right_side_multiplication(&self, x: &Mat<f64>) -> DecompResult<Mat<f64>> {
        self.solve_matrix(x)
    }

    /// `Xᵗ·A⁻¹·X` without forming `A⁻¹`.
    fn inverse_matrix_both_sides_multiplication(&self, x: &Mat<f64>) -> DecompResult<Mat<f64>> {
        self.check_rows(x.nrows())?;
        self.check_invertible(&Tolerance::PIVOT)?;
        let f = self.factors();
        let mut w = self.permutation().permute_rows(x)?;
        f.l.solve_in_place(&mut w, f.unit_diagonal);
        let mut dw = w.clone();
        f.d.solve_left(&mut dw);
        Ok(dense::mat_mul(w.transpose(), dw.as_ref()))
    }

    /// `P·A·Pᵗ` for an arbitrary compatible matrix.
    fn permute_matrix(&self, a: &SymmetricMatrix) -> DecompResult<SymmetricMatrix> {
        self.permutation().permute_matrix(a)
    }

    /// `Pᵗ·A·P` for an arbitrary compatible matrix.
    fn unpermute_matrix(&self, a: &SymmetricMatrix) -> DecompResult<SymmetricMatrix> {
        self.permutation().unpermute_matrix(a)
    }
}
