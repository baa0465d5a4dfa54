//! Factorization configuration.
//!
//! Parameters that control the factorizations: pivot policy and
//! thresholds, iteration and size ceilings, and the bounds of the
//! minimal-change approximation.

use std::fmt;

use serde::{Deserialize, Serialize};

use matdecomp_types::constants::{
    DEFAULT_MAX_DENSE_ENTRIES, DEFAULT_MAX_ITERATIONS, DEFAULT_PIVOT_ATOL, DEFAULT_PIVOT_RTOL,
};
use matdecomp_types::{DecompError, DecompResult};

/// Which factor shape the core produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorVariant {
    /// `P·A·Pᵗ = L·Lᵗ`.
    LL,
    /// `P·A·Pᵗ = L·D·Lᵗ` with unit `L`.
    LDL,
}

/// Which pivots the core accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotPolicy {
    /// Every pivot must exceed the threshold.
    PositiveDefinite,
    /// Pivots may vanish when the rest of their column vanishes too.
    PositiveSemidefinite,
    /// Pivots of either sign, bounded away from zero.
    Indefinite,
}

impl fmt::Display for PivotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PositiveDefinite => "positive_definite",
            Self::PositiveSemidefinite => "positive_semidefinite",
            Self::Indefinite => "indefinite",
        };
        f.write_str(name)
    }
}

/// Configuration of the unmodified factorizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorOptions {
    pub policy: PivotPolicy,

    /// Pivot threshold relative to the largest diagonal magnitude.
    pub pivot_rtol: f64,

    /// Absolute pivot threshold.
    pub pivot_atol: f64,

    /// Ceiling on `n²` when a sparse matrix needs a dense working copy.
    pub max_dense_entries: usize,
}

impl Default for FactorOptions {
    fn default() -> Self {
        Self {
            policy: PivotPolicy::PositiveDefinite,
            pivot_rtol: DEFAULT_PIVOT_RTOL,
            pivot_atol: DEFAULT_PIVOT_ATOL,
            max_dense_entries: DEFAULT_MAX_DENSE_ENTRIES,
        }
    }
}

impl FactorOptions {
    /// Accepts positive semidefinite input.
    pub fn semidefinite() -> Self {
        Self {
            policy: PivotPolicy::PositiveSemidefinite,
            ..Default::default()
        }
    }

    /// Accepts any sign of pivot.
    pub fn indefinite() -> Self {
        Self {
            policy: PivotPolicy::Indefinite,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> DecompResult<()> {
        if !(self.pivot_rtol >= 0.0 && self.pivot_rtol.is_finite()) {
            return Err(DecompError::InvalidOption(format!(
                "pivot_rtol must be finite and non-negative, got {}",
                self.pivot_rtol
            )));
        }
        if !(self.pivot_atol >= 0.0 && self.pivot_atol.is_finite()) {
            return Err(DecompError::InvalidOption(format!(
                "pivot_atol must be finite and non-negative, got {}",
                self.pivot_atol
            )));
        }
        Ok(())
    }

    /// Pivot threshold `τ = max(pivot_atol, pivot_rtol · max|a_ii|)`.
    pub fn threshold(&self, max_abs_diagonal: f64) -> f64 {
        self.pivot_atol.max(self.pivot_rtol * max_abs_diagonal)
    }
}

/// Configuration of the modified factorizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifiedOptions {
    /// Ceiling on rescaled retries after an overflow.
    pub max_iterations: usize,

    /// Ceiling on `n²` for the dense working copy of the SE family.
    pub max_dense_entries: usize,
}

impl Default for ModifiedOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_dense_entries: DEFAULT_MAX_DENSE_ENTRIES,
        }
    }
}

/// A bound on the diagonal of the approximation, shared or per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagonalBound {
    Scalar(f64),
    PerRow(Vec<f64>),
}

impl DiagonalBound {
    /// The bound for row `i` (original index).
    pub fn at(&self, i: usize) -> f64 {
        match self {
            Self::Scalar(v) => *v,
            Self::PerRow(v) => v[i],
        }
    }

    fn values(&self) -> &[f64] {
        match self {
            Self::Scalar(v) => std::slice::from_ref(v),
            Self::PerRow(v) => v,
        }
    }

    fn min(&self) -> f64 {
        self.values().iter().copied().fold(f64::INFINITY, f64::min)
    }

    fn max(&self) -> f64 {
        self.values().iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn check(&self, name: &str, n: usize, allow: f64) -> DecompResult<()> {
        if let Self::PerRow(v) = self {
            if v.len() != n {
                return Err(DecompError::DimensionMismatch {
                    expected: n,
                    found: v.len(),
                });
            }
        }
        match self.values().iter().find(|v| !(v.is_finite() || **v == allow)) {
            Some(bad) => Err(DecompError::InvalidOption(format!(
                "{name} must be finite or {allow}, got {bad}"
            ))),
            None => Ok(()),
        }
    }
}

/// Bounds of the minimal-change approximation `B` of `A` and its
/// factors `B = L·D·Lᵗ`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximationBounds {
    /// Lower bound on `B_ii`.
    pub min_diag_b: DiagonalBound,
    /// Upper bound on `B_ii`.
    pub max_diag_b: DiagonalBound,
    /// Lower bound on `d_i`; must be non-negative.
    pub min_diag_d: f64,
    /// Upper bound on `d_i`.
    pub max_diag_d: f64,
    /// Values of `d` below this magnitude are treated as zero.
    pub min_abs_value_d: f64,
    /// Newton iteration ceiling for the cubic sub-solves.
    pub max_iterations: usize,
    /// Ceiling on `n²` for the dense working factor of sparse input.
    pub max_dense_entries: usize,
}

impl Default for ApproximationBounds {
    fn default() -> Self {
        Self {
            min_diag_b: DiagonalBound::Scalar(f64::NEG_INFINITY),
            max_diag_b: DiagonalBound::Scalar(f64::INFINITY),
            min_diag_d: 0.0,
            max_diag_d: f64::INFINITY,
            min_abs_value_d: f64::EPSILON.sqrt(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_dense_entries: DEFAULT_MAX_DENSE_ENTRIES,
        }
    }
}

impl ApproximationBounds {
    /// Bounds of a positive semidefinite approximation.
    pub fn positive_semidefinite() -> Self {
        Self::default()
    }

    /// Bounds of a positive definite approximation (`d_i ≥ √ε`).
    pub fn positive_definite() -> Self {
        Self {
            min_diag_d: f64::EPSILON.sqrt(),
            ..Default::default()
        }
    }

    /// The zero threshold actually applied to `d`.
    pub fn effective_min_abs_value_d(&self) -> f64 {
        self.min_abs_value_d.max(f64::EPSILON)
    }

    /// Checks every bound against a matrix of dimension `n`.
    pub fn validate(&self, n: usize) -> DecompResult<()> {
        self.min_diag_b.check("min_diag_b", n, f64::NEG_INFINITY)?;
        self.max_diag_b.check("max_diag_b", n, f64::INFINITY)?;
        if !(self.min_diag_d >= 0.0 && self.min_diag_d.is_finite()) {
            return Err(DecompError::InvalidOption(format!(
                "min_diag_d must be finite and non-negative, got {}",
                self.min_diag_d
            )));
        }
        if !(self.max_diag_d.is_finite() || self.max_diag_d == f64::INFINITY) {
            return Err(DecompError::InvalidOption(format!(
                "max_diag_d must be finite or inf, got {}",
                self.max_diag_d
            )));
        }
        if !(self.min_abs_value_d >= 0.0 && self.min_abs_value_d.is_finite()) {
            return Err(DecompError::InvalidOption(format!(
                "min_abs_value_d must be finite and non-negative, got {}",
                self.min_abs_value_d
            )));
        }
        let lower = self.min_diag_b.max().max(self.min_diag_d);
        let upper = self.max_diag_b.min().min(self.max_diag_d);
        if lower > upper {
            return Err(DecompError::InvalidOption(format!(
                "lower diagonal bounds ({lower}) exceed upper diagonal bounds ({upper})"
            )));
        }
        Ok(())
    }
}
