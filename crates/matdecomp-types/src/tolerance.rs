//! Absolute/relative tolerance pair used by equality and property checks.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ATOL, DEFAULT_PIVOT_ATOL, DEFAULT_PIVOT_RTOL, DEFAULT_RTOL};
use crate::error::{DecompError, DecompResult};

/// Tolerance pair with `numpy.isclose` semantics:
/// `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Absolute tolerance.
    pub atol: f64,
    /// Relative tolerance.
    pub rtol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            atol: DEFAULT_ATOL,
            rtol: DEFAULT_RTOL,
        }
    }
}

impl Tolerance {
    /// Creates a tolerance pair, rejecting negative or NaN values.
    pub fn new(atol: f64, rtol: f64) -> DecompResult<Self> {
        let tol = Self { atol, rtol };
        tol.validate()?;
        Ok(tol)
    }

    /// Exact comparison.
    pub const EXACT: Tolerance = Tolerance { atol: 0.0, rtol: 0.0 };

    /// Threshold for treating a pivot as zero during elimination, solves
    /// and the definiteness checks.
    pub const PIVOT: Tolerance = Tolerance {
        atol: DEFAULT_PIVOT_ATOL,
        rtol: DEFAULT_PIVOT_RTOL,
    };

    /// Checks that both tolerances are finite and non-negative.
    pub fn validate(&self) -> DecompResult<()> {
        if !(self.atol >= 0.0 && self.atol.is_finite()) {
            return Err(DecompError::InvalidOption(format!(
                "atol must be finite and non-negative, got {}",
                self.atol
            )));
        }
        if !(self.rtol >= 0.0 && self.rtol.is_finite()) {
            return Err(DecompError::InvalidOption(format!(
                "rtol must be finite and non-negative, got {}",
                self.rtol
            )));
        }
        Ok(())
    }

    /// Returns true if `a` is close to `b`.
    #[inline]
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }

    /// Returns the threshold below which a value counts as zero relative to `scale`.
    #[inline]
    pub fn zero_threshold(&self, scale: f64) -> f64 {
        self.atol + self.rtol * scale.abs()
    }
}
