//! Pivot rule trait, the seam between the elimination kernel and the
//! factorization policies.
//!
//! The kernel computes each candidate pivot and the largest magnitude
//! below it in the same column; the rule decides which pivot is used.

use matdecomp_types::{DecompError, DecompResult};

use crate::config::PivotPolicy;

/// Why a pivot has the value it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotSource {
    /// The computed pivot was accepted as is.
    Unmodified,
    /// The pivot was raised to the minimal pivot floor.
    Floor,
    /// The pivot was raised to a growth or Gerschgorin bound.
    Bound,
}

/// The pivot a rule settled on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub value: f64,
    pub source: PivotSource,
}

impl Pivot {
    pub fn unmodified(value: f64) -> Self {
        Self {
            value,
            source: PivotSource::Unmodified,
        }
    }
}

/// Trait for pivot acceptance and modification policies.
///
/// The elimination kernel calls `pivot` once per column, in order:
///
/// ```text
/// for j in 0..n {
///     let c_jj = a_jj - Σ l_jk² d_k;
///     let theta = max_{i>j} |a_ij - Σ l_ik l_jk d_k|;
///     let d_j = rule.pivot(j, c_jj, theta)?.value;
/// }
/// ```
///
/// A zero pivot makes the kernel zero the rest of the column.
///
/// # Implementations
///
/// - [`ThresholdRule`]: plain Cholesky/LDL under a [`PivotPolicy`]
/// - [`GmwRule`](crate::modified::gmw::GmwRule): Gill–Murray–Wright bounded pivots
pub trait PivotRule {
    /// Returns the pivot of column `j`, or why there is none.
    fn pivot(&mut self, j: usize, c_jj: f64, theta: f64) -> DecompResult<Pivot>;

    /// Returns the rule's name.
    fn name(&self) -> &str;
}

/// Accepts computed pivots as they are, or fails.
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    pub policy: PivotPolicy,
    /// Pivots with magnitude up to `tau` count as zero.
    pub tau: f64,
}

impl ThresholdRule {
    pub fn new(policy: PivotPolicy, tau: f64) -> Self {
        Self { policy, tau }
    }
}

impl PivotRule for ThresholdRule {
    fn pivot(&mut self, j: usize, c_jj: f64, theta: f64) -> DecompResult<Pivot> {
        let singular = || DecompError::DecompositionSingular {
            index: j,
            pivot: c_jj,
        };
        match self.policy {
            PivotPolicy::PositiveDefinite if c_jj <= self.tau => Err(singular()),
            PivotPolicy::PositiveSemidefinite if c_jj < -self.tau => Err(singular()),
            PivotPolicy::PositiveSemidefinite if c_jj <= self.tau => {
                if theta <= self.tau {
                    Ok(Pivot::unmodified(0.0))
                } else {
                    Err(singular())
                }
            }
            PivotPolicy::Indefinite if c_jj.abs() <= self.tau => Err(singular()),
            _ => Ok(Pivot::unmodified(c_jj)),
        }
    }

    fn name(&self) -> &str {
        "threshold"
    }
}
