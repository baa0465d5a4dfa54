//! Gill–Murray–Wright modified Cholesky.
//!
//! The pivot of column `j` is raised so that every entry of `L·D^½`
//! stays bounded by `β`:
//!
//! ```text
//! γ = max |a_ii|,  ξ = max_{i≠j} |a_ij|,  ν = max(1, √(n² - 1))
//! β² = max(γ, ξ/ν, ε),  δ = ε · max(γ + ξ, 1)
//! GMW_81: d_j = max(δ, |c_jj|, θ_j²/β²)
//! GMW_T1: d_j = max(δ,  c_jj,  θ_j²/β²)
//! GMW_T2: as T1 with β_j² taken over the trailing submatrix of column j
//! ```

use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::DecompResult;

use super::{ModificationMethod, RawFactors};
use crate::elimination::eliminate;
use crate::strategy::{Pivot, PivotRule, PivotSource};

/// Largest diagonal and off-diagonal magnitudes of a trailing submatrix.
#[derive(Debug, Clone, Copy, Default)]
struct Extremes {
    diagonal: f64,
    off_diagonal: f64,
}

/// Magnitude maxima per column over the lower triangle: `|a_jj|` and
/// `max_{i>j} |a_ij|`.
fn column_extremes(matrix: &SymmetricMatrix) -> Vec<Extremes> {
    let n = matrix.n();
    let mut out = vec![Extremes::default(); n];
    match matrix {
        SymmetricMatrix::Dense(a) => {
            for j in 0..n {
                out[j].diagonal = a[(j, j)].abs();
                for i in j + 1..n {
                    out[j].off_diagonal = out[j].off_diagonal.max(a[(i, j)].abs());
                }
            }
        }
        SymmetricMatrix::Sparse(a) => {
            for i in 0..n {
                for (j, v) in a.row(i) {
                    if j == i {
                        out[j].diagonal = v.abs();
                    } else if j < i {
                        out[j].off_diagonal = out[j].off_diagonal.max(v.abs());
                    }
                }
            }
        }
    }
    out
}

fn beta_squared(e: Extremes, size: usize) -> f64 {
    let m = size as f64;
    let nu = (m * m - 1.0).sqrt().max(1.0);
    e.diagonal.max(e.off_diagonal / nu).max(f64::EPSILON)
}

/// Pivot rule of the GMW family.
#[derive(Debug, Clone)]
pub struct GmwRule {
    method: ModificationMethod,
    delta: f64,
    /// `β²` per column (constant unless `GMW_T2`).
    beta2: Vec<f64>,
    /// `d_j - c_jj` per finished column.
    pub perturbation: Vec<f64>,
}

impl GmwRule {
    /// Builds the bounds for the already permuted `matrix`.
    pub fn new(method: ModificationMethod, matrix: &SymmetricMatrix) -> Self {
        let n = matrix.n();
        let columns = column_extremes(matrix);
        let global = columns.iter().fold(Extremes::default(), |acc, e| Extremes {
            diagonal: acc.diagonal.max(e.diagonal),
            off_diagonal: acc.off_diagonal.max(e.off_diagonal),
        });
        let delta = f64::EPSILON * (global.diagonal + global.off_diagonal).max(1.0);

        let beta2 = if method == ModificationMethod::GmwT2 {
            let mut beta2 = vec![0.0; n];
            let mut trailing = Extremes::default();
            for j in (0..n).rev() {
                trailing.diagonal = trailing.diagonal.max(columns[j].diagonal);
                trailing.off_diagonal = trailing.off_diagonal.max(columns[j].off_diagonal);
                beta2[j] = beta_squared(trailing, n - j);
            }
            beta2
        } else {
            vec![beta_squared(global, n); n]
        };

        Self {
            method,
            delta,
            beta2,
            perturbation: Vec::with_capacity(n),
        }
    }
}

impl PivotRule for GmwRule {
    fn pivot(&mut self, j: usize, c_jj: f64, theta: f64) -> DecompResult<Pivot> {
        let bound = theta * theta / self.beta2[j];
        let candidate = match self.method {
            ModificationMethod::Gmw81 => c_jj.abs(),
            _ => c_jj,
        };
        let value = self.delta.max(candidate).max(bound);
        let source = if value == c_jj {
            PivotSource::Unmodified
        } else if bound >= self.delta.max(candidate) || candidate > self.delta {
            PivotSource::Bound
        } else {
            PivotSource::Floor
        };
        self.perturbation.push(value - c_jj);
        Ok(Pivot { value, source })
    }

    fn name(&self) -> &str {
        self.method.name()
    }
}

/// Runs a GMW method on `P·A·Pᵗ`.
pub(crate) fn gmw(
    matrix: &SymmetricMatrix,
    permutation: &Permutation,
    method: ModificationMethod,
) -> DecompResult<RawFactors> {
    let permuted = permutation.permute_matrix(matrix)?;
    let mut rule = GmwRule::new(method, &permuted);
    let elimination = eliminate(&permuted, &mut rule)?;
    Ok(RawFactors {
        l: elimination.l,
        d: elimination.d,
        e: rule.perturbation,
        sources: elimination.sources,
        p: permutation.clone(),
    })
}
