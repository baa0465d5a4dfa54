//! Schnabel–Eskow modified Cholesky.
//!
//! Right-looking elimination on a dense working copy. While the trailing
//! matrix is safely positive definite (SE_99 and SE_T1 only) the largest
//! diagonal entry is pivoted without modification. Afterwards each step
//! pivots on the largest Gerschgorin lower bound and raises the pivot to
//! dominate the rest of its row:
//!
//! ```text
//! phase one:  a_jj ≥ τ̄γ  and  min_{i>j} (a_ii - a_ij²/a_jj) ≥ -μγ
//! phase two:  δ_j = max(0, max(Σ_{i>j} |a_ij|, τ̄γ) - a_jj, δ_{j-1})
//! last 2×2:   δ = max(0, max(τ(λ_hi - λ_lo)/(1 - τ), τ̄γ) - λ_lo, δ_{j-1})
//! ```
//!
//! with `τ = ε^⅓`, `τ̄ = ε^⅔`, `μ = 0.1`. SE_T1 drops the `δ_{j-1}` term;
//! SE_90 has no phase one and no special final block.

use matdecomp_decomposition::blocks::symmetric_2x2_eigenvalues;
use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult};

use super::{ModificationMethod, RawFactors};
use crate::config::ModifiedOptions;
use crate::strategy::PivotSource;
use crate::workspace::{DenseWorkspace, factor_like};

/// Phase-one lookahead tolerance `μ`.
const MU: f64 = 0.1;

struct Tolerances {
    tau: f64,
    tau_bar: f64,
    gamma: f64,
}

impl Tolerances {
    fn new(ws: &DenseWorkspace) -> Self {
        let n = ws.n();
        let mut gamma = (0..n).fold(0.0_f64, |m, i| m.max(ws.a[(i, i)].abs()));
        if gamma == 0.0 {
            for j in 0..n {
                for i in j + 1..n {
                    gamma = gamma.max(ws.a[(i, j)].abs());
                }
            }
        }
        if gamma == 0.0 {
            gamma = 1.0;
        }
        Self {
            tau: f64::EPSILON.cbrt(),
            tau_bar: f64::EPSILON.cbrt().powi(2),
            gamma,
        }
    }

    fn floor(&self) -> f64 {
        self.tau_bar * self.gamma
    }
}

/// Modification bookkeeping carried across steps.
struct Modification {
    e: Vec<f64>,
    sources: Vec<PivotSource>,
    previous: f64,
    monotone: bool,
}

impl Modification {
    /// Raises `a_jj` by `max(0, target - a_jj, δ_prev)`.
    fn raise(&mut self, ws: &mut DenseWorkspace, j: usize, target: f64, floor_only: bool) {
        let needed = (target - ws.a[(j, j)]).max(0.0);
        let delta = if self.monotone {
            needed.max(self.previous)
        } else {
            needed
        };
        if delta <= 0.0 {
            return;
        }
        ws.a[(j, j)] += delta;
        self.e[j] = delta;
        self.sources[j] = if floor_only && needed >= self.previous {
            PivotSource::Floor
        } else {
            PivotSource::Bound
        };
        self.previous = delta;
    }
}

/// Index of the first maximum of `f` over `j..n`.
fn argmax(j: usize, n: usize, f: impl Fn(usize) -> f64) -> usize {
    let mut best = j;
    let mut best_value = f(j);
    for i in j + 1..n {
        let v = f(i);
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

fn check_finite(ws: &DenseWorkspace, j: usize) -> DecompResult<()> {
    let n = ws.n();
    if (j..n).any(|i| !ws.a[(i, j)].is_finite()) {
        return Err(DecompError::DecompositionNotFinite { index: j });
    }
    Ok(())
}

/// Whether the phase-one step at `j` with pivot row `r` keeps the
/// trailing diagonal above `-μγ`.
fn phase_one_accepts(ws: &DenseWorkspace, j: usize, r: usize, tol: &Tolerances) -> bool {
    let pivot = ws.a[(r, r)];
    if pivot < tol.floor() {
        return false;
    }
    (j..ws.n())
        .filter(|&i| i != r)
        .all(|i| ws.a[(i, i)] - ws.a[(i, r)] * ws.a[(i, r)] / pivot >= -MU * tol.gamma)
}

/// Runs an SE method on `P·A·Pᵗ`.
pub(crate) fn schnabel_eskow(
    matrix: &SymmetricMatrix,
    permutation: &Permutation,
    method: ModificationMethod,
    options: &ModifiedOptions,
) -> DecompResult<RawFactors> {
    let mut ws = DenseWorkspace::new(matrix, permutation, options.max_dense_entries)?;
    let n = ws.n();
    let tol = Tolerances::new(&ws);
    let two_phase = method != ModificationMethod::Se90;
    let mut modification = Modification {
        e: vec![0.0; n],
        sources: vec![PivotSource::Unmodified; n],
        previous: 0.0,
        monotone: method != ModificationMethod::SeT1,
    };
    let mut d = vec![0.0; n];

    let mut j = 0;
    if two_phase {
        while j < n {
            check_finite(&ws, j)?;
            let r = argmax(j, n, |i| ws.a[(i, i)]);
            if !phase_one_accepts(&ws, j, r, &tol) {
                break;
            }
            ws.swap(j, j, r);
            d[j] = ws.a[(j, j)];
            ws.eliminate_1x1(j)?;
            j += 1;
        }
        if j < n {
            tracing::debug!(%method, index = j, "switching to the bounded phase");
        }
    }

    while j < n {
        check_finite(&ws, j)?;

        if two_phase && n - j == 2 {
            let (lo, hi) =
                symmetric_2x2_eigenvalues(ws.a[(j, j)], ws.a[(j + 1, j)], ws.a[(j + 1, j + 1)]);
            let spread = tol.tau * (hi - lo) / (1.0 - tol.tau);
            let floor_only = spread < tol.floor();
            let shift = (spread.max(tol.floor()) - lo).max(0.0);
            let shift = if modification.monotone {
                shift.max(modification.previous)
            } else {
                shift
            };
            if shift > 0.0 {
                let source = if floor_only && shift > modification.previous {
                    PivotSource::Floor
                } else {
                    PivotSource::Bound
                };
                for k in [j, j + 1] {
                    ws.a[(k, k)] += shift;
                    modification.e[k] = shift;
                    modification.sources[k] = source;
                }
                modification.previous = shift;
            }
            d[j] = ws.a[(j, j)];
            ws.eliminate_1x1(j)?;
            d[j + 1] = ws.a[(j + 1, j + 1)];
            ws.eliminate_1x1(j + 1)?;
            break;
        }

        let r = argmax(j, n, |i| {
            let radius: f64 = (j..n).filter(|&k| k != i).map(|k| ws.a[(i, k)].abs()).sum();
            ws.a[(i, i)] - radius
        });
        ws.swap(j, j, r);
        let row_norm: f64 = (j + 1..n).map(|i| ws.a[(i, j)].abs()).sum();
        let floor_only = row_norm < tol.floor();
        modification.raise(&mut ws, j, row_norm.max(tol.floor()), floor_only);
        d[j] = ws.a[(j, j)];
        if !(d[j].is_finite() && d[j] > 0.0) {
            return Err(DecompError::NoDecompositionPossibleWithProblematicSubdecomposition {
                index: j,
            });
        }
        ws.eliminate_1x1(j)?;
        j += 1;
    }

    let p = ws.final_permutation(permutation)?;
    Ok(RawFactors {
        l: factor_like(matrix, ws.l),
        d,
        e: modification.e,
        sources: modification.sources,
        p,
    })
}
