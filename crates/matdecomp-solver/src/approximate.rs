//! Bounded minimal-change approximation.
//!
//! Builds `B = L·D·Lᵗ` row by row so that `B` is as close as possible to
//! `A` in the Frobenius norm while `D` and the diagonal of `B` respect
//! given bounds. Row `i` may change in two ways only: its diagonal moves
//! by `δ_i` and its off-diagonal entries towards earlier rows are scaled
//! by `ω_i ≥ 0`. With
//!
//! ```text
//! α_i = Σ_{k<i} l̃_ik² d_k        (unscaled row of L)
//! β_i = 2 Σ_{k<i} a_ik²
//! γ_i = a_ii
//! ```
//!
//! the pair `(d_i, ω_i)` minimizes `(d + ω²α - γ)² + (ω - 1)²β` subject to
//! `min_diag_b ≤ d + ω²α ≤ max_diag_b`, `min_diag_d ≤ d ≤ max_diag_d` and
//! `d = 0 ∨ d ≥ min_abs_value_d`. Boundary optima solve the cubic
//! `2α²ω³ + (2α(d - γ) + β)ω - β = 0`.

use std::cmp::Ordering;

use matdecomp_decomposition::{Factorization, LdlDecomposition};
use matdecomp_math::{Mat, SymmetricMatrix};
use matdecomp_permute::{Permutation, PermutationMethod, choose};
use matdecomp_types::{DecompError, DecompResult};

use crate::config::ApproximationBounds;
use crate::workspace::factor_like;

/// Bounds that apply to one row.
#[derive(Debug, Clone, Copy)]
struct RowBounds {
    min_b: f64,
    max_b: f64,
    min_d: f64,
    max_d: f64,
    min_abs_d: f64,
}

/// The chosen `(d, ω)` of one row and its objective value.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Change {
    d: f64,
    omega: f64,
    f: f64,
}

impl Change {
    fn new(d: f64, omega: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let r = d + omega * omega * alpha - gamma;
        let s = omega - 1.0;
        Self {
            d,
            omega,
            f: r * r + s * s * beta,
        }
    }

    /// Smaller objective first, then larger `d`, then smaller `ω`.
    fn cmp_preference(&self, other: &Change) -> Ordering {
        self.f
            .total_cmp(&other.f)
            .then_with(|| other.d.total_cmp(&self.d))
            .then_with(|| self.omega.total_cmp(&other.omega))
    }

    /// Orders candidate rows by pivot size first, larger `d` winning.
    fn cmp_stability(&self, other: &Change) -> Ordering {
        other
            .d
            .total_cmp(&self.d)
            .then_with(|| self.f.total_cmp(&other.f))
            .then_with(|| self.omega.total_cmp(&other.omega))
    }
}

/// Root of `g` in `[lo, hi]` where `g(lo)` and `g(hi)` differ in sign,
/// by Newton steps that fall back to bisection outside the bracket.
fn bracketed_newton(
    g: impl Fn(f64) -> f64,
    dg: impl Fn(f64) -> f64,
    mut lo: f64,
    mut hi: f64,
    max_iterations: usize,
) -> DecompResult<f64> {
    let rising = g(lo) < 0.0;
    let mut w = 0.5 * (lo + hi);
    for _ in 0..max_iterations {
        let v = g(w);
        if v == 0.0 {
            return Ok(w);
        }
        if (v < 0.0) == rising {
            lo = w;
        } else {
            hi = w;
        }
        let mut next = w - v / dg(w);
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }
        let scale = next.abs().max(f64::MIN_POSITIVE);
        if (next - w).abs() <= 4.0 * f64::EPSILON * scale || hi - lo <= 4.0 * f64::EPSILON * scale {
            return Ok(next);
        }
        w = next;
    }
    Err(DecompError::TooManyIterations {
        iterations: max_iterations,
        context: "cubic root refinement".to_string(),
    })
}

/// Moves `w` away from zero by doubling until `g(w)` has the sign `positive`.
fn expand(g: &impl Fn(f64) -> f64, mut w: f64, positive: bool) -> DecompResult<f64> {
    let mut doublings = 0;
    while w.is_finite() {
        if (g(w) > 0.0) == positive {
            return Ok(w);
        }
        w *= 2.0;
        doublings += 1;
    }
    Err(DecompError::TooManyIterations {
        iterations: doublings,
        context: "cubic root bracketing".to_string(),
    })
}

/// Real roots of `2α²ω³ + cω - β` for `α > 0` and `β ≥ 0`.
fn cubic_roots(alpha: f64, c: f64, beta: f64, max_iterations: usize) -> DecompResult<Vec<f64>> {
    let a3 = 2.0 * alpha * alpha;
    let g = |w: f64| (a3 * w * w + c) * w - beta;
    let dg = |w: f64| 3.0 * a3 * w * w + c;

    if beta == 0.0 {
        let mut roots = vec![0.0];
        if c < 0.0 {
            let r = (-c / a3).sqrt();
            roots.extend([r, -r]);
        }
        return Ok(roots);
    }

    // g(0) = -β < 0 and g is increasing for ω > 0 past its minimum, so
    // there is exactly one positive root.
    let hi = expand(&g, 1.0, true)?;
    let mut roots = vec![bracketed_newton(g, dg, 0.0, hi, max_iterations)?];

    if c < 0.0 {
        let peak = -(-c / (3.0 * a3)).sqrt();
        if g(peak) >= 0.0 {
            let lo = expand(&g, 2.0 * peak, false)?;
            roots.push(bracketed_newton(g, dg, lo, peak, max_iterations)?);
            roots.push(bracketed_newton(g, dg, peak, 0.0, max_iterations)?);
        }
    }
    Ok(roots)
}

/// Best `(d, ω)` for a row with the given `α, β, γ`, or `None` if the
/// bounds leave no candidate.
fn minimal_change(
    alpha: f64,
    beta: f64,
    gamma: f64,
    b: &RowBounds,
    max_iterations: usize,
) -> DecompResult<Option<Change>> {
    let change = |d: f64, omega: f64| Change::new(d, omega, alpha, beta, gamma);

    let d = gamma - alpha;
    if b.min_d.max(b.min_b - alpha) <= d
        && d <= b.max_d.min(b.max_b - alpha)
        && (d == 0.0 || d >= b.min_abs_d)
    {
        return Ok(Some(Change {
            d,
            omega: 1.0,
            f: 0.0,
        }));
    }

    if alpha == 0.0 {
        let d = if b.min_d == 0.0 && b.min_b <= 0.0 && 2.0 * gamma < b.min_abs_d {
            0.0
        } else {
            b.min_d
                .max(b.min_abs_d)
                .max(b.min_b)
                .max(gamma.min(b.max_d).min(b.max_b))
        };
        return Ok(Some(change(d, 1.0)));
    }

    let mut candidates = Vec::new();
    let lower = b.min_d.max(b.min_abs_d);
    let upper = b.max_d.min(b.max_b);
    for d in [b.min_b - alpha, b.max_b - alpha] {
        if d.is_finite() && lower <= d && d <= upper {
            candidates.push(change(d, 1.0));
        }
    }
    if lower.max(b.min_b) <= gamma && gamma <= upper {
        candidates.push(change(gamma, 0.0));
    }

    let mut d_values = vec![lower];
    if upper.is_finite() {
        d_values.push(upper);
    }
    if b.min_d == 0.0 {
        d_values.push(0.0);
    }
    for d in d_values {
        if b.max_b - d < 0.0 {
            continue;
        }
        let omega_lower = ((b.min_b - d).max(0.0) / alpha).sqrt();
        let omega_upper = ((b.max_b - d) / alpha).sqrt();
        for omega in cubic_roots(alpha, 2.0 * alpha * (d - gamma) + beta, beta, max_iterations)? {
            candidates.push(change(d, omega.max(omega_lower).min(omega_upper)));
        }
    }

    Ok(candidates.into_iter().min_by(|x, y| x.cmp_preference(y)))
}

/// An `LDLᵗ` decomposition of the approximation `B` together with the
/// row changes that produced it.
#[derive(Debug, Clone)]
pub struct Approximation {
    pub decomposition: LdlDecomposition,
    /// `ω_i` in the index order of the input matrix.
    pub omega: Vec<f64>,
    /// `B_ii - A_ii` in the index order of the input matrix.
    pub delta: Vec<f64>,
}

impl Approximation {
    /// The approximation `B` itself.
    pub fn matrix(&self) -> DecompResult<&SymmetricMatrix> {
        self.decomposition.composed_matrix()
    }
}

/// Lower-triangle entry `a_ij` by original indices.
fn lower(matrix: &SymmetricMatrix, i: usize, j: usize) -> f64 {
    if i >= j { matrix.get(i, j) } else { matrix.get(j, i) }
}

/// Computes the minimal-change approximation of `matrix` and its
/// decomposition.
///
/// `method` orders the rows up front, or picks them while eliminating:
/// [`PermutationMethod::MinimalDifference`] takes the remaining row with
/// the smallest change (ties: larger `d`, smaller `ω`, earlier position),
/// [`PermutationMethod::MaximalStability`] the one allowing the largest
/// pivot `d` (ties: smaller change, smaller `ω`, earlier position).
pub fn approximate_decomposition(
    matrix: &SymmetricMatrix,
    bounds: &ApproximationBounds,
    method: PermutationMethod,
) -> DecompResult<Approximation> {
    matrix.check_square()?;
    let n = matrix.n();
    bounds.validate(n)?;
    let entries = n.saturating_mul(n);
    if matrix.is_sparse() && entries > bounds.max_dense_entries {
        return Err(DecompError::NoDecompositionPossibleTooManyEntries {
            entries,
            limit: bounds.max_dense_entries,
        });
    }
    let min_abs_d = bounds.effective_min_abs_value_d();
    tracing::debug!(
        n,
        sparse = matrix.is_sparse(),
        %method,
        min_diag_d = bounds.min_diag_d,
        max_diag_d = bounds.max_diag_d,
        min_abs_value_d = min_abs_d,
        "approximate decomposition started"
    );

    let prefer: Option<fn(&Change, &Change) -> Ordering> = match method {
        PermutationMethod::MinimalDifference => Some(Change::cmp_preference),
        PermutationMethod::MaximalStability => Some(Change::cmp_stability),
        _ => None,
    };
    let mut p: Vec<usize> = if prefer.is_some() {
        (0..n).collect()
    } else {
        choose(matrix, method)?.p().to_vec()
    };
    let row_bounds = |i: usize| RowBounds {
        min_b: bounds.min_diag_b.at(i),
        max_b: bounds.max_diag_b.at(i),
        min_d: bounds.min_diag_d,
        max_d: bounds.max_diag_d,
        min_abs_d,
    };

    let gamma = matrix.diagonal();
    let mut alpha = vec![0.0; n];
    let mut beta = vec![0.0; n];
    let mut omega = vec![0.0; n];
    let mut delta = vec![0.0; n];
    let mut d = vec![0.0; n];
    let mut l = Mat::<f64>::identity(n, n);

    for i in 0..n {
        let (position, change) = if let Some(prefer) = prefer {
            let mut best: Option<(usize, Change)> = None;
            for j in i..n {
                let r = p[j];
                let bounds_r = row_bounds(r);
                let found = minimal_change(alpha[r], beta[r], gamma[r], &bounds_r, bounds.max_iterations)?;
                let Some(c) = found else {
                    continue;
                };
                if best.map_or(true, |(_, b)| prefer(&c, &b) == Ordering::Less) {
                    best = Some((j, c));
                }
            }
            best.ok_or(DecompError::NoDecompositionPossibleWithProblematicSubdecomposition { index: i })?
        } else {
            let r = p[i];
            let bounds_r = row_bounds(r);
            let c = minimal_change(alpha[r], beta[r], gamma[r], &bounds_r, bounds.max_iterations)?
                .ok_or(DecompError::NoDecompositionPossibleWithProblematicSubdecomposition { index: i })?;
            (i, c)
        };

        if position != i {
            p.swap(i, position);
            for k in 0..i {
                let t = l[(i, k)];
                l[(i, k)] = l[(position, k)];
                l[(position, k)] = t;
            }
        }

        let r = p[i];
        d[i] = change.d;
        omega[r] = change.omega;
        delta[r] = change.d + change.omega * change.omega * alpha[r] - gamma[r];
        if !(d[i].is_finite() && delta[r].is_finite()) {
            return Err(DecompError::DecompositionNotFinite { index: i });
        }

        for k in 0..i {
            let v = l[(i, k)] * change.omega;
            l[(i, k)] = if v.abs() < f64::EPSILON { 0.0 } else { v };
        }

        for j in i + 1..n {
            let a = lower(matrix, p[j], r);
            beta[p[j]] += 2.0 * a * a;
            if d[i] == 0.0 {
                l[(j, i)] = 0.0;
                continue;
            }
            let b: f64 = (0..i).map(|k| l[(j, k)] * l[(i, k)] * d[k]).sum();
            let v = (a - b) / d[i];
            if !v.is_finite() {
                return Err(DecompError::DecompositionNotFinite { index: i });
            }
            if v.abs() < f64::EPSILON {
                l[(j, i)] = 0.0;
            } else {
                l[(j, i)] = v;
                alpha[p[j]] += v * v * d[i];
            }
        }
    }

    let permutation = Permutation::from_vec(p)?;
    let decomposition = LdlDecomposition::new(factor_like(matrix, l), d, permutation)?;
    let changed = delta.iter().zip(&omega).filter(|&(&dl, &w)| dl != 0.0 || w != 1.0).count();
    tracing::debug!(n, changed, "approximate decomposition finished");
    Ok(Approximation {
        decomposition,
        omega,
        delta,
    })
}

/// Computes the minimal-change approximation `B` of `matrix`, in the
/// storage class of `matrix`.
pub fn approximate_matrix(
    matrix: &SymmetricMatrix,
    bounds: &ApproximationBounds,
    method: PermutationMethod,
) -> DecompResult<SymmetricMatrix> {
    let approximation = approximate_decomposition(matrix, bounds, method)?;
    Ok(approximation.matrix()?.clone())
}
