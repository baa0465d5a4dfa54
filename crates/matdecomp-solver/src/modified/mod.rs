//! Modified Cholesky factorizations.
//!
//! Each method factors `P·(A + E)·Pᵗ = L·D·Lᵗ` with a diagonal `E ≥ 0`
//! chosen during the elimination, so that `A + E` is positive definite
//! even when `A` is indefinite or singular.
//!
//! # Methods
//!
//! - **GMW family** ([`gmw`]): the shared left-looking kernel with a
//!   pivot rule bounding the growth of `L`; the permutation is kept, so
//!   sparse input stays sparse
//! - **SE family** ([`se`]): Gerschgorin-bounded pivots with symmetric
//!   pivoting on a dense working copy
//!
//! If an elimination overflows, the matrix is rescaled by a power of two
//! and the elimination is repeated, up to `max_iterations` times.

pub mod gmw;
pub mod se;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use matdecomp_decomposition::{Decomposition, LdlDecomposition, TriangularFactor};
use matdecomp_math::{Mat, SymmetricMatrix};
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult};

use crate::config::ModifiedOptions;
use crate::strategy::PivotSource;

/// Factor applied to the matrix on each overflow retry.
const RESCALE_FACTOR: f64 = 1.0 / 18_446_744_073_709_551_616.0; // 2⁻⁶⁴

/// The modified Cholesky algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModificationMethod {
    /// Gill, Murray and Wright (1981).
    #[serde(rename = "GMW_81")]
    Gmw81,
    /// GMW with the signed pivot (first refinement).
    #[serde(rename = "GMW_T1")]
    GmwT1,
    /// GMW with bounds taken over the trailing submatrix (second refinement).
    #[serde(rename = "GMW_T2")]
    GmwT2,
    /// Schnabel and Eskow (1990).
    #[serde(rename = "SE_90")]
    Se90,
    /// Schnabel and Eskow (1999), two phases.
    #[serde(rename = "SE_99")]
    Se99,
    /// SE99 without monotone perturbations.
    #[serde(rename = "SE_T1")]
    SeT1,
}

impl ModificationMethod {
    pub const ALL: [ModificationMethod; 6] = [
        Self::Gmw81,
        Self::GmwT1,
        Self::GmwT2,
        Self::Se90,
        Self::Se99,
        Self::SeT1,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Gmw81 => "GMW_81",
            Self::GmwT1 => "GMW_T1",
            Self::GmwT2 => "GMW_T2",
            Self::Se90 => "SE_90",
            Self::Se99 => "SE_99",
            Self::SeT1 => "SE_T1",
        }
    }

    /// True for the methods that keep the given permutation.
    pub fn is_gmw(self) -> bool {
        matches!(self, Self::Gmw81 | Self::GmwT1 | Self::GmwT2)
    }
}

impl fmt::Display for ModificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModificationMethod {
    type Err = DecompError;

    /// Accepts `GMW_81`, `gmw81`, `se-t1` and similar spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().replace('_', "") == key)
            .ok_or_else(|| DecompError::InvalidOption(format!("unknown modification method '{s}'")))
    }
}

/// How a modified factorization ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No pivot was changed; `E = 0`.
    Unmodified,
    /// Pivots were only raised to the minimal pivot floor.
    MinimalDifference,
    /// Some pivot was set by a growth or Gerschgorin bound.
    Maximal,
}

impl Termination {
    pub fn from_sources(sources: &[PivotSource]) -> Self {
        if sources.contains(&PivotSource::Bound) {
            Self::Maximal
        } else if sources.contains(&PivotSource::Floor) {
            Self::MinimalDifference
        } else {
            Self::Unmodified
        }
    }
}

/// The diagonal perturbation `E` of a modified factorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    /// `E[i][i]` in the index order of the input matrix.
    pub diagonal: Vec<f64>,
    /// `Σ E[i][i]`.
    pub total: f64,
    /// `max E[i][i]`.
    pub max: f64,
    pub termination: Termination,
}

impl Perturbation {
    pub fn is_modified(&self) -> bool {
        self.termination != Termination::Unmodified
    }
}

/// A decomposition of `A + E` together with `E`.
#[derive(Debug, Clone)]
pub struct ModifiedDecomposition {
    pub decomposition: Decomposition,
    pub perturbation: Perturbation,
}

impl ModifiedDecomposition {
    /// Returns `A + E` for the input `matrix`.
    pub fn modified_matrix(&self, matrix: &SymmetricMatrix) -> DecompResult<SymmetricMatrix> {
        add_to_diagonal(matrix, &self.perturbation.diagonal)
    }
}

/// Factors as produced by one elimination of a (rescaled) matrix.
#[derive(Debug, Clone)]
pub(crate) struct RawFactors {
    pub l: TriangularFactor,
    pub d: Vec<f64>,
    /// Perturbation of each pivot, in elimination order.
    pub e: Vec<f64>,
    pub sources: Vec<PivotSource>,
    /// Permutation including any interchanges made while eliminating.
    pub p: Permutation,
}

/// Factors `P·(A + E)·Pᵗ = L·D·Lᵗ` with `method`.
///
/// GMW methods eliminate in the order of `permutation`; SE methods apply
/// it first and pivot further, so the returned permutation may differ.
pub fn modified_cholesky(
    matrix: &SymmetricMatrix,
    permutation: &Permutation,
    method: ModificationMethod,
    options: &ModifiedOptions,
) -> DecompResult<ModifiedDecomposition> {
    matrix.check_square()?;
    let n = matrix.n();
    if permutation.len() != n {
        return Err(DecompError::DimensionMismatch {
            expected: n,
            found: permutation.len(),
        });
    }
    tracing::debug!(
        n,
        sparse = matrix.is_sparse(),
        %method,
        max_iterations = options.max_iterations,
        "modified factorization started"
    );

    let finite = matrix.is_finite();
    let mut scale = 1.0;
    let mut retries = 0;
    loop {
        let scaled;
        let working = if scale == 1.0 {
            matrix
        } else {
            scaled = scale_matrix(matrix, scale);
            &scaled
        };
        let result = if method.is_gmw() {
            gmw::gmw(working, permutation, method)
        } else {
            se::schnabel_eskow(working, permutation, method, options)
        };
        match result {
            Ok(raw) => return finish(raw, scale, method),
            Err(DecompError::DecompositionNotFinite { index }) if finite => {
                if retries >= options.max_iterations {
                    return Err(DecompError::NoDecompositionPossible {
                        iterations: retries,
                    });
                }
                retries += 1;
                scale *= RESCALE_FACTOR;
                if scale == 0.0 {
                    return Err(DecompError::NoDecompositionPossible {
                        iterations: retries,
                    });
                }
                tracing::warn!(index, retries, scale, "elimination overflowed, retrying rescaled");
            }
            Err(error) => return Err(error),
        }
    }
}

fn finish(raw: RawFactors, scale: f64, method: ModificationMethod) -> DecompResult<ModifiedDecomposition> {
    let n = raw.d.len();
    let mut d = raw.d;
    let mut diagonal = vec![0.0; n];
    for j in 0..n {
        let d_j = d[j] / scale;
        let e_j = raw.e[j] / scale;
        if !(d_j.is_finite() && e_j.is_finite()) {
            return Err(DecompError::NoDecompositionPossibleWithProblematicSubdecomposition {
                index: j,
            });
        }
        d[j] = d_j;
        diagonal[raw.p.p()[j]] = e_j;
    }

    let total = diagonal.iter().sum::<f64>();
    let max = diagonal.iter().copied().fold(0.0_f64, f64::max);
    let termination = Termination::from_sources(&raw.sources);
    let perturbation = Perturbation {
        diagonal,
        total,
        max,
        termination,
    };
    if perturbation.is_modified() {
        tracing::warn!(%method, total, max, ?termination, "diagonal perturbed to obtain a factorization");
    }

    let ldl = LdlDecomposition::new(raw.l, d, raw.p)?;
    tracing::debug!(n, %method, "modified factorization finished");
    Ok(ModifiedDecomposition {
        decomposition: Decomposition::LDL(ldl),
        perturbation,
    })
}

/// Returns `s·A`.
fn scale_matrix(matrix: &SymmetricMatrix, s: f64) -> SymmetricMatrix {
    match matrix {
        SymmetricMatrix::Dense(a) => {
            SymmetricMatrix::Dense(Mat::from_fn(a.nrows(), a.ncols(), |i, j| s * a[(i, j)]))
        }
        SymmetricMatrix::Sparse(a) => {
            let mut scaled = a.clone();
            scaled.values.iter_mut().for_each(|v| *v *= s);
            SymmetricMatrix::Sparse(scaled)
        }
    }
}

/// Returns `A + diag(e)`.
pub fn add_to_diagonal(matrix: &SymmetricMatrix, e: &[f64]) -> DecompResult<SymmetricMatrix> {
    match matrix {
        SymmetricMatrix::Dense(a) => {
            if e.len() != a.nrows().min(a.ncols()) {
                return Err(DecompError::DimensionMismatch {
                    expected: a.nrows().min(a.ncols()),
                    found: e.len(),
                });
            }
            let mut b = a.clone();
            for (i, &v) in e.iter().enumerate() {
                b[(i, i)] += v;
            }
            Ok(SymmetricMatrix::Dense(b))
        }
        SymmetricMatrix::Sparse(a) => Ok(SymmetricMatrix::Sparse(a.add_diagonal(e)?)),
    }
}
