//! Bunch–Kaufman factorization of symmetric indefinite matrices.
//!
//! Right-looking elimination on a dense working copy with symmetric
//! interchanges chosen by partial pivoting. Each step takes a 1×1 or a
//! 2×2 pivot block, so every invertible symmetric matrix factors with
//! bounded growth:
//!
//! ```text
//! λ = max_{i>k} |a_ik|          (row r)
//! |a_kk| ≥ αλ            → 1×1 at k
//! |a_kk|·σ ≥ αλ²         → 1×1 at k   (σ = max_{i≥k, i≠r} |a_ir|)
//! |a_rr| ≥ ασ            → 1×1 at r
//! otherwise              → 2×2 at (k, r)
//! ```

use matdecomp_decomposition::LdlCompressedDecomposition;
use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult};

use crate::config::FactorOptions;
use crate::workspace::{DenseWorkspace, factor_like};

/// Growth bound `α = (1 + √17) / 8`.
pub fn alpha() -> f64 {
    (1.0 + 17.0_f64.sqrt()) / 8.0
}

/// Factors `P·A·Pᵗ = L·D·Lᵗ` with `D` made of 1×1 and 2×2 blocks.
///
/// `permutation` is applied first; the interchanges chosen during the
/// elimination are composed onto it. A column whose entries are all
/// below the pivot threshold becomes a zero 1×1 block, leaving `D`
/// singular. Sparse input yields a sparse factor.
pub fn bunch_kaufman(
    matrix: &SymmetricMatrix,
    permutation: &Permutation,
    options: &FactorOptions,
) -> DecompResult<LdlCompressedDecomposition> {
    matrix.check_square()?;
    options.validate()?;
    let n = matrix.n();
    let tau = options.threshold(matrix.max_abs_diagonal());
    let alpha = alpha();
    tracing::debug!(n, sparse = matrix.is_sparse(), tau, "Bunch-Kaufman factorization started");

    let mut ws = DenseWorkspace::new(matrix, permutation, options.max_dense_entries)?;
    let mut diagonal = vec![0.0; n];
    let mut block_starts = Vec::new();
    let mut couplings = Vec::new();

    let mut k = 0;
    while k < n {
        let a_kk = ws.a[(k, k)];
        let (lambda, r) = ws.column_max(k);
        if !(a_kk.is_finite() && lambda.is_finite()) {
            return Err(DecompError::DecompositionNotFinite { index: k });
        }

        if a_kk.abs().max(lambda) <= tau {
            ws.a[(k, k)] = 0.0;
            ws.eliminate_1x1(k)?;
            k += 1;
            continue;
        }

        let two_by_two = if a_kk.abs() >= alpha * lambda {
            false
        } else {
            let sigma = (k..n)
                .filter(|&i| i != r)
                .fold(0.0_f64, |m, i| m.max(ws.a[(i, r)].abs()));
            if a_kk.abs() * sigma >= alpha * lambda * lambda {
                false
            } else if ws.a[(r, r)].abs() >= alpha * sigma {
                ws.swap(k, k, r);
                false
            } else {
                ws.swap(k, k + 1, r);
                true
            }
        };

        if two_by_two {
            diagonal[k] = ws.a[(k, k)];
            diagonal[k + 1] = ws.a[(k + 1, k + 1)];
            block_starts.push(k);
            couplings.push(ws.a[(k + 1, k)]);
            ws.eliminate_2x2(k)?;
            k += 2;
        } else {
            diagonal[k] = ws.a[(k, k)];
            ws.eliminate_1x1(k)?;
            k += 1;
        }
    }

    let p = ws.final_permutation(permutation)?;
    let mut ld = ws.l;
    for (i, &v) in diagonal.iter().enumerate() {
        ld[(i, i)] = v;
    }
    for (&k, &b) in block_starts.iter().zip(&couplings) {
        ld[(k + 1, k)] = b;
    }

    tracing::debug!(n, blocks = block_starts.len(), "Bunch-Kaufman factorization finished");
    LdlCompressedDecomposition::new(factor_like(matrix, ld), block_starts, p)
}
