//! Plain Cholesky and `LDLᵗ` factorization under a fixed permutation.
//!
//! No pivoting happens here: the ordering comes from the permutation
//! engine and every pivot either passes the [`ThresholdRule`] or the
//! factorization fails at that leading principal submatrix.

use matdecomp_decomposition::{Decomposition, LdlDecomposition};
use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult};

use crate::config::{FactorOptions, FactorVariant, PivotPolicy};
use crate::elimination::eliminate;
use crate::strategy::ThresholdRule;

/// Factors `P·A·Pᵗ` as `L·Lᵗ` or `L·D·Lᵗ`.
///
/// The result has the storage class of `matrix`. `LL` needs non-negative
/// pivots; an indefinite policy whose factorization has a negative pivot
/// fails with `MatrixComplexDiagonalValue` for `LL`.
pub fn factor(
    matrix: &SymmetricMatrix,
    permutation: &Permutation,
    variant: FactorVariant,
    options: &FactorOptions,
) -> DecompResult<Decomposition> {
    matrix.check_square()?;
    options.validate()?;
    let n = matrix.n();
    if permutation.len() != n {
        return Err(DecompError::DimensionMismatch {
            expected: n,
            found: permutation.len(),
        });
    }

    let tau = options.threshold(matrix.max_abs_diagonal());
    tracing::debug!(
        n,
        sparse = matrix.is_sparse(),
        ?variant,
        policy = %options.policy,
        tau,
        "factorization started"
    );

    let permuted = permutation.permute_matrix(matrix)?;
    let mut rule = ThresholdRule::new(options.policy, tau);
    let elimination = eliminate(&permuted, &mut rule)?;
    let ldl = LdlDecomposition::new(elimination.l, elimination.d, permutation.clone())?;

    let decomposition = match variant {
        FactorVariant::LDL => Decomposition::LDL(ldl),
        FactorVariant::LL => Decomposition::LL(ldl.to_ll()?),
    };
    tracing::debug!(n, ?variant, "factorization finished");
    Ok(decomposition)
}

/// Factors with the policy that accepts exactly the positive definite
/// matrices.
pub fn cholesky(matrix: &SymmetricMatrix, permutation: &Permutation) -> DecompResult<Decomposition> {
    let options = FactorOptions {
        policy: PivotPolicy::PositiveDefinite,
        ..Default::default()
    };
    factor(matrix, permutation, FactorVariant::LL, &options)
}
