//! Input validation.
//!
//! Runs before any numeric work so that malformed input fails with a
//! matrix or configuration error, never with a factorization error.

use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::PermutationMethod;
use matdecomp_types::{DecompError, DecompResult, Tolerance};

use crate::options::DecomposeOptions;

/// Validates `matrix` and `options` for an algorithm ordered by `method`.
///
/// Checks, in order:
/// - the matrix is square
/// - every entry is finite (if `check_finite`)
/// - the matrix is symmetric within tolerance (if `check_hermitian`)
/// - `method` can order a matrix of this storage class
/// - the remaining options are sane
pub fn validate(
    matrix: &SymmetricMatrix,
    method: PermutationMethod,
    options: &DecomposeOptions,
) -> DecompResult<Tolerance> {
    validate_matrix(matrix, options)?;
    // Dynamic orders are built while eliminating, so any storage class is fine.
    if !method.is_dynamic() {
        method.check_storage(matrix.storage())?;
    }
    validate_options(options)
}

/// Shape, finiteness and symmetry checks.
pub fn validate_matrix(matrix: &SymmetricMatrix, options: &DecomposeOptions) -> DecompResult<()> {
    matrix.check_square()?;
    if options.check_finite {
        matrix.check_finite()?;
    }
    if options.check_hermitian {
        matrix.check_hermitian(&options.tolerance()?)?;
    }
    Ok(())
}

/// Checks the options that do not depend on the matrix.
pub fn validate_options(options: &DecomposeOptions) -> DecompResult<Tolerance> {
    let tolerance = options.tolerance()?;
    if options.max_dense_entries == 0 {
        return Err(DecompError::InvalidOption(
            "max_dense_entries must be >= 1".into(),
        ));
    }
    Ok(tolerance)
}

/// Checks that a right-hand side matches the matrix dimension.
pub fn validate_rhs(n: usize, b: &[f64]) -> DecompResult<()> {
    if b.len() != n {
        return Err(DecompError::DimensionMismatch {
            expected: n,
            found: b.len(),
        });
    }
    Ok(())
}
