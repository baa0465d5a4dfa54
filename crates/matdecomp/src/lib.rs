//! # matdecomp
//!
//! Cholesky, `LDLᵗ` and modified Cholesky decompositions of real
//! symmetric matrices, dense or sparse.
//!
//! The functions here pick an ordering and an algorithm from the matrix
//! and the [`DecomposeOptions`], validate the input up front, and return
//! the decomposition in the requested shape.
//!
//! ## Key Types
//!
//! - [`DecomposeOptions`] — configuration shared by every entry point
//! - [`Modification`] — plain, automatic or explicit modified Cholesky
//! - [`Decomposition`] — the returned LL / LDL / compressed LDL value

pub mod options;
pub mod validate;

use matdecomp_permute::{Permutation, choose};
use matdecomp_solver::{ApproximationBounds, FactorOptions, FactorVariant, PivotPolicy};

pub use matdecomp_decomposition::{Decomposition, Factorization};
pub use matdecomp_math::{CsrMatrix, Mat, SymmetricMatrix};
pub use matdecomp_permute::PermutationMethod;
pub use matdecomp_solver::{ModificationMethod, ModifiedDecomposition, Perturbation, Termination};
pub use matdecomp_types::{DecompError, DecompResult, DecompositionType, ErrorKind, Tolerance};
pub use options::{DecomposeOptions, Modification};

use matdecomp_types::StorageKind;
use validate::{validate, validate_rhs};

/// The algorithm a call is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Plain,
    BunchKaufman,
    Modified(ModificationMethod),
}

impl Route {
    fn select(matrix: &SymmetricMatrix, options: &DecomposeOptions) -> Self {
        match options.modification.resolve(matrix.n(), matrix.storage()) {
            Some(method) => Self::Modified(method),
            None if options.policy == PivotPolicy::Indefinite
                && options.return_type == DecompositionType::LDLCompressed =>
            {
                Self::BunchKaufman
            }
            None => Self::Plain,
        }
    }

    /// Algorithms that pivot on their own start from the natural order.
    fn pivots_itself(self) -> bool {
        match self {
            Self::BunchKaufman => true,
            Self::Modified(m) => !m.is_gmw(),
            Self::Plain => false,
        }
    }
}

/// The ordering used when the options name none.
fn default_permutation_method(storage: StorageKind, pivots_itself: bool) -> PermutationMethod {
    match storage {
        _ if pivots_itself => PermutationMethod::Natural,
        StorageKind::Dense => PermutationMethod::DecreasingDiagonalValues,
        StorageKind::Sparse => PermutationMethod::MinimumDegree,
    }
}

fn permutation_method(
    matrix: &SymmetricMatrix,
    pivots_itself: bool,
    options: &DecomposeOptions,
) -> PermutationMethod {
    options
        .permutation_method
        .unwrap_or_else(|| default_permutation_method(matrix.storage(), pivots_itself))
}

/// Validates and orders `matrix` for `route`.
fn prepare(
    matrix: &SymmetricMatrix,
    route: Route,
    options: &DecomposeOptions,
) -> DecompResult<Permutation> {
    let method = permutation_method(matrix, route.pivots_itself(), options);
    validate(matrix, method, options)?;
    let permutation = choose(matrix, method)?;
    tracing::debug!(
        n = matrix.n(),
        storage = %matrix.storage(),
        ?route,
        permutation = %method,
        "input validated"
    );
    Ok(permutation)
}

/// Factors `matrix` along `route`, in whatever shape the algorithm yields.
fn factorize(
    matrix: &SymmetricMatrix,
    route: Route,
    options: &DecomposeOptions,
) -> DecompResult<Decomposition> {
    let permutation = prepare(matrix, route, options)?;
    match route {
        Route::Plain => {
            matdecomp_solver::factor(matrix, &permutation, FactorVariant::LDL, &options.factor_options())
        }
        Route::BunchKaufman => Ok(Decomposition::LDLCompressed(matdecomp_solver::bunch_kaufman(
            matrix,
            &permutation,
            &options.factor_options(),
        )?)),
        Route::Modified(method) => Ok(matdecomp_solver::modified_cholesky(
            matrix,
            &permutation,
            method,
            &options.modified_options(),
        )?
        .decomposition),
    }
}

/// Decomposes `matrix` into the shape `options.return_type`.
///
/// With a modification (the default) the result decomposes a positive
/// definite `A + E`; use [`modified_decompose`] to also get `E`. With
/// [`Modification::None`] the result decomposes `A` itself and fails where
/// the pivot policy rejects a pivot.
pub fn decompose(
    matrix: &SymmetricMatrix,
    options: &DecomposeOptions,
) -> DecompResult<Decomposition> {
    let route = Route::select(matrix, options);
    factorize(matrix, route, options)?.as_type(options.return_type)
}

/// Like [`decompose`], taking ownership of `matrix`.
///
/// The matrix is dropped as soon as the factors exist, before they are
/// converted to `options.return_type`, so the two are never both alive
/// during the conversion.
pub fn decompose_owned(
    matrix: SymmetricMatrix,
    options: &DecomposeOptions,
) -> DecompResult<Decomposition> {
    let route = Route::select(&matrix, options);
    let factors = factorize(&matrix, route, options)?;
    drop(matrix);
    factors.as_type(options.return_type)
}

/// Decomposes a positive definite `A + E` and returns `E` with it.
///
/// [`Modification::None`] is treated as [`Modification::Auto`].
pub fn modified_decompose(
    matrix: &SymmetricMatrix,
    options: &DecomposeOptions,
) -> DecompResult<ModifiedDecomposition> {
    let modification = match options.modification {
        Modification::None => Modification::Auto,
        m => m,
    };
    let method = modification
        .resolve(matrix.n(), matrix.storage())
        .unwrap_or(ModificationMethod::Se99);
    let route = Route::Modified(method);
    let permutation = prepare(matrix, route, options)?;
    let modified = matdecomp_solver::modified_cholesky(
        matrix,
        &permutation,
        method,
        &options.modified_options(),
    )?;
    Ok(ModifiedDecomposition {
        decomposition: modified.decomposition.as_type(options.return_type)?,
        perturbation: modified.perturbation,
    })
}

/// Bunch–Kaufman factors of `matrix`.
fn invertible_factors(
    matrix: &SymmetricMatrix,
    options: &DecomposeOptions,
) -> DecompResult<Decomposition> {
    let permutation = prepare(matrix, Route::BunchKaufman, options)?;
    let factor_options = FactorOptions {
        policy: PivotPolicy::Indefinite,
        ..options.factor_options()
    };
    let factors = matdecomp_solver::bunch_kaufman(matrix, &permutation, &factor_options)?;
    Ok(Decomposition::LDLCompressed(factors))
}

/// Solves `A·x = b` for any invertible symmetric `A`.
pub fn solve(matrix: &SymmetricMatrix, b: &[f64], options: &DecomposeOptions) -> DecompResult<Vec<f64>> {
    let mut x = b.to_vec();
    solve_in_place(matrix, &mut x, options)?;
    Ok(x)
}

/// Solves `A·x = b`, overwriting `b` with `x`.
pub fn solve_in_place(
    matrix: &SymmetricMatrix,
    b: &mut [f64],
    options: &DecomposeOptions,
) -> DecompResult<()> {
    matrix.check_square()?;
    validate_rhs(matrix.n(), b)?;
    let decomposition = invertible_factors(matrix, options)?;
    decomposition.check_invertible(&Tolerance::PIVOT)?;
    decomposition.solve_in_place(b)
}

/// Plain factorization under `policy`; a rejected pivot means `false`.
///
/// Pivots are judged against [`Tolerance::PIVOT`], relative to the largest
/// pivot, so definiteness does not depend on the scale of `matrix`. The
/// `atol`/`rtol` options only govern the symmetry check.
fn definiteness(
    matrix: &SymmetricMatrix,
    policy: PivotPolicy,
    options: &DecomposeOptions,
) -> DecompResult<Option<Decomposition>> {
    let permutation = prepare(matrix, Route::Plain, options)?;
    let factor_options = FactorOptions {
        policy,
        ..options.factor_options()
    };
    match matdecomp_solver::factor(matrix, &permutation, FactorVariant::LDL, &factor_options) {
        Ok(decomposition) => Ok(Some(decomposition)),
        Err(DecompError::DecompositionSingular { index, pivot }) => {
            tracing::debug!(index, pivot, %policy, "pivot rejected");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub fn is_positive_definite(matrix: &SymmetricMatrix, options: &DecomposeOptions) -> DecompResult<bool> {
    Ok(definiteness(matrix, PivotPolicy::PositiveDefinite, options)?
        .is_some_and(|d| d.is_positive_definite(&Tolerance::PIVOT)))
}

pub fn is_positive_semidefinite(
    matrix: &SymmetricMatrix,
    options: &DecomposeOptions,
) -> DecompResult<bool> {
    Ok(definiteness(matrix, PivotPolicy::PositiveSemidefinite, options)?
        .is_some_and(|d| d.is_positive_semidefinite(&Tolerance::PIVOT)))
}

pub fn is_invertible(matrix: &SymmetricMatrix, options: &DecomposeOptions) -> DecompResult<bool> {
    Ok(invertible_factors(matrix, options)?.is_invertible(&Tolerance::PIVOT))
}

/// Fills the iteration and size ceilings of `bounds` from `options`.
fn with_ceilings(bounds: &ApproximationBounds, options: &DecomposeOptions) -> ApproximationBounds {
    ApproximationBounds {
        max_iterations: options.max_iterations,
        max_dense_entries: options.max_dense_entries,
        ..bounds.clone()
    }
}

/// Validates and runs the bounded approximation; the ordering defaults
/// to the minimal-difference order.
fn approximate(
    matrix: &SymmetricMatrix,
    bounds: &ApproximationBounds,
    options: &DecomposeOptions,
) -> DecompResult<matdecomp_solver::Approximation> {
    let method = options
        .permutation_method
        .unwrap_or(PermutationMethod::MinimalDifference);
    validate(matrix, method, options)?;
    matdecomp_solver::approximate_decomposition(matrix, &with_ceilings(bounds, options), method)
}

/// Decomposition of the minimal-change approximation `B` of `matrix`
/// within `bounds`, in the shape `options.return_type`.
pub fn approximate_decomposition(
    matrix: &SymmetricMatrix,
    bounds: &ApproximationBounds,
    options: &DecomposeOptions,
) -> DecompResult<Decomposition> {
    let approximation = approximate(matrix, bounds, options)?;
    Decomposition::LDL(approximation.decomposition).as_type(options.return_type)
}

/// A positive semidefinite matrix close to `matrix`.
pub fn positive_semidefinite_matrix(
    matrix: &SymmetricMatrix,
    options: &DecomposeOptions,
) -> DecompResult<SymmetricMatrix> {
    let approximation = approximate(matrix, &ApproximationBounds::positive_semidefinite(), options)?;
    Ok(approximation.matrix()?.clone())
}

/// A positive definite matrix close to `matrix` whose `LDLᵗ` pivots are
/// at least `min_diag_d` (default `√ε`).
pub fn positive_definite_matrix(
    matrix: &SymmetricMatrix,
    min_diag_d: Option<f64>,
    options: &DecomposeOptions,
) -> DecompResult<SymmetricMatrix> {
    let mut bounds = ApproximationBounds::positive_definite();
    if let Some(min) = min_diag_d {
        if !(min > 0.0) {
            return Err(DecompError::InvalidOption(format!(
                "min_diag_d must be positive, got {min}"
            )));
        }
        bounds.min_diag_d = min;
    }
    let approximation = approximate(matrix, &bounds, options)?;
    Ok(approximation.matrix()?.clone())
}
