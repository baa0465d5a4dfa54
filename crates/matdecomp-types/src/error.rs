//! Error types for matdecomp.
//!
//! All crates return `DecompResult<T>` from fallible operations. The
//! variants form a closed taxonomy: malformed input (`Matrix*`),
//! factorization-time failures (`Decomposition*`), resource and iteration
//! limits (`TooManyIterations`, `NoDecompositionPossible*`) and
//! configuration mistakes. [`DecompError::kind`] exposes the category.

use std::path::PathBuf;

use thiserror::Error;

use crate::kinds::{DecompositionType, StorageKind};

/// Coarse category of a [`DecompError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input matrix is malformed.
    Matrix,
    /// A factorization, conversion or persisted file failed.
    Decomposition,
    /// An iteration or size ceiling was hit.
    Resource,
    /// An option or method name is invalid.
    Config,
    /// Reading or writing files failed.
    Io,
}

/// Unified error type for matdecomp.
#[derive(Debug, Error)]
pub enum DecompError {
    /// The matrix is not square.
    #[error("Matrix is not square: {rows}×{cols}")]
    MatrixNotSquare { rows: usize, cols: usize },

    /// The matrix contains NaN or infinite entries.
    #[error("Matrix has a non-finite entry at ({row}, {col})")]
    MatrixNotFinite { row: usize, col: usize },

    /// The matrix is not symmetric within tolerance.
    #[error("Matrix is not Hermitian: entries ({row}, {col}) and ({col}, {row}) differ")]
    MatrixNotHermitian { row: usize, col: usize },

    /// A diagonal value would need a non-real square root.
    #[error("Matrix has a diagonal value {value:e} at index {index} with no real square root")]
    MatrixComplexDiagonalValue { index: usize, value: f64 },

    /// The matrix itself is singular.
    #[error("Matrix is singular (detected at pivot {index})")]
    MatrixSingular { index: usize },

    /// A vector or matrix operand has the wrong length.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// An entry lies outside the matrix shape.
    #[error("Entry ({row}, {col}) lies outside a {rows}×{cols} matrix")]
    MatrixIndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A pivot was zero or had the wrong sign for the requested factorization.
    #[error("Decomposition is singular at leading principal submatrix {index} (pivot {pivot:e})")]
    DecompositionSingular { index: usize, pivot: f64 },

    /// A pivot or factor entry became NaN or infinite.
    #[error("Decomposition produced a non-finite value at index {index}")]
    DecompositionNotFinite { index: usize },

    /// A persisted decomposition is missing arrays or is malformed.
    #[error("Invalid decomposition file {path}: {reason}")]
    DecompositionInvalidFile { path: PathBuf, reason: String },

    /// The type tag of a persisted decomposition is not recognized.
    #[error("Invalid decomposition type '{found}' in {path}")]
    DecompositionInvalidDecompositionTypeFile { path: PathBuf, found: String },

    /// No conversion exists between the two decomposition shapes.
    #[error("No conversion from {from} to {to} decomposition is implemented")]
    NoDecompositionConversionImplemented {
        from: DecompositionType,
        to: DecompositionType,
    },

    /// The numerical backend rejected a matrix or factorization.
    #[error("Backend failure: {0}")]
    Backend(String),

    /// A permutation vector is not a bijection.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),

    /// The permutation method cannot be used with this storage class.
    #[error("Permutation method '{method}' is not supported for {storage} matrices")]
    InvalidPermutationMethod { method: String, storage: StorageKind },

    /// An option value is invalid.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// An iterative sub-solve did not converge.
    #[error("{context} did not converge after {iterations} iterations")]
    TooManyIterations { iterations: usize, context: String },

    /// Bound refinement exceeded its iteration ceiling.
    #[error("No decomposition possible after {iterations} bound refinements")]
    NoDecompositionPossible { iterations: usize },

    /// The working representation would exceed the entry ceiling.
    #[error("No decomposition possible: {entries} entries exceed the limit of {limit}")]
    NoDecompositionPossibleTooManyEntries { entries: usize, limit: usize },

    /// No bounded pivot exists for a leading submatrix.
    #[error("No decomposition possible: no bounded pivot for leading submatrix {index}")]
    NoDecompositionPossibleWithProblematicSubdecomposition { index: usize },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DecompError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MatrixNotSquare { .. }
            | Self::MatrixNotFinite { .. }
            | Self::MatrixNotHermitian { .. }
            | Self::MatrixComplexDiagonalValue { .. }
            | Self::MatrixSingular { .. }
            | Self::DimensionMismatch { .. }
            | Self::MatrixIndexOutOfBounds { .. } => ErrorKind::Matrix,

            Self::DecompositionSingular { .. }
            | Self::DecompositionNotFinite { .. }
            | Self::DecompositionInvalidFile { .. }
            | Self::DecompositionInvalidDecompositionTypeFile { .. }
            | Self::NoDecompositionConversionImplemented { .. }
            | Self::Backend(_) => ErrorKind::Decomposition,

            Self::TooManyIterations { .. }
            | Self::NoDecompositionPossible { .. }
            | Self::NoDecompositionPossibleTooManyEntries { .. }
            | Self::NoDecompositionPossibleWithProblematicSubdecomposition { .. } => {
                ErrorKind::Resource
            }

            Self::InvalidPermutation(_)
            | Self::InvalidPermutationMethod { .. }
            | Self::InvalidOption(_) => ErrorKind::Config,

            Self::Io(_) | Self::Serialization(_) => ErrorKind::Io,
        }
    }

    /// Returns true for failures that a different method, permutation or
    /// tolerance might avoid (singular or non-finite pivots, bound limits).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DecompositionSingular { .. }
                | Self::DecompositionNotFinite { .. }
                | Self::NoDecompositionPossible { .. }
                | Self::NoDecompositionPossibleWithProblematicSubdecomposition { .. }
        )
    }
}

/// Convenience alias for `Result<T, DecompError>`.
pub type DecompResult<T> = Result<T, DecompError>;
