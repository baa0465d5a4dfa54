//! # matdecomp-solver
//!
//! Factorization algorithms producing matdecomp decompositions.
//!
//! ## Key Types
//!
//! - [`factor`] — Cholesky / `LDLᵗ` under a fixed permutation (dense and sparse)
//! - [`bunch_kaufman`] — indefinite `LDLᵗ` with 1×1 and 2×2 pivot blocks
//! - [`modified_cholesky`] — GMW and SE modified Cholesky with perturbation record
//! - [`approximate_decomposition`] — bounded minimal-change approximation
//! - [`PivotRule`] — pluggable pivot policy of the elimination kernel
//! - [`FactorOptions`], [`ModifiedOptions`], [`ApproximationBounds`] — configuration

pub mod approximate;
pub mod bunch_kaufman;
pub mod cholesky;
pub mod config;
pub mod elimination;
pub mod modified;
pub mod strategy;
mod workspace;

pub use approximate::{Approximation, approximate_decomposition, approximate_matrix};
pub use bunch_kaufman::bunch_kaufman;
pub use cholesky::{cholesky, factor};
pub use config::{
    ApproximationBounds, DiagonalBound, FactorOptions, FactorVariant, ModifiedOptions, PivotPolicy,
};
pub use modified::{
    ModificationMethod, ModifiedDecomposition, Perturbation, Termination, modified_cholesky,
};
pub use strategy::{Pivot, PivotRule, PivotSource, ThresholdRule};
