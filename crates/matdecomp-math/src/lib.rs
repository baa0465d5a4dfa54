//! # matdecomp-math
//!
//! Matrix backend adapter for the matdecomp decomposition engine.
//!
//! Provides:
//! - Sparse matrix representation (CSR) with the symmetric helpers the
//!   factorizations need
//! - [`SymmetricMatrix`], a uniform view over dense (`faer::Mat<f64>`) and
//!   sparse storage: shape, diagonal, finiteness, products, conversions
//! - Dense triangular/product kernels delegated to `faer`
//! - An independent sparse Cholesky solver on faer's supernodal LLᵀ

pub mod dense;
pub mod faer_solver;
pub mod matrix;
pub mod sparse;

pub use faer::Mat;
pub use matrix::{StoredMatrix, SymmetricMatrix};
pub use sparse::{CsrMatrix, DirectSolver};
pub use faer_solver::FaerSolver;
