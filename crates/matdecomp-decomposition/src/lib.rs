//! # matdecomp-decomposition
//!
//! Immutable decomposition values `P·A·Pᵗ = L·D·Lᵗ` in three shapes:
//!
//! - [`LlDecomposition`]: `D = I`, `L` with a general diagonal
//! - [`LdlDecomposition`]: unit `L`, diagonal `D`
//! - [`LdlCompressedDecomposition`]: `D` (1×1 and 2×2 blocks) packed onto
//!   the diagonal of `L`
//!
//! The [`Factorization`] trait provides solving, reconstruction,
//! inversion-free products and definiteness tests for all of them;
//! [`Decomposition`] tags the shape and adds conversion, equality and
//! directory persistence.

pub mod blocks;
pub mod compressed;
pub mod decomposition;
pub mod factor;
pub mod factorization;
pub mod ldl;
pub mod ll;
pub mod persist;

pub use blocks::{BlockDiagonal, DiagonalPart};
pub use compressed::LdlCompressedDecomposition;
pub use decomposition::Decomposition;
pub use factor::TriangularFactor;
pub use factorization::{Factorization, Factors};
pub use ldl::LdlDecomposition;
pub use ll::LlDecomposition;
