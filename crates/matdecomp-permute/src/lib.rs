//! # matdecomp-permute
//!
//! Permutation engine for symmetric factorizations.
//!
//! Provides:
//! - [`Permutation`], a validated bijection with its inverse, applied to
//!   vectors and matrices as `P·A·Pᵗ`
//! - Stability orderings by (absolute) diagonal value, usable on any storage
//! - Fill-reducing orderings on the sparsity graph: minimum degree,
//!   reverse Cuthill–McKee, nested dissection and `best` (scored by fill)
//! - Symbolic analysis (elimination tree, row patterns of `L`, fill count)
//!   shared with the sparse factorization

pub mod fill;
pub mod graph;
pub mod method;
pub mod permutation;
pub mod stability;
pub mod symbolic;

pub use method::{PermutationMethod, choose};
pub use permutation::Permutation;
pub use symbolic::{SymbolicStructure, fill_count};
