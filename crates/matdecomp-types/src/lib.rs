//! # matdecomp-types
//!
//! Shared types, error taxonomy, decomposition tags and numerical
//! constants for the matdecomp workspace.
//!
//! This crate has zero numerical logic — it defines the vocabulary
//! that all other matdecomp crates share.

pub mod constants;
pub mod error;
pub mod kinds;
pub mod tolerance;

pub use error::{DecompError, DecompResult, ErrorKind};
pub use kinds::{DecompositionType, StorageKind};
pub use tolerance::Tolerance;
