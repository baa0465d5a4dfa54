//! Numerical constants and defaults.

/// Type tag of an `LL` decomposition.
pub const LL_TYPE_STR: &str = "LL";

/// Type tag of an `LDL` decomposition.
pub const LDL_TYPE_STR: &str = "LDL";

/// Type tag of a compressed `LDL` decomposition.
pub const LDL_COMPRESSED_TYPE_STR: &str = "LDL_compressed";

/// Default absolute tolerance for equality and property checks.
pub const DEFAULT_ATOL: f64 = 1.0e-8;

/// Default relative tolerance for equality and property checks.
pub const DEFAULT_RTOL: f64 = 1.0e-5;

/// Relative pivot threshold, scaled by the largest absolute diagonal entry.
/// Pivots at or below it are treated as zero.
pub const DEFAULT_PIVOT_RTOL: f64 = 1.0e3 * f64::EPSILON;

/// Absolute pivot threshold floor.
pub const DEFAULT_PIVOT_ATOL: f64 = f64::MIN_POSITIVE;

/// Default ceiling for bound refinement and iterative sub-solves.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default ceiling on entries of a dense working copy (n² for n×n).
pub const DEFAULT_MAX_DENSE_ENTRIES: usize = 1 << 26;

/// Largest dimension for which automatic method selection prefers the
/// most conservative (dense, pivoting) modified Cholesky variant.
pub const AUTO_CONSERVATIVE_MAX_N: usize = 1000;

/// Entries with magnitude below this are dropped when converting factors
/// to sparse storage.
pub const SPARSE_DROP_TOLERANCE: f64 = 0.0;
