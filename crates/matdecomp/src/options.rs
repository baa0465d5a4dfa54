//! Facade configuration.
//!
//! Options accepted by every entry point of the facade, loadable from TOML.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use matdecomp_permute::PermutationMethod;
use matdecomp_solver::{FactorOptions, ModificationMethod, ModifiedOptions, PivotPolicy};
use matdecomp_types::constants::{
    AUTO_CONSERVATIVE_MAX_N, DEFAULT_ATOL, DEFAULT_MAX_DENSE_ENTRIES, DEFAULT_MAX_ITERATIONS,
    DEFAULT_RTOL,
};
use matdecomp_types::{DecompError, DecompResult, DecompositionType, StorageKind, Tolerance};

/// Whether and how `decompose` perturbs the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Modification {
    /// Plain factorization; fails on matrices the pivot policy rejects.
    None,
    /// SE_99 for dense matrices up to `AUTO_CONSERVATIVE_MAX_N` rows,
    /// GMW_T1 otherwise.
    Auto,
    Method(ModificationMethod),
}

impl Modification {
    /// The method this modification runs for a matrix of the given shape.
    pub fn resolve(self, n: usize, storage: StorageKind) -> Option<ModificationMethod> {
        match self {
            Self::None => None,
            Self::Method(m) => Some(m),
            Self::Auto if storage == StorageKind::Dense && n <= AUTO_CONSERVATIVE_MAX_N => {
                Some(ModificationMethod::Se99)
            }
            Self::Auto => Some(ModificationMethod::GmwT1),
        }
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Auto => f.write_str("auto"),
            Self::Method(m) => write!(f, "{m}"),
        }
    }
}

impl FromStr for Modification {
    type Err = DecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "auto" => Ok(Self::Auto),
            _ => s.parse().map(Self::Method),
        }
    }
}

impl TryFrom<String> for Modification {
    type Error = DecompError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Modification> for String {
    fn from(m: Modification) -> Self {
        m.to_string()
    }
}

/// Options of the facade entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposeOptions {
    /// Reject NaN and infinite entries before any numeric work.
    pub check_finite: bool,

    /// Reject matrices that are not symmetric within `atol`/`rtol`.
    pub check_hermitian: bool,

    /// Ceiling on rescaled retries and on Newton iterations.
    pub max_iterations: usize,

    /// Absolute tolerance of the symmetry and definiteness checks.
    pub atol: f64,

    /// Relative tolerance of the symmetry and definiteness checks.
    pub rtol: f64,

    /// Ordering; `None` picks one suited to the storage class and algorithm.
    pub permutation_method: Option<PermutationMethod>,

    pub return_type: DecompositionType,

    pub modification: Modification,

    /// Pivot policy of the plain factorization (`Modification::None`).
    pub policy: PivotPolicy,

    /// Ceiling on `n²` for dense working copies of sparse matrices.
    pub max_dense_entries: usize,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        Self {
            check_finite: true,
            check_hermitian: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            atol: DEFAULT_ATOL,
            rtol: DEFAULT_RTOL,
            permutation_method: None,
            return_type: DecompositionType::LDL,
            modification: Modification::Auto,
            policy: PivotPolicy::PositiveDefinite,
            max_dense_entries: DEFAULT_MAX_DENSE_ENTRIES,
        }
    }
}

impl DecomposeOptions {
    /// Plain Cholesky that fails on anything not positive definite.
    pub fn strict() -> Self {
        Self {
            return_type: DecompositionType::LL,
            modification: Modification::None,
            ..Default::default()
        }
    }

    /// Always succeeds on finite symmetric input by perturbing it.
    pub fn robust() -> Self {
        Self {
            modification: Modification::Method(ModificationMethod::Se99),
            max_iterations: 4 * DEFAULT_MAX_ITERATIONS,
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> DecompResult<Self> {
        toml::from_str(s).map_err(|e| DecompError::InvalidOption(format!("invalid options: {e}")))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> DecompResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> DecompResult<String> {
        toml::to_string(self).map_err(|e| DecompError::Serialization(e.to_string()))
    }

    pub fn tolerance(&self) -> DecompResult<Tolerance> {
        Tolerance::new(self.atol, self.rtol)
    }

    pub fn factor_options(&self) -> FactorOptions {
        FactorOptions {
            policy: self.policy,
            max_dense_entries: self.max_dense_entries,
            ..Default::default()
        }
    }

    pub fn modified_options(&self) -> ModifiedOptions {
        ModifiedOptions {
            max_iterations: self.max_iterations,
            max_dense_entries: self.max_dense_entries,
        }
    }
}
