//! Permutation method selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use matdecomp_math::SymmetricMatrix;
use matdecomp_types::{DecompError, DecompResult, StorageKind};

use crate::fill;
use crate::graph::AdjacencyGraph;
use crate::permutation::Permutation;
use crate::stability;

/// Named ordering strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermutationMethod {
    /// Identity ordering.
    #[serde(alias = "none")]
    Natural,
    DecreasingDiagonalValues,
    IncreasingDiagonalValues,
    DecreasingAbsoluteDiagonalValues,
    IncreasingAbsoluteDiagonalValues,
    /// Greedy minimum degree on the elimination graph (sparse only).
    MinimumDegree,
    /// Reverse Cuthill–McKee bandwidth reduction (sparse only).
    ReverseCuthillMckee,
    /// Recursive level-structure bisection (sparse only).
    NestedDissection,
    /// The fill-reducing ordering with the fewest non-zeros in `L` (sparse only).
    Best,
    /// Chosen row by row during the bounded approximation; not a
    /// precomputed ordering.
    MinimalDifference,
    /// Like `MinimalDifference`, but the row allowing the largest pivot wins.
    MaximalStability,
}

impl PermutationMethod {
    /// Orderings that depend only on the diagonal.
    pub const STABILITY: [PermutationMethod; 5] = [
        Self::Natural,
        Self::DecreasingDiagonalValues,
        Self::IncreasingDiagonalValues,
        Self::DecreasingAbsoluteDiagonalValues,
        Self::IncreasingAbsoluteDiagonalValues,
    ];

    /// Orderings computed from the sparsity graph, in the order `best` tries them.
    pub const FILL_REDUCING: [PermutationMethod; 3] = [
        Self::MinimumDegree,
        Self::ReverseCuthillMckee,
        Self::NestedDissection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::DecreasingDiagonalValues => "decreasing_diagonal_values",
            Self::IncreasingDiagonalValues => "increasing_diagonal_values",
            Self::DecreasingAbsoluteDiagonalValues => "decreasing_absolute_diagonal_values",
            Self::IncreasingAbsoluteDiagonalValues => "increasing_absolute_diagonal_values",
            Self::MinimumDegree => "minimum_degree",
            Self::ReverseCuthillMckee => "reverse_cuthill_mckee",
            Self::NestedDissection => "nested_dissection",
            Self::Best => "best",
            Self::MinimalDifference => "minimal_difference",
            Self::MaximalStability => "maximal_stability",
        }
    }

    /// True for orderings the bounded approximation builds while
    /// eliminating.
    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::MinimalDifference | Self::MaximalStability)
    }

    /// True for methods that require sparse storage.
    pub fn is_fill_reducing(self) -> bool {
        matches!(
            self,
            Self::MinimumDegree | Self::ReverseCuthillMckee | Self::NestedDissection | Self::Best
        )
    }

    /// Fails with `InvalidPermutationMethod` if this method cannot order a
    /// matrix of the given storage class as a precomputed permutation.
    pub fn check_storage(self, storage: StorageKind) -> DecompResult<()> {
        let unsupported = match self {
            m if m.is_dynamic() => true,
            m if m.is_fill_reducing() => storage == StorageKind::Dense,
            _ => false,
        };
        if unsupported {
            return Err(DecompError::InvalidPermutationMethod {
                method: self.name().to_string(),
                storage,
            });
        }
        Ok(())
    }
}

impl fmt::Display for PermutationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PermutationMethod {
    type Err = DecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if key.is_empty() || key == "none" {
            return Ok(Self::Natural);
        }
        Self::STABILITY
            .iter()
            .chain(Self::FILL_REDUCING.iter())
            .chain([Self::Best, Self::MinimalDifference, Self::MaximalStability].iter())
            .copied()
            .find(|m| m.name() == key)
            .ok_or_else(|| {
                DecompError::InvalidOption(format!("unknown permutation method '{}'", s.trim()))
            })
    }
}

/// Computes the permutation `method` assigns to `matrix`.
pub fn choose(matrix: &SymmetricMatrix, method: PermutationMethod) -> DecompResult<Permutation> {
    matrix.check_square()?;
    method.check_storage(matrix.storage())?;
    let n = matrix.n();

    let perm = match (method, matrix) {
        (PermutationMethod::Natural, _) => Permutation::identity(n),
        (m, SymmetricMatrix::Sparse(sparse)) if m.is_fill_reducing() => {
            let graph = AdjacencyGraph::from_pattern(sparse);
            match m {
                PermutationMethod::MinimumDegree => fill::minimum_degree(&graph)?,
                PermutationMethod::ReverseCuthillMckee => fill::reverse_cuthill_mckee(&graph)?,
                PermutationMethod::NestedDissection => fill::nested_dissection(&graph)?,
                _ => fill::best(sparse, &graph)?,
            }
        }
        (m, _) => stability::diagonal_ordering(&matrix.diagonal(), m)?,
    };

    tracing::debug!(method = %method, n, identity = perm.is_identity(), "permutation chosen");
    Ok(perm)
}
