//! Symbolic Cholesky analysis.
//!
//! Computes the elimination tree and the row patterns of `L` for a
//! symmetric pattern, from which the fill count follows without any
//! numeric work.
//!
//! # Components
//!
//! - **Elimination tree**: `parent[j]` is the first row below `j` that
//!   column `j` updates
//! - **Row patterns**: the columns `k < i` with `L[i][k]` structurally
//!   non-zero, found by walking the tree from each entry of row `i`
//! - **Fill count**: non-zeros of `L` including its diagonal

use matdecomp_math::CsrMatrix;
use matdecomp_types::{DecompError, DecompResult};

use crate::permutation::Permutation;

/// Sentinel for a root of the elimination tree.
pub const NO_PARENT: usize = usize::MAX;

/// Structure of `L` for an already permuted symmetric pattern.
#[derive(Debug, Clone)]
pub struct SymbolicStructure {
    /// Elimination tree parent of each column (`NO_PARENT` for roots).
    pub parent: Vec<usize>,
    /// Sorted column indices `k < i` of the off-diagonal entries of row `i`.
    pub row_patterns: Vec<Vec<usize>>,
    /// Number of off-diagonal entries in each column of `L`.
    pub column_counts: Vec<usize>,
}

impl SymbolicStructure {
    /// Analyzes the lower triangle (entries `j < i` of each row) of `matrix`.
    pub fn analyze(matrix: &CsrMatrix) -> Self {
        let n = matrix.rows;
        let parent = elimination_tree(matrix);

        let mut row_patterns = Vec::with_capacity(n);
        let mut column_counts = vec![0usize; n];
        let mut mark = vec![NO_PARENT; n];
        for i in 0..n {
            mark[i] = i;
            let mut pattern = Vec::new();
            for &j in matrix.row_indices(i) {
                if j >= i {
                    continue;
                }
                let mut k = j;
                while mark[k] != i {
                    pattern.push(k);
                    column_counts[k] += 1;
                    mark[k] = i;
                    k = parent[k];
                    if k == NO_PARENT {
                        break;
                    }
                }
            }
            // Ascending order is topological: parents have larger indices.
            pattern.sort_unstable();
            row_patterns.push(pattern);
        }

        Self {
            parent,
            row_patterns,
            column_counts,
        }
    }

    pub fn n(&self) -> usize {
        self.parent.len()
    }

    /// Non-zeros of `L` including the diagonal.
    pub fn fill_count(&self) -> usize {
        self.n() + self.row_patterns.iter().map(Vec::len).sum::<usize>()
    }
}

/// Elimination tree of a symmetric pattern, by rows with path compression
/// (Liu's algorithm).
pub fn elimination_tree(matrix: &CsrMatrix) -> Vec<usize> {
    let n = matrix.rows;
    let mut parent = vec![NO_PARENT; n];
    let mut ancestor = vec![NO_PARENT; n];
    for i in 0..n {
        for &j in matrix.row_indices(i) {
            if j >= i {
                continue;
            }
            let mut k = j;
            while ancestor[k] != NO_PARENT && ancestor[k] != i {
                let next = ancestor[k];
                ancestor[k] = i;
                k = next;
            }
            if ancestor[k] == NO_PARENT {
                ancestor[k] = i;
                parent[k] = i;
            }
        }
    }
    parent
}

/// Non-zeros of `L` (including the diagonal) for `matrix` under `perm`.
///
/// This is the score `best` minimizes.
pub fn fill_count(matrix: &CsrMatrix, perm: &Permutation) -> DecompResult<usize> {
    if perm.len() != matrix.rows {
        return Err(DecompError::DimensionMismatch {
            expected: matrix.rows,
            found: perm.len(),
        });
    }
    let permuted = if perm.is_identity() {
        matrix.clone()
    } else {
        matrix.symmetric_permute(perm.p(), perm.p_inverse())
    };
    Ok(SymbolicStructure::analyze(&permuted).fill_count())
}
