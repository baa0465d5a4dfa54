//! Reference sparse solver on faer's supernodal LLᵀ.
//!
//! [`FaerSolver`] shares no code with the decomposition engine, so it
//! serves as an independent check of solutions for positive definite
//! systems (the CLI `solve --verify` flag, and tests).
//!
//! The symbolic analysis depends only on the upper-triangle pattern and
//! is kept across `factorize` calls; a matrix with the same pattern
//! only pays for the numeric phase.

use faer::Side;
use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::{SparseColMat, Triplet};

use matdecomp_types::{DecompError, DecompResult};

use crate::sparse::{CsrMatrix, DirectSolver};

/// Upper triangle of a CSR matrix, as faer triplets plus its pattern.
struct UpperTriangle {
    triplets: Vec<Triplet<usize, usize, f64>>,
    pattern: Vec<(usize, usize)>,
}

impl UpperTriangle {
    fn of(matrix: &CsrMatrix) -> Self {
        let mut triplets = Vec::with_capacity(matrix.nnz());
        let mut pattern = Vec::with_capacity(matrix.nnz());
        for row in 0..matrix.rows {
            for (col, val) in matrix.row(row).filter(|&(col, _)| col >= row) {
                triplets.push(Triplet { row, col, val });
                pattern.push((row, col));
            }
        }
        Self { triplets, pattern }
    }

    fn to_csc(&self, n: usize) -> DecompResult<SparseColMat<usize, f64>> {
        SparseColMat::try_new_from_triplets(n, n, &self.triplets)
            .map_err(|e| DecompError::Backend(format!("CSC assembly failed: {e:?}")))
    }
}

/// Symbolic analysis together with the pattern it was computed for.
struct Analysis {
    n: usize,
    pattern: Vec<(usize, usize)>,
    symbolic: SymbolicLlt<usize>,
}

/// Sparse LLᵀ solver for symmetric positive definite [`CsrMatrix`] systems.
#[derive(Default)]
pub struct FaerSolver {
    analysis: Option<Analysis>,
    factor: Option<(usize, Llt<usize, f64>)>,
}

impl FaerSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbolic analysis of `csc`, reused while the pattern is unchanged.
    fn analysis_for(
        &mut self,
        n: usize,
        upper: &UpperTriangle,
        csc: &SparseColMat<usize, f64>,
    ) -> DecompResult<SymbolicLlt<usize>> {
        if let Some(analysis) = &self.analysis {
            if analysis.n == n && analysis.pattern == upper.pattern {
                return Ok(analysis.symbolic.clone());
            }
        }
        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| DecompError::Backend(format!("symbolic analysis failed: {e:?}")))?;
        self.analysis = Some(Analysis {
            n,
            pattern: upper.pattern.clone(),
            symbolic: symbolic.clone(),
        });
        Ok(symbolic)
    }
}

impl DirectSolver for FaerSolver {
    fn factorize(&mut self, matrix: &CsrMatrix) -> DecompResult<()> {
        let (rows, cols) = (matrix.rows, matrix.cols);
        if rows != cols {
            return Err(DecompError::MatrixNotSquare { rows, cols });
        }
        if rows == 0 {
            return Err(DecompError::Backend("empty matrix".into()));
        }
        self.factor = None;

        let upper = UpperTriangle::of(matrix);
        let csc = upper.to_csc(rows)?;
        let symbolic = self.analysis_for(rows, &upper, &csc)?;
        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
            .map_err(|e| DecompError::Backend(format!("LLᵀ factorization failed: {e:?}")))?;

        tracing::debug!(n = rows, nnz = upper.pattern.len(), "reference LLᵀ factorized");
        self.factor = Some((rows, llt));
        Ok(())
    }

    fn solve(&self, rhs: &[f64], solution: &mut [f64]) -> DecompResult<()> {
        let (n, llt) = self
            .factor
            .as_ref()
            .ok_or_else(|| DecompError::Backend("factorize() has not succeeded yet".into()))?;

        for len in [rhs.len(), solution.len()] {
            if len != *n {
                return Err(DecompError::DimensionMismatch { expected: *n, found: len });
            }
        }

        let b = faer::Mat::from_fn(*n, 1, |i, _| rhs[i]);
        let x = llt.solve(&b);
        for (i, out) in solution.iter_mut().enumerate() {
            *out = x[(i, 0)];
        }
        Ok(())
    }

    fn is_factorized(&self) -> bool {
        self.factor.is_some()
    }
}
