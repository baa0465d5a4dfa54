//! The middle factor `D`: identity, diagonal, or block diagonal with 1×1
//! and 2×2 blocks.

use matdecomp_math::Mat;
use matdecomp_types::{DecompError, DecompResult};

/// Block-diagonal `D` with 2×2 blocks at `block_starts`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDiagonal {
    /// `D[k][k]`.
    pub diagonal: Vec<f64>,
    /// `D[k+1][k]`, zero unless `k` starts a 2×2 block.
    pub off_diagonal: Vec<f64>,
    /// Strictly increasing, non-overlapping starts of 2×2 blocks.
    pub block_starts: Vec<usize>,
}

impl BlockDiagonal {
    /// Builds `D` from its diagonal, block starts and block couplings.
    pub fn new(diagonal: Vec<f64>, block_starts: Vec<usize>, couplings: &[f64]) -> DecompResult<Self> {
        let n = diagonal.len();
        validate_block_starts(&block_starts, n)?;
        if couplings.len() != block_starts.len() {
            return Err(DecompError::DimensionMismatch {
                expected: block_starts.len(),
                found: couplings.len(),
            });
        }
        let mut off_diagonal = vec![0.0; n];
        for (&k, &b) in block_starts.iter().zip(couplings) {
            off_diagonal[k] = b;
        }
        Ok(Self {
            diagonal,
            off_diagonal,
            block_starts,
        })
    }

    pub fn n(&self) -> usize {
        self.diagonal.len()
    }

    /// The coupled index and coupling value if `k` lies in a 2×2 block.
    pub fn partner(&self, k: usize) -> Option<(usize, f64)> {
        if self.block_starts.binary_search(&k).is_ok() {
            Some((k + 1, self.off_diagonal[k]))
        } else if k > 0 && self.block_starts.binary_search(&(k - 1)).is_ok() {
            Some((k - 1, self.off_diagonal[k - 1]))
        } else {
            None
        }
    }

    /// Eigenvalues of each block, in position order.
    pub fn eigenvalues(&self) -> Vec<f64> {
        let mut eig = self.diagonal.clone();
        for &k in &self.block_starts {
            let (lo, hi) = symmetric_2x2_eigenvalues(
                self.diagonal[k],
                self.off_diagonal[k],
                self.diagonal[k + 1],
            );
            eig[k] = lo;
            eig[k + 1] = hi;
        }
        eig
    }
}

/// Checks that 2×2 blocks fit in `0..n` and do not overlap.
pub fn validate_block_starts(block_starts: &[usize], n: usize) -> DecompResult<()> {
    let mut next_free = 0usize;
    for &k in block_starts {
        if k < next_free || k + 1 >= n {
            return Err(DecompError::InvalidOption(format!(
                "invalid 2×2 block start {k} for dimension {n}"
            )));
        }
        next_free = k + 2;
    }
    Ok(())
}

/// Eigenvalues `(lower, upper)` of `[[a, b], [b, c]]`.
pub fn symmetric_2x2_eigenvalues(a: f64, b: f64, c: f64) -> (f64, f64) {
    let mean = 0.5 * (a + c);
    let radius = (0.5 * (a - c)).hypot(b);
    (mean - radius, mean + radius)
}

/// Borrowed view of `D` for a decomposition.
#[derive(Debug, Clone, Copy)]
pub enum DiagonalPart<'a> {
    /// `D = I` (the LL shape).
    Identity(usize),
    Diagonal(&'a [f64]),
    Blocks(&'a BlockDiagonal),
}

impl DiagonalPart<'_> {
    pub fn n(&self) -> usize {
        match self {
            Self::Identity(n) => *n,
            Self::Diagonal(d) => d.len(),
            Self::Blocks(b) => b.n(),
        }
    }

    pub fn diagonal_value(&self, k: usize) -> f64 {
        match self {
            Self::Identity(_) => 1.0,
            Self::Diagonal(d) => d[k],
            Self::Blocks(b) => b.diagonal[k],
        }
    }

    pub fn block_partner(&self, k: usize) -> Option<(usize, f64)> {
        match self {
            Self::Blocks(b) => b.partner(k),
            _ => None,
        }
    }

    /// Eigenvalues of `D` in position order.
    pub fn eigenvalues(&self) -> Vec<f64> {
        match self {
            Self::Identity(n) => vec![1.0; *n],
            Self::Diagonal(d) => d.to_vec(),
            Self::Blocks(b) => b.eigenvalues(),
        }
    }

    pub fn first_non_finite(&self) -> Option<usize> {
        match self {
            Self::Identity(_) => None,
            Self::Diagonal(d) => d.iter().position(|v| !v.is_finite()),
            Self::Blocks(b) => (0..b.n())
                .find(|&k| !b.diagonal[k].is_finite() || !b.off_diagonal[k].is_finite()),
        }
    }

    /// `X ← X·D`.
    pub fn apply_right(&self, x: &mut Mat<f64>) {
        match self {
            Self::Identity(_) => {}
            Self::Diagonal(d) => {
                for j in 0..x.ncols() {
                    for i in 0..x.nrows() {
                        x[(i, j)] *= d[j];
                    }
                }
            }
            Self::Blocks(b) => {
                let mut scaled = x.clone();
                for j in 0..x.ncols() {
                    for i in 0..x.nrows() {
                        scaled[(i, j)] = x[(i, j)] * b.diagonal[j];
                    }
                }
                for &k in &b.block_starts {
                    let c = b.off_diagonal[k];
                    for i in 0..x.nrows() {
                        scaled[(i, k)] += x[(i, k + 1)] * c;
                        scaled[(i, k + 1)] += x[(i, k)] * c;
                    }
                }
                *x = scaled;
            }
        }
    }

    /// `W ← D·W`.
    pub fn apply_left(&self, w: &mut Mat<f64>) {
        match self {
            Self::Identity(_) => {}
            Self::Diagonal(d) => {
                for j in 0..w.ncols() {
                    for i in 0..w.nrows() {
                        w[(i, j)] *= d[i];
                    }
                }
            }
            Self::Blocks(b) => {
                for j in 0..w.ncols() {
                    let column: Vec<f64> = (0..w.nrows()).map(|i| w[(i, j)]).collect();
                    for i in 0..w.nrows() {
                        w[(i, j)] = b.diagonal[i] * column[i];
                    }
                    for &k in &b.block_starts {
                        let c = b.off_diagonal[k];
                        w[(k, j)] += c * column[k + 1];
                        w[(k + 1, j)] += c * column[k];
                    }
                }
            }
        }
    }

    /// `W ← D⁻¹·W`. Callers check invertibility first.
    pub fn solve_left(&self, w: &mut Mat<f64>) {
        match self {
            Self::Identity(_) => {}
            Self::Diagonal(d) => {
                for j in 0..w.ncols() {
                    for i in 0..w.nrows() {
                        w[(i, j)] /= d[i];
                    }
                }
            }
            Self::Blocks(b) => {
                for j in 0..w.ncols() {
                    let mut i = 0;
                    while i < w.nrows() {
                        match b.partner(i) {
                            Some((next, c)) if next == i + 1 => {
                                let (a, e) = (b.diagonal[i], b.diagonal[i + 1]);
                                let det = a * e - c * c;
                                let (r0, r1) = (w[(i, j)], w[(i + 1, j)]);
                                w[(i, j)] = (e * r0 - c * r1) / det;
                                w[(i + 1, j)] = (a * r1 - c * r0) / det;
                                i += 2;
                            }
                            _ => {
                                w[(i, j)] /= b.diagonal[i];
                                i += 1;
                            }
                        }
                    }
                }
            }
        }
    }
}
