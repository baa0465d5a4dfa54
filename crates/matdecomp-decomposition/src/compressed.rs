//! The compressed `LDL` shape: `D` packed onto the diagonal of `L`.
//!
//! `ld[i][i]` holds `D[i][i]`. A 2×2 block starting at `k` keeps its
//! coupling `D[k+1][k]` in `ld[k+1][k]`, where the unit factor has a zero.

use std::sync::OnceLock;

use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult, DecompositionType};

use crate::blocks::{BlockDiagonal, DiagonalPart, validate_block_starts};
use crate::factor::TriangularFactor;
use crate::factorization::{Factorization, Factors};
use crate::ldl::LdlDecomposition;

#[derive(Debug, Clone)]
struct Expanded {
    /// Unit factor with block couplings removed; `None` when `ld` serves as is.
    l: Option<TriangularFactor>,
    d: BlockDiagonal,
}

/// `LDLᵗ` decomposition with 1×1 and 2×2 diagonal blocks, stored packed.
#[derive(Debug, Clone)]
pub struct LdlCompressedDecomposition {
    ld: TriangularFactor,
    block_starts: Vec<usize>,
    p: Permutation,
    expanded: OnceLock<Expanded>,
    composed: OnceLock<SymmetricMatrix>,
}

impl LdlCompressedDecomposition {
    pub fn new(ld: TriangularFactor, block_starts: Vec<usize>, p: Permutation) -> DecompResult<Self> {
        if ld.n() != p.len() {
            return Err(DecompError::DimensionMismatch {
                expected: p.len(),
                found: ld.n(),
            });
        }
        validate_block_starts(&block_starts, ld.n())?;
        Ok(Self {
            ld,
            block_starts,
            p,
            expanded: OnceLock::new(),
            composed: OnceLock::new(),
        })
    }

    pub fn ld(&self) -> &TriangularFactor {
        &self.ld
    }

    pub fn block_starts(&self) -> &[usize] {
        &self.block_starts
    }

    /// True if `D` is diagonal (no 2×2 blocks).
    pub fn is_diagonal(&self) -> bool {
        self.block_starts.is_empty()
    }

    /// The block-diagonal middle factor.
    pub fn d(&self) -> &BlockDiagonal {
        &self.expanded().d
    }

    fn expanded(&self) -> &Expanded {
        self.expanded.get_or_init(|| {
            let diagonal = self.ld.diagonal();
            let couplings: Vec<f64> = self
                .block_starts
                .iter()
                .map(|&k| self.ld.get(k + 1, k))
                .collect();
            let l = (!self.block_starts.is_empty()).then(|| {
                self.ld.map(|i, j, v| {
                    if i == j + 1 && self.block_starts.binary_search(&j).is_ok() {
                        0.0
                    } else {
                        v
                    }
                })
            });
            let mut off_diagonal = vec![0.0; diagonal.len()];
            for (&k, &b) in self.block_starts.iter().zip(&couplings) {
                off_diagonal[k] = b;
            }
            // Block starts were validated in `new`.
            let d = BlockDiagonal {
                diagonal,
                off_diagonal,
                block_starts: self.block_starts.clone(),
            };
            Expanded { l, d }
        })
    }

    /// Unpacks into `L` and diagonal `D`; 2×2 blocks have no diagonal form.
    pub fn to_ldl(&self) -> DecompResult<LdlDecomposition> {
        if !self.is_diagonal() {
            return Err(DecompError::NoDecompositionConversionImplemented {
                from: DecompositionType::LDLCompressed,
                to: DecompositionType::LDL,
            });
        }
        let d = self.ld.diagonal();
        let ones = vec![1.0; d.len()];
        LdlDecomposition::new(self.ld.with_diagonal(&ones), d, self.p.clone())
    }
}

impl Factorization for LdlCompressedDecomposition {
    fn decomposition_type(&self) -> DecompositionType {
        DecompositionType::LDLCompressed
    }

    fn permutation(&self) -> &Permutation {
        &self.p
    }

    fn factors(&self) -> Factors<'_> {
        let expanded = self.expanded();
        Factors {
            l: expanded.l.as_ref().unwrap_or(&self.ld),
            unit_diagonal: true,
            d: DiagonalPart::Blocks(&expanded.d),
        }
    }

    fn composed_cache(&self) -> &OnceLock<SymmetricMatrix> {
        &self.composed
    }
}
