//! The `LDL` shape: `P·A·Pᵗ = L·D·Lᵗ` with unit lower-triangular `L`.

use std::sync::OnceLock;

use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult, DecompositionType};

use crate::blocks::DiagonalPart;
use crate::compressed::LdlCompressedDecomposition;
use crate::factor::TriangularFactor;
use crate::factorization::{Factorization, Factors};
use crate::ll::LlDecomposition;

/// `LDLᵗ` decomposition with diagonal `D`.
#[derive(Debug, Clone)]
pub struct LdlDecomposition {
    l: TriangularFactor,
    d: Vec<f64>,
    p: Permutation,
    composed: OnceLock<SymmetricMatrix>,
}

impl LdlDecomposition {
    /// The stored diagonal of `l` is ignored and taken as one.
    pub fn new(l: TriangularFactor, d: Vec<f64>, p: Permutation) -> DecompResult<Self> {
        if l.n() != p.len() {
            return Err(DecompError::DimensionMismatch {
                expected: p.len(),
                found: l.n(),
            });
        }
        if d.len() != p.len() {
            return Err(DecompError::DimensionMismatch {
                expected: p.len(),
                found: d.len(),
            });
        }
        Ok(Self {
            l,
            d,
            p,
            composed: OnceLock::new(),
        })
    }

    pub fn l(&self) -> &TriangularFactor {
        &self.l
    }

    pub fn d(&self) -> &[f64] {
        &self.d
    }

    /// `L ← L·sqrt(D)`. Negative `d_i` have no real square root.
    pub fn to_ll(&self) -> DecompResult<LlDecomposition> {
        if let Some(index) = self.d.iter().position(|&v| v < 0.0) {
            return Err(DecompError::MatrixComplexDiagonalValue {
                index,
                value: self.d[index],
            });
        }
        let ones = vec![1.0; self.d.len()];
        let sqrt_d: Vec<f64> = self.d.iter().map(|v| v.sqrt()).collect();
        let l = self.l.with_diagonal(&ones).scale_columns(&sqrt_d);
        LlDecomposition::new(l, self.p.clone())
    }

    /// Packs `D` onto the diagonal of `L`.
    pub fn to_compressed(&self) -> DecompResult<LdlCompressedDecomposition> {
        LdlCompressedDecomposition::new(self.l.with_diagonal(&self.d), Vec::new(), self.p.clone())
    }
}

impl Factorization for LdlDecomposition {
    fn decomposition_type(&self) -> DecompositionType {
        DecompositionType::LDL
    }

    fn permutation(&self) -> &Permutation {
        &self.p
    }

    fn factors(&self) -> Factors<'_> {
        Factors {
            l: &self.l,
            unit_diagonal: true,
            d: DiagonalPart::Diagonal(&self.d),
        }
    }

    fn composed_cache(&self) -> &OnceLock<SymmetricMatrix> {
        &self.composed
    }
}
