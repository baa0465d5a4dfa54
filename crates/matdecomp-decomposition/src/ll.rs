//! The `LL` shape: `P·A·Pᵗ = L·Lᵗ`.

use std::sync::OnceLock;

use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult, DecompositionType};

use crate::blocks::DiagonalPart;
use crate::factor::TriangularFactor;
use crate::factorization::{Factorization, Factors};
use crate::ldl::LdlDecomposition;

/// Cholesky decomposition with lower-triangular `L`.
#[derive(Debug, Clone)]
pub struct LlDecomposition {
    l: TriangularFactor,
    p: Permutation,
    composed: OnceLock<SymmetricMatrix>,
}

impl LlDecomposition {
    pub fn new(l: TriangularFactor, p: Permutation) -> DecompResult<Self> {
        if l.n() != p.len() {
            return Err(DecompError::DimensionMismatch {
                expected: p.len(),
                found: l.n(),
            });
        }
        Ok(Self {
            l,
            p,
            composed: OnceLock::new(),
        })
    }

    pub fn l(&self) -> &TriangularFactor {
        &self.l
    }

    /// `d = diag(L)²`, `L ← L·diag(L)⁻¹`.
    ///
    /// A zero diagonal entry is only representable if the rest of its
    /// column is zero too.
    pub fn to_ldl(&self) -> DecompResult<LdlDecomposition> {
        let diagonal = self.l.diagonal();
        let has_off_diagonal = self.l.columns_with_off_diagonal();
        let mut scale = Vec::with_capacity(diagonal.len());
        for (i, &v) in diagonal.iter().enumerate() {
            if v != 0.0 {
                scale.push(1.0 / v);
            } else if has_off_diagonal[i] {
                return Err(DecompError::DecompositionSingular { index: i, pivot: v });
            } else {
                scale.push(0.0);
            }
        }
        let ones = vec![1.0; diagonal.len()];
        let l = self.l.scale_columns(&scale).with_diagonal(&ones);
        let d = diagonal.iter().map(|v| v * v).collect();
        LdlDecomposition::new(l, d, self.p.clone())
    }
}

impl Factorization for LlDecomposition {
    fn decomposition_type(&self) -> DecompositionType {
        DecompositionType::LL
    }

    fn permutation(&self) -> &Permutation {
        &self.p
    }

    fn factors(&self) -> Factors<'_> {
        Factors {
            l: &self.l,
            unit_diagonal: false,
            d: DiagonalPart::Identity(self.l.n()),
        }
    }

    fn composed_cache(&self) -> &OnceLock<SymmetricMatrix> {
        &self.composed
    }
}
