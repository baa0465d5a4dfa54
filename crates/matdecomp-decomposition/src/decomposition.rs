//! The tagged decomposition value returned by every factorization.

use std::sync::OnceLock;

use matdecomp_math::SymmetricMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult, DecompositionType, Tolerance};

use crate::compressed::LdlCompressedDecomposition;
use crate::factorization::{Factorization, Factors};
use crate::ldl::LdlDecomposition;
use crate::ll::LlDecomposition;

/// One of the three decomposition shapes.
///
/// Immutable once built; conversions return new values.
#[derive(Debug, Clone)]
pub enum Decomposition {
    LL(LlDecomposition),
    LDL(LdlDecomposition),
    LDLCompressed(LdlCompressedDecomposition),
}

impl Decomposition {
    fn inner(&self) -> &dyn Factorization {
        match self {
            Self::LL(d) => d,
            Self::LDL(d) => d,
            Self::LDLCompressed(d) => d,
        }
    }

    pub fn is_type(&self, ty: DecompositionType) -> bool {
        self.decomposition_type() == ty
    }

    /// Converts to the requested shape.
    ///
    /// LL → LDL → compressed is always possible for a representable `L`;
    /// LDL → LL needs `D ≥ 0`; compressed with 2×2 blocks converts to nothing.
    pub fn as_type(&self, ty: DecompositionType) -> DecompResult<Decomposition> {
        use DecompositionType as T;
        let from = self.decomposition_type();
        let converted = match (self, ty) {
            (_, t) if t == from => Ok(self.clone()),
            (Self::LL(d), T::LDL) => d.to_ldl().map(Self::LDL),
            (Self::LL(d), T::LDLCompressed) => d
                .to_ldl()
                .and_then(|ldl| ldl.to_compressed())
                .map(Self::LDLCompressed),
            (Self::LDL(d), T::LL) => d.to_ll().map(Self::LL),
            (Self::LDL(d), T::LDLCompressed) => d.to_compressed().map(Self::LDLCompressed),
            (Self::LDLCompressed(d), T::LDL) => d.to_ldl().map(Self::LDL),
            (Self::LDLCompressed(d), T::LL) => d.to_ldl().and_then(|ldl| ldl.to_ll()).map(Self::LL),
            _ => Err(DecompError::NoDecompositionConversionImplemented { from, to: ty }),
        };
        converted.map_err(|e| match e {
            DecompError::NoDecompositionConversionImplemented { from, .. } => {
                DecompError::NoDecompositionConversionImplemented { from, to: ty }
            }
            other => other,
        })
    }

    /// Converts to the first of `types` that succeeds; a shape already in
    /// the list is returned unchanged.
    pub fn as_any_type(&self, types: &[DecompositionType]) -> DecompResult<Decomposition> {
        if types.contains(&self.decomposition_type()) {
            return Ok(self.clone());
        }
        let mut first_error = None;
        for &ty in types {
            match self.as_type(ty) {
                Ok(d) => return Ok(d),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| {
            DecompError::InvalidOption("no decomposition type requested".into())
        }))
    }

    /// True if both represent exactly the same matrix.
    pub fn is_equal(&self, other: &Decomposition) -> DecompResult<bool> {
        self.is_almost_equal(other, &Tolerance::EXACT)
    }

    /// True if the represented matrices agree within `tolerance`,
    /// whatever their shapes and permutations.
    pub fn is_almost_equal(&self, other: &Decomposition, tolerance: &Tolerance) -> DecompResult<bool> {
        if self.n() != other.n() {
            return Ok(false);
        }
        Ok(self.composed_matrix()?.is_close(other.composed_matrix()?, tolerance))
    }
}

impl Factorization for Decomposition {
    fn decomposition_type(&self) -> DecompositionType {
        self.inner().decomposition_type()
    }

    fn permutation(&self) -> &Permutation {
        self.inner().permutation()
    }

    fn factors(&self) -> Factors<'_> {
        self.inner().factors()
    }

    fn composed_cache(&self) -> &OnceLock<SymmetricMatrix> {
        self.inner().composed_cache()
    }
}

impl From<LlDecomposition> for Decomposition {
    fn from(d: LlDecomposition) -> Self {
        Self::LL(d)
    }
}

impl From<LdlDecomposition> for Decomposition {
    fn from(d: LdlDecomposition) -> Self {
        Self::LDL(d)
    }
}

impl From<LdlCompressedDecomposition> for Decomposition {
    fn from(d: LdlCompressedDecomposition) -> Self {
        Self::LDLCompressed(d)
    }
}
