//! Tags for decomposition shapes and matrix storage classes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{LDL_COMPRESSED_TYPE_STR, LDL_TYPE_STR, LL_TYPE_STR};
use crate::error::DecompError;

/// The three concrete decomposition shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecompositionType {
    /// `P·A·Pᵗ = L·Lᵗ`.
    LL,
    /// `P·A·Pᵗ = L·D·Lᵗ` with unit lower-triangular `L` and diagonal `D`.
    LDL,
    /// `LDL` with `D` packed onto the diagonal of `L` (1×1 or 2×2 blocks).
    #[serde(rename = "LDL_compressed")]
    LDLCompressed,
}

impl DecompositionType {
    /// All supported decomposition types.
    pub const ALL: [DecompositionType; 3] = [Self::LL, Self::LDL, Self::LDLCompressed];

    /// Returns the persisted type tag.
    pub fn type_str(self) -> &'static str {
        match self {
            Self::LL => LL_TYPE_STR,
            Self::LDL => LDL_TYPE_STR,
            Self::LDLCompressed => LDL_COMPRESSED_TYPE_STR,
        }
    }
}

impl fmt::Display for DecompositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_str())
    }
}

impl FromStr for DecompositionType {
    type Err = DecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            LL_TYPE_STR => Ok(Self::LL),
            LDL_TYPE_STR => Ok(Self::LDL),
            LDL_COMPRESSED_TYPE_STR => Ok(Self::LDLCompressed),
            other => Err(DecompError::InvalidOption(format!(
                "unknown decomposition type '{other}', expected one of LL, LDL, LDL_compressed"
            ))),
        }
    }
}

/// Storage class of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// Full n×n storage.
    Dense,
    /// Compressed sparse row storage.
    Sparse,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense => f.write_str("dense"),
            Self::Sparse => f.write_str("sparse"),
        }
    }
}
