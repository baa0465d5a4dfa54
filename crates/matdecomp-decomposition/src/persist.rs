//! Directory persistence for decompositions.
//!
//! One file per array, serialized with `bincode` so `f64` values survive
//! bit for bit:
//!
//! | file | content |
//! |---|---|
//! | `type` | UTF-8 tag: `LL`, `LDL` or `LDL_compressed` |
//! | `p.bin` | permutation |
//! | `L.bin` | factor (LL, LDL) |
//! | `LD.bin` | packed factor (compressed) |
//! | `d.bin` | diagonal (LDL) |
//! | `blocks.bin` | 2×2 block starts (compressed) |

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use matdecomp_math::StoredMatrix;
use matdecomp_permute::Permutation;
use matdecomp_types::{DecompError, DecompResult, DecompositionType};

use crate::compressed::LdlCompressedDecomposition;
use crate::decomposition::Decomposition;
use crate::factor::TriangularFactor;
use crate::factorization::Factorization;
use crate::ldl::LdlDecomposition;
use crate::ll::LlDecomposition;

pub const TYPE_FILE: &str = "type";
pub const PERMUTATION_FILE: &str = "p.bin";
pub const L_FILE: &str = "L.bin";
pub const LD_FILE: &str = "LD.bin";
pub const D_FILE: &str = "d.bin";
pub const BLOCKS_FILE: &str = "blocks.bin";

fn write_array<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> DecompResult<()> {
    let bytes = bincode::serialize(value)
        .map_err(|e| DecompError::Serialization(format!("{name}: {e}")))?;
    fs::write(dir.join(name), bytes)?;
    Ok(())
}

fn read_array<T: DeserializeOwned>(dir: &Path, name: &str) -> DecompResult<T> {
    let path = dir.join(name);
    let bytes = fs::read(&path).map_err(|e| DecompError::DecompositionInvalidFile {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    bincode::deserialize(&bytes).map_err(|e| DecompError::DecompositionInvalidFile {
        path,
        reason: e.to_string(),
    })
}

fn read_factor(dir: &Path, name: &str) -> DecompResult<TriangularFactor> {
    let stored: StoredMatrix = read_array(dir, name)?;
    TriangularFactor::try_from(stored).map_err(|e| DecompError::DecompositionInvalidFile {
        path: dir.join(name),
        reason: e.to_string(),
    })
}

impl Decomposition {
    /// Writes the decomposition into `dir`, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> DecompResult<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(dir.join(TYPE_FILE), self.type_str())?;
        write_array(dir, PERMUTATION_FILE, self.permutation())?;
        match self {
            Self::LL(d) => write_array(dir, L_FILE, &StoredMatrix::from(d.l()))?,
            Self::LDL(d) => {
                write_array(dir, L_FILE, &StoredMatrix::from(d.l()))?;
                write_array(dir, D_FILE, d.d())?;
            }
            Self::LDLCompressed(d) => {
                write_array(dir, LD_FILE, &StoredMatrix::from(d.ld()))?;
                write_array(dir, BLOCKS_FILE, d.block_starts())?;
            }
        }
        tracing::debug!(dir = %dir.display(), ty = self.type_str(), n = self.n(), "decomposition saved");
        Ok(())
    }

    /// Reads a decomposition written by [`save`](Self::save).
    ///
    /// A missing `type` file surfaces as an I/O not-found error; missing or
    /// malformed arrays as `DecompositionInvalidFile`.
    pub fn load(dir: impl AsRef<Path>) -> DecompResult<Decomposition> {
        let dir = dir.as_ref();
        let type_path = dir.join(TYPE_FILE);
        let tag = fs::read_to_string(&type_path)?;
        let ty: DecompositionType =
            tag.parse()
                .map_err(|_| DecompError::DecompositionInvalidDecompositionTypeFile {
                    path: type_path.clone(),
                    found: tag.trim().to_string(),
                })?;

        let p: Permutation = read_array(dir, PERMUTATION_FILE)?;
        let inconsistent = |name: &str, e: DecompError| DecompError::DecompositionInvalidFile {
            path: dir.join(name),
            reason: e.to_string(),
        };
        let decomposition = match ty {
            DecompositionType::LL => {
                let l = read_factor(dir, L_FILE)?;
                LlDecomposition::new(l, p)
                    .map(Decomposition::LL)
                    .map_err(|e| inconsistent(L_FILE, e))?
            }
            DecompositionType::LDL => {
                let l = read_factor(dir, L_FILE)?;
                let d: Vec<f64> = read_array(dir, D_FILE)?;
                LdlDecomposition::new(l, d, p)
                    .map(Decomposition::LDL)
                    .map_err(|e| inconsistent(D_FILE, e))?
            }
            DecompositionType::LDLCompressed => {
                let ld = read_factor(dir, LD_FILE)?;
                let blocks: Vec<usize> = read_array(dir, BLOCKS_FILE)?;
                LdlCompressedDecomposition::new(ld, blocks, p)
                    .map(Decomposition::LDLCompressed)
                    .map_err(|e| inconsistent(BLOCKS_FILE, e))?
            }
        };
        tracing::debug!(dir = %dir.display(), ty = %ty, n = decomposition.n(), "decomposition loaded");
        Ok(decomposition)
    }
}
