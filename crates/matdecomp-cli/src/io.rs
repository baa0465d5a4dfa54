//! JSON matrix and vector files.
//!
//! A matrix file holds its dimension and either dense rows or triplets:
//!
//! ```text
//! { "n": 2, "dense": [[4.0, 1.0], [1.0, 3.0]] }
//! { "n": 2, "triplets": [[0, 0, 4.0], [1, 0, 1.0], [1, 1, 3.0]] }
//! ```
//!
//! Off-diagonal triplets may be given in one triangle or both; one-sided
//! entries are mirrored.

use std::collections::BTreeMap;

use serde::Deserialize;

use matdecomp::{CsrMatrix, DecompError, DecompResult, SymmetricMatrix};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatrixFile {
    n: usize,
    #[serde(default)]
    dense: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    triplets: Option<Vec<(usize, usize, f64)>>,
}

fn invalid(path: &str, reason: impl Into<String>) -> DecompError {
    DecompError::InvalidOption(format!("{path}: {}", reason.into()))
}

/// Reads a dense or sparse symmetric matrix.
pub fn read_matrix(path: &str) -> DecompResult<SymmetricMatrix> {
    let text = std::fs::read_to_string(path)?;
    let file: MatrixFile =
        serde_json::from_str(&text).map_err(|e| invalid(path, e.to_string()))?;

    match (file.dense, file.triplets) {
        (Some(rows), None) => {
            if rows.len() != file.n {
                return Err(DecompError::DimensionMismatch {
                    expected: file.n,
                    found: rows.len(),
                });
            }
            SymmetricMatrix::from_rows(&rows)
        }
        (None, Some(triplets)) => from_triplets(path, file.n, &triplets),
        _ => Err(invalid(path, "exactly one of 'dense' and 'triplets' is required")),
    }
}

fn from_triplets(path: &str, n: usize, triplets: &[(usize, usize, f64)]) -> DecompResult<SymmetricMatrix> {
    // (row, col) with row >= col, holding the values given above and below.
    let mut entries: BTreeMap<(usize, usize), (Option<f64>, Option<f64>)> = BTreeMap::new();
    for &(i, j, v) in triplets {
        if i >= n || j >= n {
            return Err(invalid(path, format!("triplet ({i}, {j}) outside a {n}×{n} matrix")));
        }
        let slot = entries.entry((i.max(j), i.min(j))).or_default();
        let side = if i >= j { &mut slot.0 } else { &mut slot.1 };
        if side.replace(v).is_some() {
            return Err(invalid(path, format!("duplicate triplet ({i}, {j})")));
        }
    }

    let mut full = Vec::with_capacity(2 * entries.len());
    for (&(i, j), &(lower, upper)) in &entries {
        let v = match (lower, upper) {
            (Some(a), Some(b)) if a != b => {
                return Err(DecompError::MatrixNotHermitian { row: i, col: j });
            }
            (Some(a), _) | (None, Some(a)) => a,
            (None, None) => continue,
        };
        full.push((i, j, v));
        if i != j {
            full.push((j, i, v));
        }
    }
    Ok(SymmetricMatrix::Sparse(CsrMatrix::from_triplets(n, n, &full)?))
}

/// Reads a right-hand side given as a JSON array.
pub fn read_vector(path: &str) -> DecompResult<Vec<f64>> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| invalid(path, e.to_string()))
}
