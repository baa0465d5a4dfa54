//! Orderings by diagonal value.
//!
//! A stable sort on the key keeps equal diagonal values in original index
//! order, so the result is deterministic given the diagonal.

use std::cmp::Ordering;

use matdecomp_types::{DecompError, DecompResult};

use crate::method::PermutationMethod;
use crate::permutation::Permutation;

/// Orders indices by the diagonal according to a stability method.
pub fn diagonal_ordering(
    diagonal: &[f64],
    method: PermutationMethod,
) -> DecompResult<Permutation> {
    let key: fn(f64) -> f64 = match method {
        PermutationMethod::DecreasingAbsoluteDiagonalValues
        | PermutationMethod::IncreasingAbsoluteDiagonalValues => f64::abs,
        _ => |v| v,
    };
    let descending = match method {
        PermutationMethod::Natural => return Ok(Permutation::identity(diagonal.len())),
        PermutationMethod::DecreasingDiagonalValues
        | PermutationMethod::DecreasingAbsoluteDiagonalValues => true,
        PermutationMethod::IncreasingDiagonalValues
        | PermutationMethod::IncreasingAbsoluteDiagonalValues => false,
        other => {
            return Err(DecompError::InvalidOption(format!(
                "'{other}' is not a diagonal ordering"
            )));
        }
    };

    let mut p: Vec<usize> = (0..diagonal.len()).collect();
    p.sort_by(|&a, &b| {
        let ord: Ordering = key(diagonal[a]).total_cmp(&key(diagonal[b]));
        if descending { ord.reverse() } else { ord }
    });
    Permutation::from_vec(p)
}
