//! Left-looking `LDLᵗ` elimination shared by the plain and the GMW
//! factorizations.
//!
//! Column `j` is computed from the already finished columns `k < j`:
//! `c_ij = a_ij - Σ_k l_ik · d_k · l_jk` for `i ≥ j`. The pivot rule picks
//! `d_j` from `c_jj` and `max_{i>j} |c_ij|`, then `l_ij = c_ij / d_j`.
//!
//! The sparse path follows the symbolic structure of `L`: each finished
//! column keeps its entries in row order with a cursor at the next row
//! to be eliminated, so the update of column `j` only touches the columns
//! in the row pattern of `j`.

use matdecomp_math::{CsrMatrix, Mat, SymmetricMatrix};
use matdecomp_permute::SymbolicStructure;
use matdecomp_types::{DecompError, DecompResult};
use matdecomp_decomposition::TriangularFactor;

use crate::strategy::{PivotRule, PivotSource};

/// Factors of an elimination: unit `L` (diagonal stored as one), `D`
/// and the reason behind each pivot.
#[derive(Debug, Clone)]
pub struct Elimination {
    pub l: TriangularFactor,
    pub d: Vec<f64>,
    pub sources: Vec<PivotSource>,
}

/// Eliminates an already permuted matrix, reading only its lower triangle.
pub fn eliminate(matrix: &SymmetricMatrix, rule: &mut dyn PivotRule) -> DecompResult<Elimination> {
    matrix.check_square()?;
    match matrix {
        SymmetricMatrix::Dense(a) => eliminate_dense(a, rule),
        SymmetricMatrix::Sparse(a) => eliminate_sparse(a, rule),
    }
}

fn eliminate_dense(a: &Mat<f64>, rule: &mut dyn PivotRule) -> DecompResult<Elimination> {
    let n = a.nrows();
    let mut l = Mat::<f64>::identity(n, n);
    let mut d = vec![0.0; n];
    let mut sources = Vec::with_capacity(n);
    let mut w = vec![0.0; n];
    let mut c = vec![0.0; n];

    for j in 0..n {
        for k in 0..j {
            w[k] = l[(j, k)] * d[k];
        }
        for i in j..n {
            let mut v = a[(i, j)];
            for k in 0..j {
                v -= l[(i, k)] * w[k];
            }
            c[i] = v;
        }
        if c[j..n].iter().any(|v| !v.is_finite()) {
            return Err(DecompError::DecompositionNotFinite { index: j });
        }

        let theta = c[j + 1..n].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let pivot = rule.pivot(j, c[j], theta)?;
        if !pivot.value.is_finite() {
            return Err(DecompError::DecompositionNotFinite { index: j });
        }
        d[j] = pivot.value;
        sources.push(pivot.source);
        if pivot.value == 0.0 {
            continue;
        }
        for i in j + 1..n {
            let v = c[i] / pivot.value;
            if !v.is_finite() {
                return Err(DecompError::DecompositionNotFinite { index: j });
            }
            l[(i, j)] = v;
        }
    }

    Ok(Elimination {
        l: TriangularFactor::Dense(l),
        d,
        sources,
    })
}

fn eliminate_sparse(a: &CsrMatrix, rule: &mut dyn PivotRule) -> DecompResult<Elimination> {
    let n = a.rows;
    let symbolic = SymbolicStructure::analyze(a);

    let mut column_patterns: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, pattern) in symbolic.row_patterns.iter().enumerate() {
        for &k in pattern {
            column_patterns[k].push(i);
        }
    }
    // Row j of the transposed lower triangle is column j of A, rows ≥ j.
    let lower_columns = a.lower_triangle().transpose();

    let mut columns: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);
    let mut cursor = vec![0usize; n];
    let mut d = vec![0.0; n];
    let mut sources = Vec::with_capacity(n);
    let mut x = vec![0.0; n];

    for j in 0..n {
        for (i, v) in lower_columns.row(j) {
            x[i] = v;
        }
        for &k in &symbolic.row_patterns[j] {
            let entries = &columns[k];
            let (row, l_jk) = entries[cursor[k]];
            debug_assert_eq!(row, j);
            cursor[k] += 1;
            let w = l_jk * d[k];
            if w == 0.0 {
                continue;
            }
            x[j] -= l_jk * w;
            for &(i, l_ik) in &entries[cursor[k]..] {
                x[i] -= l_ik * w;
            }
        }

        let c_jj = x[j];
        x[j] = 0.0;
        let mut theta = 0.0_f64;
        let mut finite = c_jj.is_finite();
        for &i in &column_patterns[j] {
            finite &= x[i].is_finite();
            theta = theta.max(x[i].abs());
        }
        if !finite {
            return Err(DecompError::DecompositionNotFinite { index: j });
        }

        let pivot = rule.pivot(j, c_jj, theta)?;
        if !pivot.value.is_finite() {
            return Err(DecompError::DecompositionNotFinite { index: j });
        }
        d[j] = pivot.value;
        sources.push(pivot.source);

        let mut column = Vec::with_capacity(column_patterns[j].len());
        for &i in &column_patterns[j] {
            let v = if pivot.value == 0.0 { 0.0 } else { x[i] / pivot.value };
            if !v.is_finite() {
                return Err(DecompError::DecompositionNotFinite { index: j });
            }
            column.push((i, v));
            x[i] = 0.0;
        }
        columns.push(column);
    }

    let mut triplets = Vec::with_capacity(symbolic.fill_count());
    for (j, column) in columns.iter().enumerate() {
        triplets.push((j, j, 1.0));
        triplets.extend(column.iter().filter(|&&(_, v)| v != 0.0).map(|&(i, v)| (i, j, v)));
    }
    let l = CsrMatrix::from_triplets(n, n, &triplets)?;

    Ok(Elimination {
        l: TriangularFactor::Sparse(l),
        d,
        sources,
    })
}
