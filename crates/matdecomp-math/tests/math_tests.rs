//! Integration tests for matdecomp-math.

use matdecomp_math::dense;
use matdecomp_math::faer_solver::FaerSolver;
use matdecomp_math::sparse::{CsrMatrix, DirectSolver};
use matdecomp_math::{Mat, StoredMatrix, SymmetricMatrix};
use matdecomp_types::{DecompError, ErrorKind, StorageKind, Tolerance};

fn tridiagonal() -> CsrMatrix {
    //   [4 1 0]
    //   [1 3 1]
    //   [0 1 2]
    let triplets = vec![
        (0, 0, 4.0),
        (0, 1, 1.0),
        (1, 0, 1.0),
        (1, 1, 3.0),
        (1, 2, 1.0),
        (2, 1, 1.0),
        (2, 2, 2.0),
    ];
    CsrMatrix::from_triplets(3, 3, &triplets).unwrap()
}

// ─── Sparse Matrix Tests ─────────────────────────────────────

#[test]
fn empty_csr() {
    let m = CsrMatrix::new(3, 3);
    assert_eq!(m.nnz(), 0);
    assert_eq!(m.rows, 3);
    assert_eq!(m.cols, 3);
    assert_eq!(m.row_ptr.len(), 4);
}

#[test]
fn csr_from_triplets() {
    let triplets = vec![(0, 0, 1.0), (1, 1, 1.0), (2, 2, 1.0)];
    let m = CsrMatrix::from_triplets(3, 3, &triplets).unwrap();
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.row_ptr, vec![0, 1, 2, 3]);
    assert_eq!(m.col_idx, vec![0, 1, 2]);
    assert_eq!(m.values, vec![1.0, 1.0, 1.0]);
}

#[test]
fn csr_from_triplets_unordered() {
    let triplets = vec![(0, 2, 3.0), (0, 0, 1.0), (0, 1, 2.0)];
    let m = CsrMatrix::from_triplets(1, 3, &triplets).unwrap();
    assert_eq!(m.col_idx, vec![0, 1, 2]);
    assert_eq!(m.values, vec![1.0, 2.0, 3.0]);
}

#[test]
fn csr_from_triplets_sums_duplicates() {
    let triplets = vec![(1, 0, 1.5), (0, 0, 1.0), (1, 0, 2.5)];
    let m = CsrMatrix::from_triplets(2, 2, &triplets).unwrap();
    assert_eq!(m.nnz(), 2);
    assert_eq!(m.get(1, 0), 4.0);
    assert_eq!(m.get(0, 1), 0.0);
    assert!(m.validate().is_ok());
}

#[test]
fn csr_from_triplets_rejects_out_of_range_entries() {
    let err = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 2, 1.0)]).unwrap_err();
    assert!(matches!(
        err,
        DecompError::MatrixIndexOutOfBounds { row: 1, col: 2, rows: 2, cols: 2 }
    ));
    assert_eq!(err.kind(), ErrorKind::Matrix);
    assert!(CsrMatrix::from_triplets(2, 2, &[(2, 0, 1.0)]).is_err());
}

#[test]
fn csr_add_diagonal_inserts_missing_entries() {
    let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0)]).unwrap();
    let shifted = m.add_diagonal(&[0.5, 3.0]).unwrap();
    assert_eq!(shifted.get(0, 0), 1.5);
    assert_eq!(shifted.get(1, 1), 3.0);
    assert_eq!(shifted.get(0, 1), 2.0);
    assert!(shifted.validate().is_ok());
    assert!(matches!(
        m.add_diagonal(&[1.0]),
        Err(DecompError::DimensionMismatch { expected: 2, found: 1 })
    ));
}

#[test]
fn csr_transpose_and_lower_triangle() {
    let m = CsrMatrix::from_triplets(2, 3, &[(0, 2, 5.0), (1, 0, -1.0)]).unwrap();
    let t = m.transpose();
    assert_eq!((t.rows, t.cols), (3, 2));
    assert_eq!(t.get(2, 0), 5.0);
    assert_eq!(t.get(0, 1), -1.0);

    let lower = tridiagonal().lower_triangle();
    assert_eq!(lower.nnz(), 5);
    assert_eq!(lower.get(0, 1), 0.0);
    assert_eq!(lower.get(1, 0), 1.0);
}

#[test]
fn csr_symmetric_permute() {
    let m = tridiagonal();
    let p = [2, 0, 1];
    let p_inverse = [1, 2, 0];
    let b = m.symmetric_permute(&p, &p_inverse);
    for i in 0..3 {
        for j in 0..3 {
            assert_eq!(b.get(i, j), m.get(p[i], p[j]), "entry ({i}, {j})");
        }
    }
}

#[test]
fn csr_dense_round_trip() {
    let m = tridiagonal();
    let d = m.to_dense();
    assert_eq!(d[(1, 2)], 1.0);
    let back = CsrMatrix::from_dense(&d, 0.0);
    assert_eq!(back, m);
}

#[test]
fn csr_validate_rejects_unsorted_row() {
    let mut m = tridiagonal();
    m.col_idx.swap(0, 1);
    assert!(m.validate().is_err());
}

// ─── SymmetricMatrix Tests ───────────────────────────────────

#[test]
fn shape_and_storage() {
    let dense = SymmetricMatrix::Dense(tridiagonal().to_dense());
    let sparse = SymmetricMatrix::Sparse(tridiagonal());
    assert_eq!(dense.shape(), (3, 3));
    assert_eq!(dense.storage(), StorageKind::Dense);
    assert_eq!(sparse.storage(), StorageKind::Sparse);
    assert_eq!(dense.diagonal(), vec![4.0, 3.0, 2.0]);
    assert_eq!(sparse.diagonal(), vec![4.0, 3.0, 2.0]);
    assert_eq!(dense.entries(), 9);
    assert_eq!(sparse.entries(), 7);
    assert_eq!(dense.max_abs_diagonal(), 4.0);
    assert_eq!(sparse.max_abs_off_diagonal(), 1.0);
}

#[test]
fn non_square_is_rejected() {
    let m = SymmetricMatrix::Dense(Mat::<f64>::zeros(2, 3));
    match m.check_square() {
        Err(DecompError::MatrixNotSquare { rows, cols }) => {
            assert_eq!((rows, cols), (2, 3));
        }
        other => panic!("expected MatrixNotSquare, got {other:?}"),
    }
    assert!(SymmetricMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
}

#[test]
fn nan_entry_is_located() {
    let mut d = Mat::<f64>::identity(3, 3);
    d[(2, 1)] = f64::NAN;
    let m = SymmetricMatrix::Dense(d);
    assert!(!m.is_finite());
    match m.check_finite() {
        Err(DecompError::MatrixNotFinite { row, col }) => assert_eq!((row, col), (2, 1)),
        other => panic!("expected MatrixNotFinite, got {other:?}"),
    }

    let s = SymmetricMatrix::Sparse(CsrMatrix::from_triplets(2, 2, &[(1, 1, f64::INFINITY)]).unwrap());
    assert!(matches!(
        s.check_finite(),
        Err(DecompError::MatrixNotFinite { row: 1, col: 1 })
    ));
}

#[test]
fn hermitian_check_respects_tolerance() {
    let tol = Tolerance::default();
    let m = SymmetricMatrix::from_rows(&[vec![2.0, 1.0], vec![1.0 + 1e-12, 2.0]]).unwrap();
    assert!(m.is_hermitian(&tol));

    let bad = SymmetricMatrix::from_rows(&[vec![2.0, 1.0], vec![1.5, 2.0]]).unwrap();
    assert!(matches!(
        bad.check_hermitian(&tol),
        Err(DecompError::MatrixNotHermitian { row: 1, col: 0 })
    ));

    // Entry stored on one side only
    let one_sided = SymmetricMatrix::Sparse(
        CsrMatrix::from_triplets(3, 3, &[(0, 0, 1.0), (1, 1, 1.0), (2, 2, 1.0), (0, 2, 0.5)])
            .unwrap(),
    );
    assert!(matches!(
        one_sided.check_hermitian(&tol),
        Err(DecompError::MatrixNotHermitian { row: 2, col: 0 })
    ));
}

#[test]
fn dense_and_sparse_products_agree() {
    let sparse = SymmetricMatrix::Sparse(tridiagonal());
    let dense = SymmetricMatrix::Dense(tridiagonal().to_dense());
    let x = [1.0, -2.0, 0.5];
    let ys = sparse.mul_vec(&x).unwrap();
    let yd = dense.mul_vec(&x).unwrap();
    assert_eq!(ys, vec![2.0, -4.5, -1.0]);
    for i in 0..3 {
        assert!((ys[i] - yd[i]).abs() < 1e-14);
    }
    assert!(matches!(
        dense.mul_vec(&[1.0]),
        Err(DecompError::DimensionMismatch { expected: 3, found: 1 })
    ));

    let xm = Mat::from_fn(3, 2, |i, j| (i + j) as f64);
    let prod_s = sparse.mul_mat(&xm).unwrap();
    let prod_d = dense.mul_mat(&xm).unwrap();
    assert!(dense::max_abs_diff(prod_s.as_ref(), prod_d.as_ref()) < 1e-14);
}

#[test]
fn stored_matrix_round_trip() {
    let m = SymmetricMatrix::Dense(Mat::from_fn(2, 2, |i, j| (1 + i + 2 * j) as f64));
    let json = serde_json::to_string(&StoredMatrix::from(&m)).unwrap();
    let back: StoredMatrix = serde_json::from_str(&json).unwrap();
    let back = SymmetricMatrix::try_from(back).unwrap();
    assert!(back.is_close(&m, &Tolerance::EXACT));
    assert_eq!(back.get(0, 1), 3.0);
}

// ─── Dense Kernel Tests ──────────────────────────────────────

#[test]
fn triangular_solves() {
    let l = Mat::from_fn(3, 3, |i, j| if j <= i { (1 + i + j) as f64 } else { 0.0 });
    let b = dense::column(&[1.0, 2.0, 3.0]);

    let mut x = b.clone();
    dense::solve_lower_in_place(l.as_ref(), x.as_mut(), false);
    let back = dense::mat_mul(l.as_ref(), x.as_ref());
    assert!(dense::max_abs_diff(back.as_ref(), b.as_ref()) < 1e-12);

    let mut y = b.clone();
    dense::solve_lower_transpose_in_place(l.as_ref(), y.as_mut(), true);
    let unit = Mat::from_fn(3, 3, |i, j| if i == j { 1.0 } else { l[(i, j)] });
    let back = dense::mat_mul(unit.transpose(), y.as_ref());
    assert!(dense::max_abs_diff(back.as_ref(), b.as_ref()) < 1e-12);
}

#[test]
fn lower_product_with_diagonal() {
    let l = Mat::from_fn(2, 2, |i, j| match (i, j) {
        (0, 0) | (1, 1) => 1.0,
        (1, 0) => 2.0,
        _ => 0.0,
    });
    let a = dense::lower_product(l.as_ref(), Some(&[3.0, -1.0]));
    // [1 0; 2 1] diag(3, -1) [1 2; 0 1] = [3 6; 6 11]
    assert_eq!(a[(0, 0)], 3.0);
    assert_eq!(a[(1, 0)], 6.0);
    assert_eq!(a[(0, 1)], 6.0);
    assert_eq!(a[(1, 1)], 11.0);
}

// ─── FaerSolver Tests ────────────────────────────────────────

#[test]
fn faer_identity_solve() {
    // Solve I * x = b → expect x = b
    let matrix = CsrMatrix::identity(3);

    let mut solver = FaerSolver::new();
    assert!(!solver.is_factorized());

    solver.factorize(&matrix).unwrap();
    assert!(solver.is_factorized());

    let rhs = [3.0, 7.0, -2.0];
    let mut sol = [0.0; 3];
    solver.solve(&rhs, &mut sol).unwrap();

    for i in 0..3 {
        assert!(
            (sol[i] - rhs[i]).abs() < 1e-12,
            "sol[{i}] = {}, expected {}",
            sol[i],
            rhs[i]
        );
    }
}

#[test]
fn faer_spd_matrix_solve() {
    let matrix = tridiagonal();

    let mut solver = FaerSolver::new();
    solver.factorize(&matrix).unwrap();

    let rhs = [1.0, 2.0, 3.0];
    let mut sol = [0.0; 3];
    solver.solve(&rhs, &mut sol).unwrap();

    // Verify: A * sol ≈ rhs
    let residual = matrix.mul_vec(&sol);
    for (i, r) in residual.iter().enumerate() {
        assert!((r - rhs[i]).abs() < 1e-12, "Residual[{i}] = {}", r - rhs[i]);
    }
}

#[test]
fn faer_rejects_bad_inputs() {
    let mut solver = FaerSolver::new();
    let mut sol = [0.0; 2];
    assert!(solver.solve(&[1.0, 2.0], &mut sol).is_err());
    assert!(matches!(
        solver.factorize(&CsrMatrix::new(2, 3)),
        Err(DecompError::MatrixNotSquare { .. })
    ));

    solver.factorize(&CsrMatrix::identity(2)).unwrap();
    assert!(matches!(
        solver.solve(&[1.0], &mut sol),
        Err(DecompError::DimensionMismatch { expected: 2, found: 1 })
    ));
}

#[test]
fn faer_refactorizes_with_new_values_and_patterns() {
    let mut solver = FaerSolver::new();
    let mut matrix = tridiagonal();
    solver.factorize(&matrix).unwrap();

    // Same pattern, doubled values: x halves.
    for v in &mut matrix.values {
        *v *= 2.0;
    }
    solver.factorize(&matrix).unwrap();
    let rhs = [1.0, 2.0, 3.0];
    let mut sol = [0.0; 3];
    solver.solve(&rhs, &mut sol).unwrap();
    let residual = matrix.mul_vec(&sol);
    for (r, b) in residual.iter().zip(&rhs) {
        assert!((r - b).abs() < 1e-12);
    }

    // Different pattern and dimension.
    let diagonal = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 4.0)]).unwrap();
    solver.factorize(&diagonal).unwrap();
    let mut sol = [0.0; 2];
    solver.solve(&[1.0, 1.0], &mut sol).unwrap();
    assert!((sol[0] - 0.5).abs() < 1e-12);
    assert!((sol[1] - 0.25).abs() < 1e-12);
}
