//! Integration tests for matdecomp-solver.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use matdecomp_decomposition::{Decomposition, Factorization};
use matdecomp_math::{CsrMatrix, Mat, SymmetricMatrix};
use matdecomp_permute::{Permutation, PermutationMethod, choose};
use matdecomp_solver::{
    ApproximationBounds, DiagonalBound, FactorOptions, FactorVariant, ModificationMethod,
    ModifiedOptions, Termination, approximate_decomposition, approximate_matrix, bunch_kaufman,
    cholesky, factor, modified_cholesky,
};
use matdecomp_types::{DecompError, ErrorKind, Tolerance};

fn dense(rows: &[&[f64]]) -> SymmetricMatrix {
    let n = rows.len();
    SymmetricMatrix::Dense(Mat::from_fn(n, n, |i, j| rows[i][j]))
}

/// `M·Mᵗ + n·I` with uniform entries of `M`.
fn random_spd(rng: &mut StdRng, n: usize) -> SymmetricMatrix {
    let m: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    SymmetricMatrix::Dense(Mat::from_fn(n, n, |i, j| {
        let dot: f64 = (0..n).map(|k| m[i * n + k] * m[j * n + k]).sum();
        if i == j { dot + n as f64 } else { dot }
    }))
}

/// Symmetric with uniform entries; indefinite with overwhelming probability.
fn random_symmetric(rng: &mut StdRng, n: usize) -> SymmetricMatrix {
    let m: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    SymmetricMatrix::Dense(Mat::from_fn(n, n, |i, j| {
        if i >= j { m[i * n + j] } else { m[j * n + i] }
    }))
}

/// Five-point Laplacian on a `k × k` grid, diagonal `4 + shift`.
fn laplacian(k: usize, shift: f64) -> SymmetricMatrix {
    let n = k * k;
    let mut triplets = Vec::new();
    for r in 0..k {
        for c in 0..k {
            let i = r * k + c;
            triplets.push((i, i, 4.0 + shift));
            if c + 1 < k {
                triplets.push((i, i + 1, -1.0));
                triplets.push((i + 1, i, -1.0));
            }
            if r + 1 < k {
                triplets.push((i, i + k, -1.0));
                triplets.push((i + k, i, -1.0));
            }
        }
    }
    SymmetricMatrix::Sparse(CsrMatrix::from_triplets(n, n, &triplets).unwrap())
}

fn random_permutation(rng: &mut StdRng, n: usize) -> Permutation {
    let mut p: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        p.swap(i, rng.gen_range(0..=i));
    }
    Permutation::from_vec(p).unwrap()
}

fn residual(a: &SymmetricMatrix, x: &[f64], b: &[f64]) -> f64 {
    let ax = a.mul_vec(x).unwrap();
    ax.iter().zip(b).map(|(u, v)| (u - v).abs()).fold(0.0, f64::max)
}

fn ldl_d(decomposition: &Decomposition) -> Vec<f64> {
    match decomposition {
        Decomposition::LDL(ldl) => ldl.d().to_vec(),
        other => panic!("expected LDL, got {}", other.type_str()),
    }
}

// ─── Factorization Tests ─────────────────────────────────────

#[test]
fn ll_reconstructs_random_spd() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = random_spd(&mut rng, 20);
    for perm in [Permutation::identity(20), random_permutation(&mut rng, 20)] {
        let decomposition = cholesky(&a, &perm).unwrap();
        assert_eq!(decomposition.type_str(), "LL");
        assert_eq!(decomposition.p(), perm.p());
        assert!(decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);
        assert!(decomposition.is_positive_definite(&Tolerance::default()));
    }
}

#[test]
fn ldl_solves_spd_system() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = random_spd(&mut rng, 12);
    let b: Vec<f64> = (0..12).map(|_| rng.gen_range(-5.0..5.0)).collect();
    let decomposition =
        factor(&a, &Permutation::identity(12), FactorVariant::LDL, &FactorOptions::default())
            .unwrap();
    let x = decomposition.solve(&b).unwrap();
    assert!(residual(&a, &x, &b) < 1e-10);
}

#[test]
fn sparse_and_dense_paths_agree() {
    let a = laplacian(5, 0.0);
    let perm = choose(&a, PermutationMethod::MinimumDegree).unwrap();
    let options = FactorOptions::default();
    let sparse = factor(&a, &perm, FactorVariant::LDL, &options).unwrap();
    let dense_a = SymmetricMatrix::Dense(a.to_dense());
    let dense = factor(&dense_a, &perm, FactorVariant::LDL, &options).unwrap();

    assert!(sparse.is_sparse());
    assert!(!dense.is_sparse());
    let (ds, dd) = (ldl_d(&sparse), ldl_d(&dense));
    for (s, d) in ds.iter().zip(&dd) {
        assert!((s - d).abs() < 1e-12);
    }
    assert!(sparse.composed_matrix().unwrap().max_abs_diff(&a) < 1e-12);
}

#[test]
fn positive_definite_policy_rejects_indefinite() {
    let a = dense(&[&[1.0, 2.0], &[2.0, 1.0]]);
    let err = cholesky(&a, &Permutation::identity(2)).unwrap_err();
    assert!(matches!(err, DecompError::DecompositionSingular { index: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Decomposition);
}

#[test]
fn indefinite_policy_keeps_negative_pivot() {
    let a = dense(&[&[1.0, 2.0], &[2.0, 1.0]]);
    let perm = Permutation::identity(2);
    let options = FactorOptions::indefinite();
    let ldl = factor(&a, &perm, FactorVariant::LDL, &options).unwrap();
    let d = ldl_d(&ldl);
    assert!((d[0] - 1.0).abs() < 1e-15);
    assert!((d[1] + 3.0).abs() < 1e-15);

    let err = factor(&a, &perm, FactorVariant::LL, &options).unwrap_err();
    assert!(matches!(err, DecompError::MatrixComplexDiagonalValue { index: 1, .. }));
}

#[test]
fn semidefinite_policy_accepts_vanishing_column() {
    let a = dense(&[&[1.0, 1.0], &[1.0, 1.0]]);
    let perm = Permutation::identity(2);
    let ldl = factor(&a, &perm, FactorVariant::LDL, &FactorOptions::semidefinite()).unwrap();
    assert_eq!(ldl_d(&ldl), vec![1.0, 0.0]);
    assert!(ldl.composed_matrix().unwrap().max_abs_diff(&a) < 1e-15);

    let ll = factor(&a, &perm, FactorVariant::LL, &FactorOptions::semidefinite()).unwrap();
    assert!(ll.composed_matrix().unwrap().max_abs_diff(&a) < 1e-15);

    assert!(matches!(
        cholesky(&a, &perm).unwrap_err(),
        DecompError::DecompositionSingular { index: 1, .. }
    ));
}

#[test]
fn semidefinite_policy_rejects_zero_pivot_with_coupling() {
    let a = dense(&[&[0.0, 1.0], &[1.0, 0.0]]);
    let err = factor(
        &a,
        &Permutation::identity(2),
        FactorVariant::LDL,
        &FactorOptions::semidefinite(),
    )
    .unwrap_err();
    assert!(matches!(err, DecompError::DecompositionSingular { index: 0, .. }));
}

#[test]
fn non_finite_entry_is_reported() {
    let a = dense(&[&[1.0, f64::NAN], &[f64::NAN, 1.0]]);
    let err = cholesky(&a, &Permutation::identity(2)).unwrap_err();
    assert!(matches!(err, DecompError::DecompositionNotFinite { index: 0 }));
}

#[test]
fn permutation_length_mismatch() {
    let a = SymmetricMatrix::from_diagonal(&[1.0, 2.0, 3.0]);
    let err = cholesky(&a, &Permutation::identity(2)).unwrap_err();
    assert!(matches!(err, DecompError::DimensionMismatch { expected: 3, found: 2 }));
}

#[test]
fn invalid_factor_options() {
    let a = SymmetricMatrix::from_diagonal(&[1.0]);
    let options = FactorOptions {
        pivot_rtol: -1.0,
        ..Default::default()
    };
    let err = factor(&a, &Permutation::identity(1), FactorVariant::LDL, &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

// ─── Bunch-Kaufman Tests ─────────────────────────────────────

#[test]
fn bunch_kaufman_uses_two_by_two_block() {
    let a = dense(&[&[0.0, 1.0], &[1.0, 0.0]]);
    let decomposition =
        bunch_kaufman(&a, &Permutation::identity(2), &FactorOptions::indefinite()).unwrap();
    assert_eq!(decomposition.block_starts(), &[0]);
    let x = decomposition.solve(&[2.0, 3.0]).unwrap();
    assert!((x[0] - 3.0).abs() < 1e-14);
    assert!((x[1] - 2.0).abs() < 1e-14);
}

#[test]
fn bunch_kaufman_reconstructs_random_indefinite() {
    let mut rng = StdRng::seed_from_u64(23);
    let a = random_symmetric(&mut rng, 12);
    let perm = random_permutation(&mut rng, 12);
    let decomposition = bunch_kaufman(&a, &perm, &FactorOptions::indefinite()).unwrap();
    assert!(decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);

    let b: Vec<f64> = (0..12).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let x = decomposition.solve(&b).unwrap();
    assert!(residual(&a, &x, &b) < 1e-8);
}

#[test]
fn bunch_kaufman_zero_matrix_is_singular() {
    let a = dense(&[&[0.0, 0.0], &[0.0, 0.0]]);
    let decomposition =
        bunch_kaufman(&a, &Permutation::identity(2), &FactorOptions::indefinite()).unwrap();
    assert!(decomposition.block_starts().is_empty());
    assert!(decomposition.is_singular(&Tolerance::default()));
}

#[test]
fn bunch_kaufman_keeps_sparse_storage() {
    let a = laplacian(3, -4.5);
    let decomposition =
        bunch_kaufman(&a, &Permutation::identity(9), &FactorOptions::indefinite()).unwrap();
    assert!(decomposition.is_sparse());
    assert!(decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-12);
}

// ─── Modified Cholesky Tests ─────────────────────────────────

#[test]
fn every_method_yields_positive_pivots_of_a_plus_e() {
    let mut rng = StdRng::seed_from_u64(31);
    let a = random_symmetric(&mut rng, 10);
    let perm = Permutation::identity(10);
    for method in ModificationMethod::ALL {
        let modified = modified_cholesky(&a, &perm, method, &ModifiedOptions::default()).unwrap();
        let e = &modified.perturbation;
        assert!(e.diagonal.iter().all(|v| v.is_finite() && *v >= 0.0), "{method}");
        assert!(e.total > 0.0, "{method}");
        assert_ne!(e.termination, Termination::Unmodified, "{method}");
        assert!(modified.decomposition.pivot_values().iter().all(|&d| d > 0.0), "{method}");

        let target = modified.modified_matrix(&a).unwrap();
        let diff = modified.decomposition.composed_matrix().unwrap().max_abs_diff(&target);
        assert!(diff < 1e-8, "{method}: {diff}");
    }
}

#[test]
fn gmw_keeps_the_given_permutation() {
    let mut rng = StdRng::seed_from_u64(37);
    let a = random_symmetric(&mut rng, 8);
    let perm = random_permutation(&mut rng, 8);
    for method in [ModificationMethod::Gmw81, ModificationMethod::GmwT1, ModificationMethod::GmwT2] {
        let modified = modified_cholesky(&a, &perm, method, &ModifiedOptions::default()).unwrap();
        assert_eq!(modified.decomposition.p(), perm.p());
    }
}

#[test]
fn se99_leaves_positive_definite_input_unmodified() {
    let mut rng = StdRng::seed_from_u64(41);
    let a = random_spd(&mut rng, 15);
    let modified = modified_cholesky(
        &a,
        &Permutation::identity(15),
        ModificationMethod::Se99,
        &ModifiedOptions::default(),
    )
    .unwrap();
    assert_eq!(modified.perturbation.termination, Termination::Unmodified);
    assert_eq!(modified.perturbation.total, 0.0);
    assert!(!modified.perturbation.is_modified());
    assert!(modified.decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);
}

#[test]
fn gmw_on_sparse_input_stays_sparse() {
    let a = laplacian(4, -5.0);
    let modified = modified_cholesky(
        &a,
        &Permutation::identity(16),
        ModificationMethod::GmwT1,
        &ModifiedOptions::default(),
    )
    .unwrap();
    assert!(modified.decomposition.is_sparse());
    let target = modified.modified_matrix(&a).unwrap();
    assert!(target.is_sparse());
    assert!(modified.decomposition.composed_matrix().unwrap().max_abs_diff(&target) < 1e-10);
}

#[test]
fn se_on_sparse_input_respects_entry_ceiling() {
    let a = laplacian(3, 0.0);
    let options = ModifiedOptions {
        max_dense_entries: 50,
        ..Default::default()
    };
    let err = modified_cholesky(&a, &Permutation::identity(9), ModificationMethod::Se99, &options)
        .unwrap_err();
    assert!(matches!(
        err,
        DecompError::NoDecompositionPossibleTooManyEntries { entries: 81, limit: 50 }
    ));
    assert_eq!(err.kind(), ErrorKind::Resource);
}

#[test]
fn overflow_is_retried_on_a_rescaled_matrix() {
    let a = dense(&[&[1e300, 1e308], &[1e308, 1e308]]);
    let perm = Permutation::identity(2);
    let modified =
        modified_cholesky(&a, &perm, ModificationMethod::GmwT1, &ModifiedOptions::default())
            .unwrap();
    let d = modified.decomposition.pivot_values();
    assert!(d.iter().all(|v| v.is_finite() && *v > 0.0));
    assert!(modified.perturbation.diagonal.iter().all(|v| v.is_finite()));

    let no_retries = ModifiedOptions {
        max_iterations: 0,
        ..Default::default()
    };
    let err = modified_cholesky(&a, &perm, ModificationMethod::GmwT1, &no_retries).unwrap_err();
    assert!(matches!(err, DecompError::NoDecompositionPossible { iterations: 0 }));
}

#[test]
fn method_names_parse_and_serialize() {
    assert_eq!("GMW_81".parse::<ModificationMethod>().unwrap(), ModificationMethod::Gmw81);
    assert_eq!("gmw81".parse::<ModificationMethod>().unwrap(), ModificationMethod::Gmw81);
    assert_eq!("se-t1".parse::<ModificationMethod>().unwrap(), ModificationMethod::SeT1);
    assert_eq!("SE 99".parse::<ModificationMethod>().unwrap(), ModificationMethod::Se99);
    let err = "cholesky".parse::<ModificationMethod>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    assert_eq!(serde_json::to_string(&ModificationMethod::GmwT2).unwrap(), "\"GMW_T2\"");
    let back: ModificationMethod = serde_json::from_str("\"SE_90\"").unwrap();
    assert_eq!(back, ModificationMethod::Se90);
}

// ─── Approximation Tests ─────────────────────────────────────

#[test]
fn approximation_of_spd_is_unchanged() {
    let mut rng = StdRng::seed_from_u64(43);
    let a = random_spd(&mut rng, 8);
    let approximation = approximate_decomposition(
        &a,
        &ApproximationBounds::positive_semidefinite(),
        PermutationMethod::Natural,
    )
    .unwrap();
    assert!(approximation.delta.iter().all(|v| v.abs() < 1e-10));
    assert!(approximation.omega.iter().all(|&w| w == 1.0));
    assert!(approximation.matrix().unwrap().max_abs_diff(&a) < 1e-10);
}

#[test]
fn approximation_of_indefinite_is_semidefinite() {
    let a = dense(&[&[1.0, 2.0], &[2.0, 1.0]]);
    let approximation = approximate_decomposition(
        &a,
        &ApproximationBounds::positive_semidefinite(),
        PermutationMethod::Natural,
    )
    .unwrap();
    let d = approximation.decomposition.d();
    assert!(d.iter().all(|&v| v >= 0.0));
    assert!(approximation.omega[1] < 1.0);
    assert!(approximation.decomposition.is_positive_semidefinite(&Tolerance::default()));
}

#[test]
fn approximation_positive_definite_bounds_pivots() {
    let mut rng = StdRng::seed_from_u64(47);
    let a = random_symmetric(&mut rng, 9);
    let approximation = approximate_decomposition(
        &a,
        &ApproximationBounds::positive_definite(),
        PermutationMethod::DecreasingDiagonalValues,
    )
    .unwrap();
    let floor = f64::EPSILON.sqrt();
    assert!(approximation.decomposition.d().iter().all(|&v| v >= floor * (1.0 - 1e-12)));
}

#[test]
fn approximation_honours_diagonal_bounds() {
    let a = dense(&[&[1.0, 2.0], &[2.0, 1.0]]);
    let bounds = ApproximationBounds {
        min_diag_b: DiagonalBound::Scalar(0.5),
        max_diag_b: DiagonalBound::PerRow(vec![3.0, 3.0]),
        ..Default::default()
    };
    let b = approximate_matrix(&a, &bounds, PermutationMethod::Natural).unwrap();
    for v in b.diagonal() {
        assert!((0.5 - 1e-12..=3.0 + 1e-12).contains(&v), "{v}");
    }
}

#[test]
fn minimal_difference_picks_cheapest_rows_first() {
    let a = SymmetricMatrix::from_diagonal(&[3.0, -1.0, 2.0]);
    let approximation = approximate_decomposition(
        &a,
        &ApproximationBounds::positive_semidefinite(),
        PermutationMethod::MinimalDifference,
    )
    .unwrap();
    assert_eq!(approximation.decomposition.p(), &[0, 2, 1]);
    assert_eq!(approximation.decomposition.d(), &[3.0, 2.0, 0.0]);
    assert_eq!(approximation.delta, vec![0.0, 1.0, 0.0]);
}

#[test]
fn maximal_stability_prefers_larger_pivots_over_smaller_changes() {
    let a = SymmetricMatrix::from_diagonal(&[1.0, 10.0]);
    let bounds = ApproximationBounds {
        max_diag_d: 4.0,
        ..ApproximationBounds::positive_semidefinite()
    };

    let cheapest =
        approximate_decomposition(&a, &bounds, PermutationMethod::MinimalDifference).unwrap();
    assert_eq!(cheapest.decomposition.p(), &[0, 1]);
    assert_eq!(cheapest.decomposition.d(), &[1.0, 4.0]);

    let stable = approximate_decomposition(&a, &bounds, PermutationMethod::MaximalStability).unwrap();
    assert_eq!(stable.decomposition.p(), &[1, 0]);
    assert_eq!(stable.decomposition.d(), &[4.0, 1.0]);
    assert_eq!(stable.delta, vec![0.0, -6.0]);
    assert!(stable.matrix().unwrap().max_abs_diff(cheapest.matrix().unwrap()) < 1e-12);
}

#[test]
fn maximal_stability_approximates_coupled_rows() {
    let a = dense(&[&[1.0, 2.0, 0.0], &[2.0, 1.0, 3.0], &[0.0, 3.0, -2.0]]);
    let approximation = approximate_decomposition(
        &a,
        &ApproximationBounds::positive_semidefinite(),
        PermutationMethod::MaximalStability,
    )
    .unwrap();
    // Rows 0 and 1 tie on the first pivot; the earlier one wins.
    assert_eq!(approximation.decomposition.p()[0], 0);
    assert!(approximation.decomposition.d().iter().all(|&d| d >= 0.0));
    assert!(approximation.decomposition.is_positive_semidefinite(&Tolerance::PIVOT));
    assert_eq!(approximation.matrix().unwrap().n(), 3);
}

#[test]
fn approximation_keeps_sparse_storage() {
    let a = laplacian(3, -3.0);
    let bounds = ApproximationBounds::positive_semidefinite();
    let reordered = approximate_matrix(&a, &bounds, PermutationMethod::MinimumDegree).unwrap();
    assert!(reordered.is_sparse());

    let sparse_b = approximate_matrix(&a, &bounds, PermutationMethod::Natural).unwrap();
    let dense_b = approximate_matrix(
        &SymmetricMatrix::Dense(a.to_dense()),
        &bounds,
        PermutationMethod::Natural,
    )
    .unwrap();
    assert!(sparse_b.is_sparse());
    assert!(!dense_b.is_sparse());
    assert!(sparse_b.max_abs_diff(&dense_b) < 1e-12);
}

#[test]
fn approximation_rejects_invalid_bounds() {
    let a = SymmetricMatrix::from_diagonal(&[1.0, 2.0]);
    let negative = ApproximationBounds {
        min_diag_d: -1.0,
        ..Default::default()
    };
    let err = approximate_decomposition(&a, &negative, PermutationMethod::Natural).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let short = ApproximationBounds {
        min_diag_b: DiagonalBound::PerRow(vec![0.0]),
        ..Default::default()
    };
    let err = approximate_decomposition(&a, &short, PermutationMethod::Natural).unwrap_err();
    assert!(matches!(err, DecompError::DimensionMismatch { expected: 2, found: 1 }));

    let crossed = ApproximationBounds {
        min_diag_b: DiagonalBound::Scalar(2.0),
        max_diag_b: DiagonalBound::Scalar(1.0),
        ..Default::default()
    };
    let err = approximate_decomposition(&a, &crossed, PermutationMethod::Natural).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn approximation_rejects_fill_reducing_order_on_dense() {
    let a = SymmetricMatrix::from_diagonal(&[1.0, 2.0]);
    let err = approximate_decomposition(
        &a,
        &ApproximationBounds::default(),
        PermutationMethod::MinimumDegree,
    )
    .unwrap_err();
    assert!(matches!(err, DecompError::InvalidPermutationMethod { .. }));
}
