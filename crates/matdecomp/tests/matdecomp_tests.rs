//! Integration tests for the matdecomp facade.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use matdecomp::options::{DecomposeOptions, Modification};
use matdecomp::{
    CsrMatrix, DecompError, DecompositionType, ErrorKind, Factorization, Mat, ModificationMethod,
    PermutationMethod, SymmetricMatrix, Termination, Tolerance,
};
use matdecomp_math::{DirectSolver, FaerSolver};
use matdecomp_solver::PivotPolicy;
use matdecomp_types::StorageKind;

fn dense(rows: &[&[f64]]) -> SymmetricMatrix {
    let n = rows.len();
    SymmetricMatrix::Dense(Mat::from_fn(n, n, |i, j| rows[i][j]))
}

fn random_spd(rng: &mut StdRng, n: usize) -> SymmetricMatrix {
    let m: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    SymmetricMatrix::Dense(Mat::from_fn(n, n, |i, j| {
        let dot: f64 = (0..n).map(|k| m[i * n + k] * m[j * n + k]).sum();
        if i == j { dot + n as f64 } else { dot }
    }))
}

fn random_symmetric(rng: &mut StdRng, n: usize) -> SymmetricMatrix {
    let m: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    SymmetricMatrix::Dense(Mat::from_fn(n, n, |i, j| {
        if i >= j { m[i * n + j] } else { m[j * n + i] }
    }))
}

/// Tridiagonal `[-1, 4, -1]`.
fn sparse_tridiagonal(n: usize) -> SymmetricMatrix {
    let mut triplets = Vec::new();
    for i in 0..n {
        triplets.push((i, i, 4.0));
        if i + 1 < n {
            triplets.push((i, i + 1, -1.0));
            triplets.push((i + 1, i, -1.0));
        }
    }
    SymmetricMatrix::Sparse(CsrMatrix::from_triplets(n, n, &triplets).unwrap())
}

fn max_diff(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(a, b)| (a - b).abs()).fold(0.0, f64::max)
}

// ─── Decompose Tests ─────────────────────────────────────────

#[test]
fn default_decompose_reproduces_spd() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_spd(&mut rng, 16);
    let decomposition = matdecomp::decompose(&a, &DecomposeOptions::default()).unwrap();
    assert_eq!(decomposition.decomposition_type(), DecompositionType::LDL);
    assert!(decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);
}

#[test]
fn strict_preset_returns_ll_or_fails() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = random_spd(&mut rng, 10);
    let options = DecomposeOptions::strict();
    let ll = matdecomp::decompose(&a, &options).unwrap();
    assert_eq!(ll.type_str(), "LL");
    assert!(ll.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);

    let indefinite = dense(&[&[1.0, 2.0], &[2.0, 1.0]]);
    let err = matdecomp::decompose(&indefinite, &options).unwrap_err();
    assert!(matches!(err, DecompError::DecompositionSingular { .. }));
}

#[test]
fn sparse_decompose_keeps_storage() {
    let a = sparse_tridiagonal(30);
    let decomposition = matdecomp::decompose(&a, &DecomposeOptions::default()).unwrap();
    assert!(decomposition.is_sparse());
    assert!(decomposition.pivot_values().iter().all(|&d| d > 0.0));
    assert!(decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);
}

#[test]
fn decompose_owned_matches_borrowed() {
    let mut rng = StdRng::seed_from_u64(9);
    let a = random_spd(&mut rng, 8);
    let options = DecomposeOptions::default();
    let borrowed = matdecomp::decompose(&a, &options).unwrap();
    let owned = matdecomp::decompose_owned(a.clone(), &options).unwrap();
    assert!(borrowed.is_equal(&owned).unwrap());
}

#[test]
fn decompose_owned_converts_after_factoring() {
    let mut rng = StdRng::seed_from_u64(10);
    let a = random_spd(&mut rng, 7);
    for return_type in [DecompositionType::LL, DecompositionType::LDLCompressed] {
        let options = DecomposeOptions {
            return_type,
            ..DecomposeOptions::default()
        };
        let owned = matdecomp::decompose_owned(a.clone(), &options).unwrap();
        assert_eq!(owned.decomposition_type(), return_type);
        assert!(owned.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);
    }
}

#[test]
fn return_type_is_honoured() {
    let mut rng = StdRng::seed_from_u64(13);
    let a = random_spd(&mut rng, 6);
    for ty in DecompositionType::ALL {
        let options = DecomposeOptions {
            return_type: ty,
            ..Default::default()
        };
        let decomposition = matdecomp::decompose(&a, &options).unwrap();
        assert_eq!(decomposition.decomposition_type(), ty);
        assert!(decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-10);
    }
}

#[test]
fn indefinite_compressed_uses_two_by_two_blocks() {
    let a = dense(&[&[0.0, 1.0], &[1.0, 0.0]]);
    let options = DecomposeOptions {
        modification: Modification::None,
        policy: PivotPolicy::Indefinite,
        return_type: DecompositionType::LDLCompressed,
        ..Default::default()
    };
    let decomposition = matdecomp::decompose(&a, &options).unwrap();
    assert!(decomposition.composed_matrix().unwrap().max_abs_diff(&a) < 1e-15);
    assert!(!decomposition.is_positive_semidefinite(&Tolerance::default()));
}

#[test]
fn modified_decompose_reports_perturbation() {
    let mut rng = StdRng::seed_from_u64(17);
    let a = random_symmetric(&mut rng, 12);
    for modification in [
        Modification::Auto,
        Modification::None,
        Modification::Method(ModificationMethod::Gmw81),
        Modification::Method(ModificationMethod::SeT1),
    ] {
        let options = DecomposeOptions {
            modification,
            return_type: DecompositionType::LL,
            ..Default::default()
        };
        let modified = matdecomp::modified_decompose(&a, &options).unwrap();
        assert_eq!(modified.decomposition.type_str(), "LL");
        assert_ne!(modified.perturbation.termination, Termination::Unmodified);
        let target = modified.modified_matrix(&a).unwrap();
        assert!(modified.decomposition.composed_matrix().unwrap().max_abs_diff(&target) < 1e-8);
    }
}

#[test]
fn auto_modification_depends_on_shape() {
    let auto = Modification::Auto;
    assert_eq!(auto.resolve(10, StorageKind::Dense), Some(ModificationMethod::Se99));
    assert_eq!(auto.resolve(1001, StorageKind::Dense), Some(ModificationMethod::GmwT1));
    assert_eq!(auto.resolve(10, StorageKind::Sparse), Some(ModificationMethod::GmwT1));
    assert_eq!(Modification::None.resolve(10, StorageKind::Dense), None);
}

// ─── Validation Tests ────────────────────────────────────────

#[test]
fn non_square_fails_first() {
    let mut m = Mat::<f64>::zeros(2, 3);
    m[(0, 0)] = f64::NAN;
    let err = matdecomp::decompose(&SymmetricMatrix::Dense(m), &DecomposeOptions::default())
        .unwrap_err();
    assert!(matches!(err, DecompError::MatrixNotSquare { rows: 2, cols: 3 }));
}

#[test]
fn nan_fails_before_factorization() {
    let a = dense(&[&[1.0, f64::NAN], &[f64::NAN, 1.0]]);
    let err = matdecomp::decompose(&a, &DecomposeOptions::default()).unwrap_err();
    assert!(matches!(err, DecompError::MatrixNotFinite { .. }));
    assert_eq!(err.kind(), ErrorKind::Matrix);
}

#[test]
fn asymmetric_fails_before_method_check() {
    let a = dense(&[&[1.0, 2.0], &[0.0, 1.0]]);
    let options = DecomposeOptions {
        permutation_method: Some(PermutationMethod::MinimumDegree),
        ..Default::default()
    };
    let err = matdecomp::decompose(&a, &options).unwrap_err();
    assert!(matches!(err, DecompError::MatrixNotHermitian { row: 1, col: 0 }));
}

#[test]
fn fill_reducing_method_on_dense_fails() {
    let a = SymmetricMatrix::from_diagonal(&[1.0, 2.0]);
    for method in [PermutationMethod::MinimumDegree, PermutationMethod::Best] {
        let options = DecomposeOptions {
            permutation_method: Some(method),
            ..Default::default()
        };
        let err = matdecomp::decompose(&a, &options).unwrap_err();
        assert!(matches!(err, DecompError::InvalidPermutationMethod { .. }));
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}

#[test]
fn invalid_tolerance_is_rejected() {
    let a = SymmetricMatrix::from_diagonal(&[1.0, 2.0]);
    let options = DecomposeOptions {
        rtol: -1.0,
        check_hermitian: false,
        ..Default::default()
    };
    let err = matdecomp::decompose(&a, &options).unwrap_err();
    assert!(matches!(err, DecompError::InvalidOption(_)));
}

// ─── Solve Tests ─────────────────────────────────────────────

#[test]
fn solve_identity_and_diagonal() {
    let options = DecomposeOptions::default();
    let b = [1.0, -2.0, 3.5];
    let identity = SymmetricMatrix::from_diagonal(&[1.0, 1.0, 1.0]);
    assert_eq!(matdecomp::solve(&identity, &b, &options).unwrap(), b.to_vec());

    let diagonal = SymmetricMatrix::from_diagonal(&[2.0, 4.0, -0.5]);
    let x = matdecomp::solve(&diagonal, &b, &options).unwrap();
    assert_eq!(x, vec![0.5, -0.5, -7.0]);
}

#[test]
fn solve_agrees_with_reference_solver() {
    let mut rng = StdRng::seed_from_u64(19);
    let a = random_spd(&mut rng, 25);
    let b: Vec<f64> = (0..25).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let x = matdecomp::solve(&a, &b, &DecomposeOptions::default()).unwrap();

    let mut reference = FaerSolver::new();
    reference.factorize(&a.to_sparse()).unwrap();
    let mut expected = vec![0.0; 25];
    reference.solve(&b, &mut expected).unwrap();
    assert!(max_diff(&x, &expected) < 1e-10);
}

#[test]
fn solve_in_place_handles_indefinite() {
    let mut rng = StdRng::seed_from_u64(29);
    let a = random_symmetric(&mut rng, 10);
    let x_true: Vec<f64> = (0..10).map(|i| i as f64 - 4.5).collect();
    let mut b = a.mul_vec(&x_true).unwrap();
    matdecomp::solve_in_place(&a, &mut b, &DecomposeOptions::default()).unwrap();
    assert!(max_diff(&b, &x_true) < 1e-8);
}

#[test]
fn solve_rejects_bad_rhs_and_singular_matrix() {
    let options = DecomposeOptions::default();
    let a = SymmetricMatrix::from_diagonal(&[1.0, 2.0]);
    let err = matdecomp::solve(&a, &[1.0], &options).unwrap_err();
    assert!(matches!(err, DecompError::DimensionMismatch { expected: 2, found: 1 }));

    let singular = dense(&[&[1.0, 1.0], &[1.0, 1.0]]);
    let err = matdecomp::solve(&singular, &[1.0, 1.0], &options).unwrap_err();
    assert!(matches!(err, DecompError::DecompositionSingular { .. }));
}

#[test]
fn solve_is_independent_of_matrix_scale() {
    let options = DecomposeOptions::default();

    let graded = SymmetricMatrix::from_diagonal(&[1.0, 1e-6]);
    let x = matdecomp::solve(&graded, &[1.0, 1.0], &options).unwrap();
    assert!((x[0] - 1.0).abs() < 1e-12);
    assert!((x[1] - 1e6).abs() < 1e-6);

    let tiny = SymmetricMatrix::from_diagonal(&[1e-10; 3]);
    let x = matdecomp::solve(&tiny, &[1.0, 2.0, 3.0], &options).unwrap();
    for (i, v) in x.iter().enumerate() {
        assert!((v - (i + 1) as f64 * 1e10).abs() < 1e-2, "x[{i}] = {v}");
    }
}

// ─── Definiteness Tests ──────────────────────────────────────

#[test]
fn definiteness_checks() {
    let options = DecomposeOptions::default();
    let mut rng = StdRng::seed_from_u64(31);
    let spd = random_spd(&mut rng, 9);
    let psd = dense(&[&[1.0, 1.0], &[1.0, 1.0]]);
    let indefinite = dense(&[&[1.0, 2.0], &[2.0, 1.0]]);

    assert!(matdecomp::is_positive_definite(&spd, &options).unwrap());
    assert!(matdecomp::is_positive_semidefinite(&spd, &options).unwrap());
    assert!(matdecomp::is_invertible(&spd, &options).unwrap());

    assert!(!matdecomp::is_positive_definite(&psd, &options).unwrap());
    assert!(matdecomp::is_positive_semidefinite(&psd, &options).unwrap());
    assert!(!matdecomp::is_invertible(&psd, &options).unwrap());

    assert!(!matdecomp::is_positive_definite(&indefinite, &options).unwrap());
    assert!(!matdecomp::is_positive_semidefinite(&indefinite, &options).unwrap());
    assert!(matdecomp::is_invertible(&indefinite, &options).unwrap());
}

#[test]
fn definiteness_is_independent_of_matrix_scale() {
    let options = DecomposeOptions::default();
    let graded = SymmetricMatrix::from_diagonal(&[1.0, 1e-6]);
    let tiny = SymmetricMatrix::from_diagonal(&[1e-10; 3]);

    for a in [&graded, &tiny] {
        assert!(matdecomp::is_positive_definite(a, &options).unwrap());
        assert!(matdecomp::is_positive_semidefinite(a, &options).unwrap());
        assert!(matdecomp::is_invertible(a, &options).unwrap());
    }

    // Scaling a singular matrix down keeps it singular.
    let singular = dense(&[&[1e-10, 1e-10], &[1e-10, 1e-10]]);
    assert!(!matdecomp::is_positive_definite(&singular, &options).unwrap());
    assert!(matdecomp::is_positive_semidefinite(&singular, &options).unwrap());
    assert!(!matdecomp::is_invertible(&singular, &options).unwrap());
}

#[test]
fn sparse_definiteness() {
    let options = DecomposeOptions::default();
    let a = sparse_tridiagonal(40);
    assert!(matdecomp::is_positive_definite(&a, &options).unwrap());
    assert!(matdecomp::is_invertible(&a, &options).unwrap());
}

// ─── Approximation Tests ─────────────────────────────────────

#[test]
fn nearest_semidefinite_and_definite_matrices() {
    let options = DecomposeOptions::default();
    let a = dense(&[&[1.0, 2.0], &[2.0, 1.0]]);

    let b = matdecomp::positive_semidefinite_matrix(&a, &options).unwrap();
    assert!(matdecomp::is_positive_semidefinite(&b, &options).unwrap());

    let c = matdecomp::positive_definite_matrix(&a, Some(0.1), &options).unwrap();
    assert!(matdecomp::is_positive_definite(&c, &options).unwrap());

    let err = matdecomp::positive_definite_matrix(&a, Some(0.0), &options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn approximate_decomposition_in_requested_shape() {
    let mut rng = StdRng::seed_from_u64(37);
    let a = random_symmetric(&mut rng, 7);
    let options = DecomposeOptions {
        return_type: DecompositionType::LDLCompressed,
        ..Default::default()
    };
    let bounds = matdecomp_solver::ApproximationBounds::positive_definite();
    let decomposition = matdecomp::approximate_decomposition(&a, &bounds, &options).unwrap();
    assert_eq!(decomposition.decomposition_type(), DecompositionType::LDLCompressed);
    assert!(decomposition.pivot_values().iter().all(|&d| d > 0.0));
}

#[test]
fn maximal_stability_is_an_approximation_ordering() {
    let mut rng = StdRng::seed_from_u64(41);
    let a = random_symmetric(&mut rng, 6);
    let options = DecomposeOptions {
        permutation_method: Some(PermutationMethod::MaximalStability),
        ..Default::default()
    };
    let b = matdecomp::positive_semidefinite_matrix(&a, &options).unwrap();
    assert!(matdecomp::is_positive_semidefinite(&b, &DecomposeOptions::default()).unwrap());

    let err = matdecomp::decompose(&a, &options).unwrap_err();
    assert!(matches!(err, DecompError::InvalidPermutationMethod { .. }));
}

// ─── Options Tests ───────────────────────────────────────────

#[test]
fn options_from_toml() {
    let options = DecomposeOptions::from_toml_str(
        r#"
        modification = "GMW_81"
        return_type = "LDL_compressed"
        permutation_method = "reverse_cuthill_mckee"
        atol = 1e-10
        "#,
    )
    .unwrap();
    assert_eq!(options.modification, Modification::Method(ModificationMethod::Gmw81));
    assert_eq!(options.return_type, DecompositionType::LDLCompressed);
    assert_eq!(options.permutation_method, Some(PermutationMethod::ReverseCuthillMckee));
    assert_eq!(options.atol, 1e-10);
    assert!(options.check_finite);

    let err = DecomposeOptions::from_toml_str("modification = \"magic\"").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn options_toml_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("options.toml");
    let robust = DecomposeOptions::robust();
    std::fs::write(&path, robust.to_toml_string().unwrap()).unwrap();

    let loaded = DecomposeOptions::from_toml_file(&path).unwrap();
    assert_eq!(loaded.modification, robust.modification);
    assert_eq!(loaded.max_iterations, robust.max_iterations);
    assert_eq!(loaded.return_type, robust.return_type);
    assert_eq!(loaded.permutation_method, None);

    let missing = DecomposeOptions::from_toml_file(dir.path().join("missing.toml")).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Io);
}

#[test]
fn modification_names() {
    assert_eq!("auto".parse::<Modification>().unwrap(), Modification::Auto);
    assert_eq!("None".parse::<Modification>().unwrap(), Modification::None);
    assert_eq!(
        "se_99".parse::<Modification>().unwrap(),
        Modification::Method(ModificationMethod::Se99)
    );
    assert_eq!(Modification::Method(ModificationMethod::GmwT2).to_string(), "GMW_T2");
    assert_eq!(serde_json::to_string(&Modification::Auto).unwrap(), "\"auto\"");
}
