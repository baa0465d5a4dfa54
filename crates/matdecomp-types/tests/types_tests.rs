//! Integration tests for matdecomp-types.

use matdecomp_types::{DecompError, DecompositionType, ErrorKind, StorageKind, Tolerance};

// ─── Type Tag Tests ────────────────────────────────────────────

#[test]
fn type_tags_round_trip_through_from_str() {
    for t in DecompositionType::ALL {
        let parsed: DecompositionType = t.type_str().parse().unwrap();
        assert_eq!(parsed, t);
    }
}

#[test]
fn compressed_tag_matches_persisted_name() {
    assert_eq!(DecompositionType::LDLCompressed.type_str(), "LDL_compressed");
    assert_eq!(DecompositionType::LL.to_string(), "LL");
}

#[test]
fn unknown_type_is_config_error() {
    let err = "QR".parse::<DecompositionType>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn type_tag_is_serializable() {
    let json = serde_json::to_string(&DecompositionType::LDL).unwrap();
    let back: DecompositionType = serde_json::from_str(&json).unwrap();
    assert_eq!(back, DecompositionType::LDL);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display_carries_context() {
    let err = DecompError::DecompositionSingular { index: 4, pivot: -2.5 };
    let msg = err.to_string();
    assert!(msg.contains("submatrix 4"));
    assert!(msg.contains("-2.5e0"));
}

#[test]
fn error_kinds_are_classified() {
    assert_eq!(
        DecompError::MatrixNotSquare { rows: 2, cols: 3 }.kind(),
        ErrorKind::Matrix
    );
    assert_eq!(
        DecompError::DecompositionNotFinite { index: 0 }.kind(),
        ErrorKind::Decomposition
    );
    assert_eq!(
        DecompError::NoDecompositionPossibleTooManyEntries { entries: 10, limit: 5 }.kind(),
        ErrorKind::Resource
    );
    assert_eq!(
        DecompError::InvalidPermutationMethod {
            method: "best".into(),
            storage: StorageKind::Dense,
        }
        .kind(),
        ErrorKind::Config
    );
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert_eq!(DecompError::from(io).kind(), ErrorKind::Io);
}

#[test]
fn invalid_permutation_method_mentions_storage() {
    let err = DecompError::InvalidPermutationMethod {
        method: "minimum_degree".into(),
        storage: StorageKind::Dense,
    };
    assert!(err.to_string().contains("dense"));
}

#[test]
fn singular_failures_are_retryable() {
    assert!(DecompError::DecompositionSingular { index: 0, pivot: 0.0 }.is_retryable());
    assert!(!DecompError::MatrixNotSquare { rows: 1, cols: 2 }.is_retryable());
}

// ─── Tolerance Tests ──────────────────────────────────────────

#[test]
fn tolerance_is_close() {
    let tol = Tolerance::default();
    assert!(tol.is_close(1.0, 1.0 + 1e-9));
    assert!(!tol.is_close(1.0, 1.1));
    assert!(Tolerance::EXACT.is_close(3.0, 3.0));
    assert!(!Tolerance::EXACT.is_close(3.0, 3.0 + f64::EPSILON * 4.0));
}

#[test]
fn negative_tolerance_rejected() {
    assert!(Tolerance::new(-1.0, 0.0).is_err());
    assert!(Tolerance::new(0.0, f64::NAN).is_err());
    assert!(Tolerance::new(1e-3, 1e-3).is_ok());
}
