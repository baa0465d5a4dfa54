//! CLI command implementations.

use matdecomp::options::{DecomposeOptions, Modification};
use matdecomp::{Decomposition, Factorization, PermutationMethod, Tolerance};
use matdecomp_math::{DirectSolver, FaerSolver};

use crate::io::{read_matrix, read_vector};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Command-line overrides of the options file.
pub struct Overrides<'a> {
    pub return_type: Option<&'a str>,
    pub method: Option<&'a str>,
    pub permutation: Option<&'a str>,
    pub config: Option<&'a str>,
}

fn load_options(config: Option<&str>) -> Result<DecomposeOptions, Box<dyn std::error::Error>> {
    Ok(match config {
        Some(path) => DecomposeOptions::from_toml_file(path)?,
        None => DecomposeOptions::default(),
    })
}

fn pivot_range(decomposition: &Decomposition) -> (f64, f64) {
    decomposition
        .pivot_values()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Decompose a matrix and save the factors.
pub fn decompose(matrix_path: &str, out: &str, overrides: Overrides<'_>) -> CommandResult {
    println!("matdecomp decompose");
    println!("───────────────────");

    let mut options = load_options(overrides.config)?;
    if let Some(ty) = overrides.return_type {
        options.return_type = ty.parse()?;
    }
    if let Some(method) = overrides.method {
        options.modification = method.parse()?;
    }
    if let Some(name) = overrides.permutation {
        options.permutation_method = Some(name.parse::<PermutationMethod>()?);
    }

    let matrix = read_matrix(matrix_path)?;
    println!("Matrix:       {matrix_path} ({}×{}, {})", matrix.n(), matrix.n(), matrix.storage());
    println!("Modification: {}", options.modification);

    let decomposition = if options.modification == Modification::None {
        matdecomp::decompose(&matrix, &options)?
    } else {
        let modified = matdecomp::modified_decompose(&matrix, &options)?;
        let e = &modified.perturbation;
        println!("Termination:  {:?}", e.termination);
        println!("Perturbation: total {:.6e}, max {:.6e}", e.total, e.max);
        modified.decomposition
    };

    let (lo, hi) = pivot_range(&decomposition);
    println!("Type:         {}", decomposition.type_str());
    println!("Permuted:     {}", decomposition.is_permuted());
    println!("Pivots:       [{lo:.6e}, {hi:.6e}]");

    decomposition.save(out)?;
    println!();
    println!("Decomposition written to: {out}");
    Ok(())
}

/// Solve `A·x = b`, printing `x` as JSON.
pub fn solve(matrix_path: &str, rhs_path: &str, verify: bool, config: Option<&str>) -> CommandResult {
    let options = load_options(config)?;
    let matrix = read_matrix(matrix_path)?;
    let b = read_vector(rhs_path)?;

    let x = matdecomp::solve(&matrix, &b, &options)?;
    println!("{}", serde_json::to_string(&x)?);

    if verify {
        let mut reference = FaerSolver::new();
        match reference.factorize(&matrix.to_sparse()) {
            Ok(()) => {
                let mut expected = vec![0.0; b.len()];
                reference.solve(&b, &mut expected)?;
                let diff = x
                    .iter()
                    .zip(&expected)
                    .map(|(u, v)| (u - v).abs())
                    .fold(0.0, f64::max);
                eprintln!("Max deviation from reference solve: {diff:.3e}");
            }
            Err(e) => eprintln!("Reference solve unavailable: {e}"),
        }
    }
    Ok(())
}

/// Report definiteness and invertibility.
pub fn check(matrix_path: &str) -> CommandResult {
    let options = DecomposeOptions::default();
    let matrix = read_matrix(matrix_path)?;

    println!("matdecomp check");
    println!("───────────────");
    println!("Matrix:                 {matrix_path} ({}×{})", matrix.n(), matrix.n());
    println!("Positive definite:      {}", matdecomp::is_positive_definite(&matrix, &options)?);
    println!("Positive semidefinite:  {}", matdecomp::is_positive_semidefinite(&matrix, &options)?);
    println!("Invertible:             {}", matdecomp::is_invertible(&matrix, &options)?);
    Ok(())
}

/// Inspect a saved decomposition.
pub fn inspect(path: &str) -> CommandResult {
    println!("matdecomp inspect");
    println!("─────────────────");
    println!();

    let decomposition = Decomposition::load(path)?;
    let tolerance = Tolerance::PIVOT;

    println!("Type:                   {}", decomposition.type_str());
    println!("Dimension:              {}", decomposition.n());
    println!("Storage:                {}", if decomposition.is_sparse() { "sparse" } else { "dense" });
    println!("Permuted:               {}", decomposition.is_permuted());
    println!("Finite:                 {}", decomposition.is_finite());
    println!("Positive definite:      {}", decomposition.is_positive_definite(&tolerance));
    println!("Positive semidefinite:  {}", decomposition.is_positive_semidefinite(&tolerance));
    println!("Invertible:             {}", decomposition.is_invertible(&tolerance));
    Ok(())
}
