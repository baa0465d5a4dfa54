//! matdecomp CLI — decompose, solve, and check symmetric matrices.

use clap::{Parser, Subcommand};

mod commands;
mod io;

#[derive(Parser)]
#[command(name = "matdecomp")]
#[command(version, about = "matdecomp — Cholesky, LDL and modified Cholesky decompositions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose a matrix and save the factors to a directory.
    Decompose {
        /// Path to the matrix (JSON).
        matrix: String,

        /// Output directory for the decomposition.
        #[arg(short, long)]
        out: String,

        /// Decomposition type (LL, LDL, LDL_compressed).
        #[arg(short = 't', long = "type")]
        return_type: Option<String>,

        /// Modification (none, auto, GMW_81, GMW_T1, GMW_T2, SE_90, SE_99, SE_T1).
        #[arg(short, long)]
        method: Option<String>,

        /// Permutation method (natural, minimum_degree, best, ...).
        #[arg(short, long)]
        permutation: Option<String>,

        /// Options file (TOML).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Solve A·x = b and print x as JSON.
    Solve {
        /// Path to the matrix (JSON).
        matrix: String,

        /// Path to the right-hand side (JSON array).
        rhs: String,

        /// Compare against an independent sparse Cholesky solve.
        #[arg(long)]
        verify: bool,

        /// Options file (TOML).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Report definiteness and invertibility of a matrix.
    Check {
        /// Path to the matrix (JSON).
        matrix: String,
    },

    /// Inspect a saved decomposition.
    Inspect {
        /// Decomposition directory.
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decompose {
            matrix,
            out,
            return_type,
            method,
            permutation,
            config,
        } => commands::decompose(
            &matrix,
            &out,
            commands::Overrides {
                return_type: return_type.as_deref(),
                method: method.as_deref(),
                permutation: permutation.as_deref(),
                config: config.as_deref(),
            },
        ),
        Commands::Solve {
            matrix,
            rhs,
            verify,
            config,
        } => commands::solve(&matrix, &rhs, verify, config.as_deref()),
        Commands::Check { matrix } => commands::check(&matrix),
        Commands::Inspect { path } => commands::inspect(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
