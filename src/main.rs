//! XIRR CLI
//!
//! Reads one `date,amount` CSV schedule and prints its XIRR.
//! Solver defaults can be set with XIRR_TOLERANCE, XIRR_MAX_ITERATIONS and
//! XIRR_INITIAL_GUESS; command-line flags take precedence.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use xirr_solver::cashflow::load_cash_flows;
use xirr_solver::{SolverConfig, XirrReport, XirrSolver};

#[derive(Parser, Debug)]
#[command(version, about = "Compute the XIRR of a dated cash flow schedule")]
struct Cli {
    /// CSV file with a `date,amount` header and YYYY-MM-DD dates
    file: PathBuf,

    /// Starting annual rate (e.g. 0.1 for 10%)
    #[arg(long)]
    guess: Option<f64>,

    /// Convergence threshold on the rate
    #[arg(long)]
    tolerance: Option<f64>,

    /// Iteration cap per starting guess
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Retry from ±10%, ±20%, ... ±90% until a real root is found
    #[arg(long)]
    ladder: bool,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct XirrResponse {
    file: String,
    cash_flow_count: usize,
    config: SolverConfig,
    report: XirrReport,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = SolverConfig::from_env();
    if let Some(guess) = cli.guess {
        config = config.with_initial_guess(guess);
    }
    if let Some(tolerance) = cli.tolerance {
        config = config.with_tolerance(tolerance);
    }
    if let Some(max_iterations) = cli.max_iterations {
        config = config.with_max_iterations(max_iterations);
    }

    let flows = load_cash_flows(&cli.file)
        .with_context(|| format!("Failed to load cash flows from {}", cli.file.display()))?;

    let solver = XirrSolver::new(config);
    let report = if cli.ladder {
        solver.solve_with_guess_ladder(&flows)?
    } else {
        solver.solve_detailed(&flows)?
    };

    if cli.json {
        let response = XirrResponse {
            file: cli.file.display().to_string(),
            cash_flow_count: flows.len(),
            config,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Cash flows: {}", flows.len());
    match report.rate {
        Some(rate) => println!("XIRR: {:.6}%", rate * 100.0),
        None => println!("XIRR: undefined ({:?})", report.status),
    }
    println!("Iterations: {}", report.iterations);
    if let Some(residual) = report.residual {
        println!("NPV at rate: {:.3e}", residual);
    }
    if report.complex_steps > 0 {
        println!("Complex intermediate steps: {}", report.complex_steps);
    }

    Ok(())
}
