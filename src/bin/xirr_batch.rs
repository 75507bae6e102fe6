//! Solve XIRR for every schedule in an `id,date,amount` CSV
//!
//! Schedules are solved in parallel; output is one row per id, sorted by id.

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use xirr_solver::cashflow::{load_batch, CashFlowEntry};
use xirr_solver::{SolverConfig, XirrError, XirrReport, XirrSolver};

#[derive(Parser, Debug)]
#[command(version, about = "Compute XIRR for many cash flow schedules")]
struct Cli {
    /// CSV file with an `id,date,amount` header
    file: PathBuf,

    /// Retry from ±10%, ±20%, ... ±90% until a real root is found
    #[arg(long)]
    ladder: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct BatchRow {
    id: String,
    cash_flow_count: usize,
    report: Option<XirrReport>,
    error: Option<String>,
}

fn solve_one(
    solver: &XirrSolver,
    flows: &[CashFlowEntry],
    ladder: bool,
) -> Result<XirrReport, XirrError> {
    if ladder {
        solver.solve_with_guess_ladder(flows)
    } else {
        solver.solve_detailed(flows)
    }
}

/// One CSV row per id. Fields are quoted and escaped by the writer as needed.
fn write_csv<W: Write>(rows: &[BatchRow], out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Id", "CashFlows", "XIRR", "Status", "Iterations"])?;

    for row in rows {
        let count = row.cash_flow_count.to_string();
        if let Some(report) = &row.report {
            let rate = report
                .rate
                .map_or_else(|| "undefined".to_string(), |rate| format!("{:.8}", rate));
            writer.write_record([
                row.id.as_str(),
                &count,
                &rate,
                &format!("{:?}", report.status),
                &report.iterations.to_string(),
            ])?;
        } else {
            let error = row.error.as_deref().unwrap_or_default();
            writer.write_record([row.id.as_str(), &count, "error", error, "0"])?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let start = Instant::now();

    let batch = load_batch(&cli.file)
        .with_context(|| format!("Failed to load batch from {}", cli.file.display()))?;
    let groups: Vec<(String, Vec<CashFlowEntry>)> = batch.into_iter().collect();
    log::info!("Loaded {} schedules in {:?}", groups.len(), start.elapsed());

    let solver = XirrSolver::new(SolverConfig::from_env());

    let rows: Vec<BatchRow> = groups
        .par_iter()
        .map(|(id, flows)| {
            let (report, error) = match solve_one(&solver, flows, cli.ladder) {
                Ok(report) => (Some(report), None),
                Err(err) => (None, Some(err.to_string())),
            };
            BatchRow {
                id: id.clone(),
                cash_flow_count: flows.len(),
                report,
                error,
            }
        })
        .collect();

    log::info!("Solved {} schedules in {:?}", rows.len(), start.elapsed());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    write_csv(&rows, io::stdout().lock()).context("Failed to write results")?;

    Ok(())
}
