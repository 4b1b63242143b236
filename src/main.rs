use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use gifting::roster::{self, current_year};
use gifting::runtime;
use gifting::solver::{CandidateGraph, Solver, SolverConfig, write_statistics};

#[derive(Debug, Parser)]
#[command(name = "gifting")]
#[command(about = "Calculate a new year of gifting")]
#[command(
    long_about = "Replaces drawing a name from a hat for groups that gift to only one person within that group."
)]
struct Cli {
    /// Debug-level logging (RUST_LOG still wins).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Produce the gifting report for the desired year.
    Report(ReportArgs),
    /// Calculate the optimum gifting pairs for the year after the latest one recorded.
    Solve(SolveArgs),
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// Path to the data file.
    data: PathBuf,
    /// Year to use, defaults to the current year.
    #[arg(short, long)]
    year: Option<i32>,
}

#[derive(Debug, Args)]
struct SolveArgs {
    /// Path to the data file.
    data: PathBuf,
    /// Name of file to save to; results are not saved otherwise.
    #[arg(short, long)]
    save: Option<PathBuf>,
    /// Search the first level's branches on all cores.
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Show a progress bar (parallel search only).
    #[arg(long, default_value_t = false)]
    progress: bool,
    /// Give up after this many seconds.
    #[arg(long)]
    deadline_secs: Option<f64>,
    /// Also print the baggage and year-penalty tables.
    #[arg(long, default_value_t = false)]
    details: bool,
}

fn report(args: &ReportArgs) -> Result<()> {
    let store = roster::load_store(&args.data)?;
    let year = args.year.unwrap_or_else(current_year);
    let mut out = io::stdout().lock();
    roster::gift_report(&store, year, &mut out).context("write report")?;
    Ok(())
}

fn solve(args: &SolveArgs) -> Result<()> {
    let mut store = roster::load_store(&args.data)?;

    let mut config = SolverConfig::from_env();
    config.parallel |= args.parallel;
    config.progress |= args.progress;
    if let Some(secs) = args.deadline_secs {
        config.deadline = Some(
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid deadline {secs}"))?,
        );
    }
    if config.parallel {
        runtime::configure_thread_pool();
    }

    let solver = Solver::new(config);
    let outcome = solver
        .solve(&store)
        .with_context(|| format!("solve {}", args.data.display()))?;

    // baggage as it stood going into this year's solve
    let details = if args.details {
        Some(CandidateGraph::build(&store, &solver.config().penalty)?)
    } else {
        None
    };

    let mut out = io::stdout().lock();
    writeln!(out, "Solution Found : ")?;
    outcome.apply(&mut store);
    roster::gift_report(&store, outcome.year, &mut out)?;
    write_statistics(&outcome, &store, &mut out)?;

    if let Some(graph) = details {
        writeln!(out)?;
        graph.write_baggage_report(&mut out)?;
        writeln!(out)?;
        solver
            .config()
            .penalty
            .write_table(outcome.year - 1, 20, &mut out)?;
    }
    out.flush()?;

    if let Some(path) = &args.save {
        roster::save_store(path, &store)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    runtime::init_logging(cli.verbose);

    match &cli.command {
        Command::Report(args) => report(args),
        Command::Solve(args) => solve(args),
    }
}
