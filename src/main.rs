use clap::Parser;
use coffeeflow::infrastructure::{run, AppConfig, InstanceSource, RunConfig};
use coffeeflow::{SolutionStatus, SolverBackend, TieBreak};
use std::path::PathBuf;

/// Minimum-cost flow planner for a supplier, roastery and cafe network
#[derive(Parser, Debug)]
#[command(name = "coffeeflow")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Instance file (TOML); the bundled coffee example when omitted
    #[arg(short, long)]
    instance: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Solver backend (native, coin_cbc, highs)
    #[arg(long)]
    backend: Option<SolverBackend>,

    /// Worker threads for the branch-and-bound search
    #[arg(long)]
    threads: Option<usize>,

    /// Wall-clock limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Maximum number of branch-and-bound nodes
    #[arg(long)]
    node_limit: Option<u64>,

    /// Keep the first optimal assignment instead of the lexicographically smallest
    #[arg(long)]
    first_found: bool,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.init()?;

    let mut solver = config.solver.to_solver_config();
    if let Some(backend) = cli.backend {
        solver.backend = backend;
    }
    if let Some(threads) = cli.threads {
        solver.threads = threads;
    }
    if cli.time_limit.is_some() {
        solver.time_limit = cli.time_limit;
    }
    if cli.node_limit.is_some() {
        solver.node_limit = cli.node_limit;
    }
    if cli.first_found {
        solver.tie_break = TieBreak::FirstFound;
    }

    let instance = cli
        .instance
        .map(InstanceSource::File)
        .unwrap_or(InstanceSource::Bundled);
    let mut run_config = RunConfig::new(instance, solver);
    run_config.json = cli.json;

    let report = run(run_config)?;
    if report.status == SolutionStatus::Error {
        return Err(report.message.into());
    }
    Ok(())
}
