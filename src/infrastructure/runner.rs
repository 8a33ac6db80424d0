// Infrastructure: one planning run from instance file to printed report

use super::config::{load_instance, parse_instance};
use crate::application::{mappers, PlanReport, SupplyChainPlanner};
use crate::domain::SolverConfig;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;

/// Example instance shipped with the binary
pub const BUNDLED_INSTANCE: &str = include_str!("../../demos/coffee.toml");

#[derive(Debug, Clone)]
pub enum InstanceSource {
    Bundled,
    File(PathBuf),
}

pub struct RunConfig {
    pub instance: InstanceSource,
    pub solver: SolverConfig,
    /// Print the report as JSON instead of text
    pub json: bool,
}

impl RunConfig {
    pub fn new(instance: InstanceSource, solver: SolverConfig) -> Self {
        Self {
            instance,
            solver,
            json: false,
        }
    }
}

/// Load the instance, plan it and print the report to stdout
pub fn run(config: RunConfig) -> Result<PlanReport, Box<dyn std::error::Error>> {
    let (label, instance) = match &config.instance {
        InstanceSource::Bundled => ("coffee".to_string(), parse_instance(BUNDLED_INSTANCE)?),
        InstanceSource::File(path) => (
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "instance".to_string()),
            load_instance(path)?,
        ),
    };
    let name = instance.name.clone().unwrap_or(label);
    let chain = mappers::instance_to_supply_chain(instance);

    let planner = SupplyChainPlanner::from_config(config.solver.clone())?;
    if !config.json {
        print_banner(&name, planner.solver_name(), &config.solver);
    }
    info!(instance = %name, "planning");

    let report = planner.plan(&name, &chain)?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(report)
}

fn print_banner(instance: &str, solver: &str, config: &SolverConfig) {
    println!("\n+------------------------------------------------------------+");
    println!("|  CoffeeFlow - Supply Chain Flow Optimizer                  |");
    println!("+------------------------------------------------------------+");
    println!("|  Instance: {:47} |", instance);
    println!("|  Solver:   {:47} |", solver);
    println!("|  Threads:  {:47} |", config.threads);
    if let Some(limit) = config.time_limit {
        println!("|  Limit:    {:47} |", format!("{} s", limit));
    }
    println!("+------------------------------------------------------------+\n");
}

/// Human-readable report: status, objective, cost split and non-zero flows
pub fn render_report(report: &PlanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Status: {}", report.status);
    if !report.message.is_empty() {
        let _ = writeln!(out, "Message: {}", report.message);
    }
    if let Some(objective) = report.objective {
        let proof = if report.proven_optimal { "" } else { " (not proven optimal)" };
        let _ = writeln!(out, "Total cost: {}{}", objective, proof);
    }
    if let Some(bound) = report.best_bound {
        let _ = writeln!(out, "Best bound: {}", bound);
    }
    if let Some(costs) = &report.costs {
        let _ = writeln!(out, "  supply shipping:   {}", costs.supply_shipping);
        let _ = writeln!(out, "  roasting:          {}", costs.roasting);
        let _ = writeln!(out, "  delivery shipping: {}", costs.delivery_shipping);
    }

    if report.has_plan() {
        let _ = writeln!(out, "\nSupplier -> roastery:");
        for s in report.shipments.iter().filter(|s| s.quantity != 0) {
            let _ = writeln!(out, "  {} -> {}: {}", s.supplier, s.roastery, s.quantity);
        }
        let _ = writeln!(out, "\nRoastery -> cafe:");
        for d in report.deliveries.iter().filter(|d| d.quantity != 0) {
            let _ = writeln!(
                out,
                "  {} -> {} [{}]: {}",
                d.roastery, d.cafe, d.product, d.quantity
            );
        }
    }

    let stats = &report.statistics;
    let _ = writeln!(
        out,
        "\n{} nodes, {} simplex iterations, {:.2} ms",
        stats.nodes_explored, stats.simplex_iterations, stats.solve_time_ms
    );
    out
}
