// Mappers: Convert between serialized instances, domain inputs and reports
// Keeps file formats out of the network and solver layers

use crate::domain::{Solution, SolutionStatus, SolverError, SolverStatistics};
use crate::network::{
    Cafe, CostBreakdown, Delivery, FlowPlan, RoastedTotal, Roastery, Route, Shipment, Supplier,
    SupplyChain,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized supply-chain instance
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceFile {
    #[serde(default)]
    pub name: Option<String>,
    pub products: Vec<String>,
    #[serde(default)]
    pub suppliers: Vec<SupplierEntry>,
    #[serde(default)]
    pub roasteries: Vec<RoasteryEntry>,
    #[serde(default)]
    pub cafes: Vec<CafeEntry>,
    #[serde(default)]
    pub supply_routes: Vec<RouteEntry>,
    #[serde(default)]
    pub delivery_routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplierEntry {
    pub name: String,
    pub capacity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoasteryEntry {
    pub name: String,
    #[serde(default)]
    pub roasting_cost: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CafeEntry {
    pub name: String,
    #[serde(default)]
    pub demand: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

impl From<RouteEntry> for Route {
    fn from(entry: RouteEntry) -> Self {
        Route {
            from: entry.from,
            to: entry.to,
            unit_cost: entry.cost,
        }
    }
}

/// Convert a serialized instance to the builder input
pub fn instance_to_supply_chain(instance: InstanceFile) -> SupplyChain {
    SupplyChain {
        products: instance.products,
        suppliers: instance
            .suppliers
            .into_iter()
            .map(|s| Supplier {
                name: s.name,
                capacity: s.capacity,
            })
            .collect(),
        roasteries: instance
            .roasteries
            .into_iter()
            .map(|r| Roastery {
                name: r.name,
                roasting_cost: r.roasting_cost,
            })
            .collect(),
        cafes: instance
            .cafes
            .into_iter()
            .map(|c| Cafe {
                name: c.name,
                demand: c.demand,
            })
            .collect(),
        supply_routes: instance.supply_routes.into_iter().map(Route::from).collect(),
        delivery_routes: instance
            .delivery_routes
            .into_iter()
            .map(Route::from)
            .collect(),
    }
}

/// Solve statistics as reported to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStatistics {
    pub simplex_iterations: u64,
    pub nodes_explored: u64,
    pub nodes_pruned: u64,
    pub max_depth: u64,
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
}

impl From<&SolverStatistics> for ReportStatistics {
    fn from(stats: &SolverStatistics) -> Self {
        Self {
            simplex_iterations: stats.simplex_iterations,
            nodes_explored: stats.nodes_explored,
            nodes_pruned: stats.nodes_pruned,
            max_depth: stats.max_depth,
            solve_time_ms: stats.solve_time_ms,
            num_variables: stats.num_variables,
            num_constraints: stats.num_constraints,
        }
    }
}

/// Outcome of one planning run, ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub instance: String,
    pub solver: String,
    pub status: SolutionStatus,
    pub objective: Option<f64>,
    pub best_bound: Option<f64>,
    pub gap: Option<f64>,
    pub proven_optimal: bool,
    pub message: String,
    pub shipments: Vec<Shipment>,
    pub deliveries: Vec<Delivery>,
    pub roasted: Vec<RoastedTotal>,
    pub costs: Option<CostBreakdown>,
    pub statistics: ReportStatistics,
}

impl PlanReport {
    pub fn has_plan(&self) -> bool {
        self.costs.is_some()
    }
}

/// Convert a terminal solution, and its flows when there are any, to a report
pub fn solution_to_report(
    instance: &str,
    solver_name: &str,
    solution: &Solution,
    plan: Option<FlowPlan>,
) -> PlanReport {
    let statistics = ReportStatistics::from(&solution.statistics);
    let mut report = PlanReport {
        instance: instance.to_string(),
        solver: solver_name.to_string(),
        status: solution.status,
        objective: None,
        best_bound: solution.best_bound,
        gap: solution.gap,
        proven_optimal: false,
        message: solution.message.clone(),
        shipments: Vec::new(),
        deliveries: Vec::new(),
        roasted: Vec::new(),
        costs: None,
        statistics,
    };

    if let Some(plan) = plan {
        report.objective = Some(plan.objective);
        report.proven_optimal = plan.proven_optimal;
        report.shipments = plan.shipments;
        report.deliveries = plan.deliveries;
        report.roasted = plan.roasted;
        report.costs = Some(plan.costs);
    }
    report
}

/// Report for a solve that aborted with an error
pub fn error_to_report(instance: &str, solver_name: &str, error: &SolverError) -> PlanReport {
    let solution = Solution::new(SolutionStatus::Error, error.to_string());
    solution_to_report(instance, solver_name, &solution, None)
}
