mod common;

use coffeeflow::{
    BranchAndBoundSolver, FlowModelBuilder, SolutionStatus, SolverConfig, SolverService,
    SupplyChainPlanner, TieBreak,
};
use common::{assert_plan_satisfies, coffee, recompute_cost};
use rstest::rstest;
use std::sync::Arc;

#[test]
fn coffee_example_is_optimal_and_feasible() {
    let chain = coffee();
    let mut flow = FlowModelBuilder::new(&chain).build().unwrap();
    let solution = flow.solve(&BranchAndBoundSolver::new()).unwrap().clone();

    assert_eq!(solution.status, SolutionStatus::Optimal);
    let objective = solution.optimal_value.unwrap();
    assert!(objective.is_finite() && objective >= 0.0);
    assert!(flow.model().max_violation(&solution.variable_values) <= 1e-6);

    let plan = flow.extract().unwrap();
    assert!(plan.proven_optimal);
    assert_eq!(plan.objective, 2470.0);
    assert_plan_satisfies(&chain, &flow, &plan);
}

#[test]
fn reported_objective_matches_recomputed_cost() {
    let chain = coffee();
    let mut flow = FlowModelBuilder::new(&chain).build().unwrap();
    let reported = flow
        .solve(&BranchAndBoundSolver::new())
        .unwrap()
        .optimal_value
        .unwrap();
    let plan = flow.extract().unwrap();

    assert!((recompute_cost(&chain, &plan) - reported).abs() < 1e-6);
    assert!((plan.costs.total() - reported).abs() < 1e-6);
}

#[test]
fn lexicographic_tie_break_picks_smallest_assignment() {
    // Up to ten units of light roast for cafe3 cost the same through
    // either roastery; the smallest assignment routes none via supplier1 to roastery1
    // and as little as possible via supplier1 to roastery2.
    let chain = coffee();
    let mut flow = FlowModelBuilder::new(&chain).build().unwrap();
    flow.solve(&BranchAndBoundSolver::new()).unwrap();
    let plan = flow.extract().unwrap();

    assert_eq!(plan.shipment("supplier1", "roastery1"), Some(0));
    assert_eq!(plan.shipment("supplier1", "roastery2"), Some(80));
    assert_eq!(plan.shipment("supplier2", "roastery2"), Some(50));
    assert_eq!(plan.shipment("supplier3", "roastery1"), Some(100));
    assert_eq!(plan.delivery("roastery1", "cafe3", "light"), Some(10));
    assert_eq!(plan.delivery("roastery2", "cafe3", "dark"), Some(100));
}

#[test]
fn solving_twice_is_idempotent() {
    let chain = coffee();
    let flow = FlowModelBuilder::new(&chain).build().unwrap();
    let solver = BranchAndBoundSolver::new();

    let first = solver.solve(flow.model()).unwrap();
    let second = solver.solve(flow.model()).unwrap();
    assert_eq!(first.optimal_value, second.optimal_value);
    assert_eq!(first.variable_values, second.variable_values);
}

#[test]
fn zero_capacity_supplier_ships_nothing() {
    let mut chain = coffee();
    chain.suppliers[1].capacity = 0.0;

    let mut flow = FlowModelBuilder::new(&chain).build().unwrap();
    let status = flow.solve(&BranchAndBoundSolver::new()).unwrap().status;
    assert_eq!(status, SolutionStatus::Optimal);

    let plan = flow.extract().unwrap();
    assert_eq!(plan.shipment("supplier2", "roastery1"), Some(0));
    assert_eq!(plan.shipment("supplier2", "roastery2"), Some(0));
    assert_plan_satisfies(&chain, &flow, &plan);
    // losing the cheapest route into roastery2 cannot make the plan cheaper
    assert!(plan.objective >= 2470.0);
}

#[test]
fn capacity_below_demand_is_infeasible() {
    let mut chain = coffee();
    // 300 units of capacity against 230 of demand; push demand to 301
    chain.cafes[2].demand.insert("dark".to_string(), 171.0);
    assert!(chain.total_capacity() < chain.total_demand());

    let mut flow = FlowModelBuilder::new(&chain).build().unwrap();
    let solution = flow.solve(&BranchAndBoundSolver::new()).unwrap();
    assert_eq!(solution.status, SolutionStatus::Infeasible);
    assert!(solution.optimal_value.is_none());
    assert!(flow.extract().is_err());
}

#[test]
fn unreachable_cafe_demand_is_infeasible_not_zero() {
    let mut chain = coffee();
    chain.delivery_routes.retain(|r| r.to != "cafe2");

    let mut flow = FlowModelBuilder::new(&chain).build().unwrap();
    let status = flow.solve(&BranchAndBoundSolver::new()).unwrap().status;
    assert_eq!(status, SolutionStatus::Infeasible);
}

#[test]
fn roastery_without_supply_is_infeasible_when_it_is_the_only_path() {
    let mut chain = coffee();
    chain.supply_routes.retain(|r| r.to != "roastery2");
    chain.delivery_routes.retain(|r| r.from != "roastery1");

    let mut flow = FlowModelBuilder::new(&chain).build().unwrap();
    let status = flow.solve(&BranchAndBoundSolver::new()).unwrap().status;
    assert_eq!(status, SolutionStatus::Infeasible);
}

#[rstest]
#[case::sequential(1, TieBreak::Lexicographic)]
#[case::parallel(4, TieBreak::Lexicographic)]
#[case::first_found(1, TieBreak::FirstFound)]
#[case::parallel_first_found(3, TieBreak::FirstFound)]
fn every_search_mode_finds_the_same_optimum(#[case] threads: usize, #[case] tie_break: TieBreak) {
    let config = SolverConfig {
        threads,
        tie_break,
        ..SolverConfig::default()
    };
    let planner = SupplyChainPlanner::new(Arc::new(BranchAndBoundSolver::new())).with_config(config);
    let report = planner.plan("coffee", &coffee()).unwrap();

    assert_eq!(report.status, SolutionStatus::Optimal);
    assert_eq!(report.objective, Some(2470.0));
}

#[test]
fn planner_report_carries_flows_and_costs() {
    let planner = SupplyChainPlanner::from_config(SolverConfig::default()).unwrap();
    let report = planner.plan("coffee", &coffee()).unwrap();

    assert!(report.proven_optimal);
    assert_eq!(report.shipments.len(), 6);
    assert_eq!(report.deliveries.len(), 12);
    assert_eq!(report.roasted.len(), 4);
    let costs = report.costs.unwrap();
    assert!((costs.total() - 2470.0).abs() < 1e-6);
    assert_eq!(report.statistics.num_variables, 18);
    assert_eq!(report.statistics.num_constraints, 2 + 3 + 6);
}
