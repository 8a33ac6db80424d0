mod common;

use coffeeflow::network::Tier;
use coffeeflow::{
    BuildError, FlowModelBuilder, PlanError, SolverConfig, SupplyChain, SupplyChainPlanner,
};
use common::coffee;
use rstest::rstest;

fn build_error(chain: SupplyChain) -> BuildError {
    match FlowModelBuilder::new(&chain).build() {
        Ok(_) => panic!("expected a build error"),
        Err(e) => e,
    }
}

#[rstest]
#[case::duplicate_supplier(coffee().supplier("supplier1", 10.0), "supplier1")]
#[case::cafe_shadows_roastery(coffee().cafe("roastery2", &[("light", 0.0), ("dark", 0.0)]), "roastery2")]
fn duplicate_nodes_are_rejected(#[case] chain: SupplyChain, #[case] name: &str) {
    assert_eq!(build_error(chain), BuildError::DuplicateNode(name.to_string()));
}

#[test]
fn duplicate_product_is_rejected() {
    assert_eq!(
        build_error(coffee().product("light")),
        BuildError::DuplicateProduct("light".to_string())
    );
}

#[rstest]
#[case::supplier_to_cafe(coffee().supply_route("supplier1", "cafe1", 1.0), Tier::Supplier, Tier::Roastery)]
#[case::roastery_to_roastery(coffee().delivery_route("roastery1", "roastery2", 1.0), Tier::Roastery, Tier::Cafe)]
#[case::backwards(coffee().delivery_route("cafe1", "roastery1", 1.0), Tier::Roastery, Tier::Cafe)]
fn routes_must_follow_tiers(
    #[case] chain: SupplyChain,
    #[case] from_tier: Tier,
    #[case] to_tier: Tier,
) {
    match build_error(chain) {
        BuildError::TierMismatch {
            expected_from,
            expected_to,
            ..
        } => {
            assert_eq!(expected_from, from_tier);
            assert_eq!(expected_to, to_tier);
        }
        other => panic!("unexpected error {}", other),
    }
}

#[rstest]
#[case::negative_capacity(coffee().supplier("supplier4", -5.0))]
#[case::nan_cost(coffee().supplier("supplier4", 1.0).supply_route("supplier4", "roastery1", f64::NAN))]
#[case::infinite_demand(coffee().cafe("cafe4", &[("light", f64::INFINITY), ("dark", 0.0)]))]
#[case::negative_roasting(coffee().roastery("roastery3", &[("light", -1.0), ("dark", 1.0)]))]
fn invalid_scalars_are_rejected(#[case] chain: SupplyChain) {
    assert!(matches!(build_error(chain), BuildError::InvalidScalar { .. }));
}

#[test]
fn unknown_route_endpoint_is_rejected() {
    let chain = coffee().supply_route("supplier9", "roastery1", 1.0);
    assert_eq!(
        build_error(chain),
        BuildError::UnknownNode {
            from: "supplier9".to_string(),
            to: "roastery1".to_string(),
            node: "supplier9".to_string(),
        }
    );
}

#[test]
fn duplicate_route_is_rejected() {
    let chain = coffee().supply_route("supplier1", "roastery1", 9.0);
    assert!(matches!(
        build_error(chain),
        BuildError::DuplicateRoute { .. }
    ));
}

#[test]
fn missing_demand_and_roasting_cost_are_rejected() {
    let mut chain = coffee();
    chain.cafes[0].demand.remove("dark");
    assert!(matches!(
        build_error(chain),
        BuildError::MissingDemand { cafe, product } if cafe == "cafe1" && product == "dark"
    ));

    let mut chain = coffee();
    chain.roasteries[1].roasting_cost.remove("light");
    assert!(matches!(
        build_error(chain),
        BuildError::MissingRoastingCost { roastery, product } if roastery == "roastery2" && product == "light"
    ));
}

#[test]
fn unknown_product_is_rejected() {
    let mut chain = coffee();
    chain.cafes[2].demand.insert("decaf".to_string(), 5.0);
    assert!(matches!(
        build_error(chain),
        BuildError::UnknownProduct { product, .. } if product == "decaf"
    ));
}

#[test]
fn planner_separates_malformed_from_infeasible() {
    let planner = SupplyChainPlanner::from_config(SolverConfig::default()).unwrap();

    let malformed = coffee().supply_route("supplier1", "cafe2", 1.0);
    assert!(matches!(
        planner.plan("bad", &malformed),
        Err(PlanError::Build(BuildError::TierMismatch { .. }))
    ));

    let mut infeasible = coffee();
    infeasible.suppliers.iter_mut().for_each(|s| s.capacity = 10.0);
    let report = planner.plan("short", &infeasible).unwrap();
    assert_eq!(report.status, coffeeflow::SolutionStatus::Infeasible);
}
