// Flow plan: solved variable values keyed by route and product

use super::builder::FlowModel;
use crate::domain::{ExtractError, ResultExtractor, SolutionStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shipment {
    pub supplier: String,
    pub roastery: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub roastery: String,
    pub cafe: String,
    pub product: String,
    pub quantity: i64,
}

/// Units of one product roasted at one roastery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoastedTotal {
    pub roastery: String,
    pub product: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub supply_shipping: f64,
    pub roasting: f64,
    pub delivery_shipping: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.supply_shipping + self.roasting + self.delivery_shipping
    }
}

/// Resolved integer flows of a solved supply chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowPlan {
    pub status: SolutionStatus,
    pub proven_optimal: bool,
    pub objective: f64,
    pub shipments: Vec<Shipment>,
    pub deliveries: Vec<Delivery>,
    pub roasted: Vec<RoastedTotal>,
    pub costs: CostBreakdown,
}

impl FlowPlan {
    pub fn shipment(&self, supplier: &str, roastery: &str) -> Option<i64> {
        self.shipments
            .iter()
            .find(|s| s.supplier == supplier && s.roastery == roastery)
            .map(|s| s.quantity)
    }

    pub fn delivery(&self, roastery: &str, cafe: &str, product: &str) -> Option<i64> {
        self.deliveries
            .iter()
            .find(|d| d.roastery == roastery && d.cafe == cafe && d.product == product)
            .map(|d| d.quantity)
    }

    pub fn roasted(&self, roastery: &str, product: &str) -> Option<i64> {
        self.roasted
            .iter()
            .find(|r| r.roastery == roastery && r.product == product)
            .map(|r| r.quantity)
    }

    /// Total leaving a supplier over all its routes
    pub fn supplier_outflow(&self, supplier: &str) -> i64 {
        self.shipments
            .iter()
            .filter(|s| s.supplier == supplier)
            .map(|s| s.quantity)
            .sum()
    }

    /// Total of one product arriving at a cafe
    pub fn cafe_inflow(&self, cafe: &str, product: &str) -> i64 {
        self.deliveries
            .iter()
            .filter(|d| d.cafe == cafe && d.product == product)
            .map(|d| d.quantity)
            .sum()
    }
}

impl FlowModel {
    /// Read the solved flows back in domain terms
    pub fn extract(&self) -> Result<FlowPlan, ExtractError> {
        let assignment = ResultExtractor::new(self.model(), self.state()).extract()?;
        let network = self.network();

        let mut costs = CostBreakdown::default();
        let shipments: Vec<Shipment> = network
            .supply_routes()
            .iter()
            .zip(self.supply_variables().iter())
            .map(|((key, &unit_cost), (_, &handle))| {
                let quantity = assignment.value(handle);
                costs.supply_shipping += unit_cost * quantity as f64;
                Shipment {
                    supplier: key.source.clone(),
                    roastery: key.destination.clone(),
                    quantity,
                }
            })
            .collect();

        let mut deliveries = Vec::new();
        let mut roasted = Vec::new();
        for (p, product) in network.products().iter().enumerate() {
            for roastery in network.roasteries() {
                let mut total = 0;
                for ((key, &unit_cost), (_, handles)) in network
                    .delivery_routes()
                    .outbound(roastery)
                    .zip(self.delivery_variables().outbound(roastery))
                {
                    let quantity = assignment.value(handles[p]);
                    total += quantity;
                    costs.delivery_shipping += unit_cost * quantity as f64;
                    deliveries.push(Delivery {
                        roastery: key.source.clone(),
                        cafe: key.destination.clone(),
                        product: product.clone(),
                        quantity,
                    });
                }
                if let Some(unit_cost) = network.roasting_cost(roastery, product) {
                    costs.roasting += unit_cost * total as f64;
                }
                roasted.push(RoastedTotal {
                    roastery: roastery.clone(),
                    product: product.clone(),
                    quantity: total,
                });
            }
        }

        Ok(FlowPlan {
            status: assignment.status,
            proven_optimal: assignment.proven_optimal,
            objective: assignment.objective,
            shipments,
            deliveries,
            roasted,
            costs,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{ExtractError, SolutionStatus};
    use crate::network::{FlowModelBuilder, SupplyChain};
    use crate::solver::BranchAndBoundSolver;

    fn chain(capacity: f64) -> SupplyChain {
        SupplyChain::new()
            .product("light")
            .supplier("s1", capacity)
            .roastery("r1", &[("light", 2.0)])
            .cafe("c1", &[("light", 4.0)])
            .cafe("c2", &[("light", 3.0)])
            .supply_route("s1", "r1", 1.0)
            .delivery_route("r1", "c1", 5.0)
            .delivery_route("r1", "c2", 1.0)
    }

    #[test]
    fn test_extract_before_solve() {
        let flow = FlowModelBuilder::new(&chain(10.0)).build().unwrap();
        assert_eq!(flow.extract().unwrap_err(), ExtractError::NotSolved);
    }

    #[test]
    fn test_plan_splits_costs() {
        let mut flow = FlowModelBuilder::new(&chain(10.0)).build().unwrap();
        flow.solve(&BranchAndBoundSolver::new()).unwrap();
        let plan = flow.extract().unwrap();

        assert_eq!(plan.status, SolutionStatus::Optimal);
        assert!(plan.proven_optimal);
        assert_eq!(plan.shipment("s1", "r1"), Some(7));
        assert_eq!(plan.delivery("r1", "c1", "light"), Some(4));
        assert_eq!(plan.delivery("r1", "c2", "light"), Some(3));
        assert_eq!(plan.roasted("r1", "light"), Some(7));
        assert_eq!(plan.costs.supply_shipping, 7.0);
        assert_eq!(plan.costs.roasting, 14.0);
        assert_eq!(plan.costs.delivery_shipping, 23.0);
        assert_eq!(plan.costs.total(), plan.objective);
        assert_eq!(plan.objective, 44.0);
    }

    #[test]
    fn test_infeasible_plan_is_not_extracted() {
        let mut flow = FlowModelBuilder::new(&chain(5.0)).build().unwrap();
        let status = flow.solve(&BranchAndBoundSolver::new()).unwrap().status;
        assert_eq!(status, SolutionStatus::Infeasible);
        assert_eq!(
            flow.extract().unwrap_err(),
            ExtractError::NoFeasibleSolution(SolutionStatus::Infeasible)
        );
    }
}
