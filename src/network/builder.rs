// Translates a validated supply chain into an integer flow model

use super::error::BuildError;
use super::graph::{EdgeMap, FlowNetwork, SupplyChain};
use crate::domain::{
    ConstraintType, LinearExpr, Model, OptimizationType, Solution, SolveState, SolverConfig,
    SolverError, SolverService, VariableHandle,
};
use std::ops::Range;
use tracing::debug;

/// Upper bound of every flow variable; effectively unbounded
pub const FLOW_UPPER_BOUND: f64 = i32::MAX as f64;

/// Builds the flow model for one supply chain
pub struct FlowModelBuilder<'a> {
    chain: &'a SupplyChain,
    name: String,
    config: SolverConfig,
}

impl<'a> FlowModelBuilder<'a> {
    pub fn new(chain: &'a SupplyChain) -> Self {
        Self {
            chain,
            name: "supply_chain".to_string(),
            config: SolverConfig::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<FlowModel, BuildError> {
        let network = FlowNetwork::validate(self.chain)?;
        let mut model = Model::new(self.name)
            .with_description("Minimum-cost supplier to roastery to cafe flow")
            .with_config(self.config);

        // Variables: one per supply route, then one per (product, delivery route)
        let mut supply = EdgeMap::new();
        for key in network.supply_routes().keys() {
            let handle =
                model.declare_variable(format!("delivery_{}", key), 0.0, Some(FLOW_UPPER_BOUND))?;
            supply
                .insert(key.clone(), handle)
                .map_err(|_| BuildError::DuplicateRoute {
                    from: key.source.clone(),
                    to: key.destination.clone(),
                })?;
        }

        let mut per_route: Vec<Vec<VariableHandle>> =
            vec![Vec::with_capacity(network.products().len()); network.delivery_routes().len()];
        for product in network.products() {
            for (handles, key) in per_route.iter_mut().zip(network.delivery_routes().keys()) {
                let handle = model.declare_variable(
                    format!("{}_{}", product, key),
                    0.0,
                    Some(FLOW_UPPER_BOUND),
                )?;
                handles.push(handle);
            }
        }
        let mut per_route = per_route.into_iter();
        let delivery = network
            .delivery_routes()
            .map(|_, _| per_route.next().unwrap_or_default());

        let flow = FlowModel {
            network,
            model,
            supply,
            delivery,
            state: SolveState::Pending,
        };
        flow.finish()
    }
}

/// Row ranges of each constraint family, in emission order
struct RowFamilies {
    balance: Range<usize>,
    capacity: Range<usize>,
    demand: Range<usize>,
}

/// Flow model plus the edge keys of its variables
#[derive(Debug, Clone)]
pub struct FlowModel {
    network: FlowNetwork,
    model: Model,
    supply: EdgeMap<VariableHandle>,
    /// One handle per product, in product order
    delivery: EdgeMap<Vec<VariableHandle>>,
    state: SolveState,
}

impl FlowModel {
    fn finish(mut self) -> Result<Self, BuildError> {
        let families = self.add_constraints()?;
        self.set_objective()?;
        self.check_coverage(&families)?;

        debug!(
            model = %self.model.name,
            variables = self.model.num_variables(),
            constraints = self.model.num_constraints(),
            "flow model built"
        );
        Ok(self)
    }

    fn add_constraints(&mut self) -> Result<RowFamilies, BuildError> {
        let start = self.model.num_constraints();
        for roastery in self.network.roasteries() {
            let inbound: LinearExpr = self.supply.inbound(roastery).map(|(_, &h)| h).sum();
            let outbound: LinearExpr = self
                .delivery
                .outbound(roastery)
                .flat_map(|(_, handles)| handles.iter().copied())
                .sum();
            self.model.add_named_constraint(
                format!("balance_{}", roastery),
                inbound - outbound,
                ConstraintType::Equal,
                0.0,
            )?;
        }
        let balance = start..self.model.num_constraints();

        let start = self.model.num_constraints();
        let suppliers: Vec<(String, f64)> = self
            .network
            .suppliers()
            .map(|(s, c)| (s.to_string(), c))
            .collect();
        for (supplier, capacity) in &suppliers {
            let outbound: LinearExpr = self.supply.outbound(supplier).map(|(_, &h)| h).sum();
            self.model.add_named_constraint(
                format!("capacity_{}", supplier),
                outbound,
                ConstraintType::LessThanOrEqual,
                *capacity,
            )?;
        }
        let capacity = start..self.model.num_constraints();

        let start = self.model.num_constraints();
        for cafe in self.network.cafes() {
            for (p, product) in self.network.products().iter().enumerate() {
                let inbound: LinearExpr = self
                    .delivery
                    .inbound(cafe)
                    .map(|(_, handles)| handles[p])
                    .sum();
                self.model.add_named_constraint(
                    format!("demand_{}_{}", cafe, product),
                    inbound,
                    ConstraintType::GreaterThanOrEqual,
                    self.network.demand(cafe, product),
                )?;
            }
        }
        let demand = start..self.model.num_constraints();

        Ok(RowFamilies {
            balance,
            capacity,
            demand,
        })
    }

    /// Supply shipping plus roasting plus delivery shipping.
    ///
    /// Variable maps share key order with the network's route maps.
    fn set_objective(&mut self) -> Result<(), BuildError> {
        let mut objective = LinearExpr::new();
        let supply = self.network.supply_routes().iter().zip(self.supply.iter());
        for ((_, &shipping), (_, &handle)) in supply {
            objective.add_term(handle, shipping);
        }

        let delivery = self.network.delivery_routes().iter().zip(self.delivery.iter());
        for ((key, &shipping), (_, handles)) in delivery {
            for (product, &handle) in self.network.products().iter().zip(handles) {
                let roasting = self
                    .network
                    .roasting_cost(&key.source, product)
                    .unwrap_or(0.0);
                objective.add_term(handle, roasting + shipping);
            }
        }
        self.model
            .set_objective(objective, OptimizationType::Minimize)?;
        Ok(())
    }

    /// Every supply variable sits in one capacity and one balance row, every
    /// delivery variable in one balance and one demand row.
    fn check_coverage(&self, families: &RowFamilies) -> Result<(), BuildError> {
        let count = |rows: &Range<usize>| {
            let mut counts = vec![0u32; self.model.num_variables()];
            for constraint in &self.model.constraints()[rows.clone()] {
                for &(handle, _) in &constraint.terms {
                    counts[handle.index()] += 1;
                }
            }
            counts
        };
        let balance = count(&families.balance);
        let capacity = count(&families.capacity);
        let demand = count(&families.demand);

        let check = |family: &'static str, counts: &[u32], handle: VariableHandle, expected| {
            let found = counts[handle.index()];
            if found == expected {
                Ok(())
            } else {
                Err(BuildError::CoverageMismatch {
                    family,
                    variable: self.variable_name(handle),
                    expected,
                    found,
                })
            }
        };

        for (_, &handle) in self.supply.iter() {
            check("capacity", &capacity, handle, 1)?;
            check("balance", &balance, handle, 1)?;
            check("demand", &demand, handle, 0)?;
        }
        for handle in self.delivery.iter().flat_map(|(_, h)| h.iter().copied()) {
            check("capacity", &capacity, handle, 0)?;
            check("balance", &balance, handle, 1)?;
            check("demand", &demand, handle, 1)?;
        }
        Ok(())
    }

    fn variable_name(&self, handle: VariableHandle) -> String {
        self.model
            .variable(handle)
            .map(|v| v.name.clone())
            .unwrap_or_else(|| format!("#{}", handle.index()))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn network(&self) -> &FlowNetwork {
        &self.network
    }

    pub fn supply_variables(&self) -> &EdgeMap<VariableHandle> {
        &self.supply
    }

    pub fn supply_variable(&self, supplier: &str, roastery: &str) -> Option<VariableHandle> {
        self.supply.get(supplier, roastery).copied()
    }

    pub fn delivery_variable(
        &self,
        roastery: &str,
        cafe: &str,
        product: &str,
    ) -> Option<VariableHandle> {
        let p = self.network.products().iter().position(|x| x == product)?;
        self.delivery
            .get(roastery, cafe)
            .and_then(|handles| handles.get(p).copied())
    }

    pub(crate) fn delivery_variables(&self) -> &EdgeMap<Vec<VariableHandle>> {
        &self.delivery
    }

    /// Run a solver and record its terminal state.
    ///
    /// On `Err` the state stays as it was, so extraction reports `NotSolved`
    /// for a model that never reached a terminal status.
    pub fn solve(&mut self, solver: &dyn SolverService) -> Result<&Solution, SolverError> {
        let solution = solver.solve(&self.model)?;
        self.state = SolveState::Terminal(solution);
        self.state
            .solution()
            .ok_or_else(|| SolverError::Internal("solve state was not recorded".to_string()))
    }

    pub fn state(&self) -> &SolveState {
        &self.state
    }
}
