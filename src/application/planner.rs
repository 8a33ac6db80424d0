// Use case: build, solve and extract one supply-chain plan

use super::mappers::{self, PlanReport};
use crate::domain::{ExtractError, SolverConfig, SolverError, SolverService};
use crate::network::{BuildError, FlowModel, FlowModelBuilder, SupplyChain};
use crate::solver::SolverFactory;
use std::sync::Arc;
use tracing::{info, info_span, warn};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The data is malformed; nothing was solved
    #[error("Malformed supply chain: {0}")]
    Build(#[from] BuildError),

    #[error("Could not read solved flows: {0}")]
    Extract(#[from] ExtractError),
}

/// Orchestrates build, solve and extraction for a solver backend
pub struct SupplyChainPlanner {
    solver: Arc<dyn SolverService>,
    config: SolverConfig,
}

impl SupplyChainPlanner {
    pub fn new(solver: Arc<dyn SolverService>) -> Self {
        Self {
            solver,
            config: SolverConfig::default(),
        }
    }

    /// Planner whose solver is picked from the configured backend
    pub fn from_config(config: SolverConfig) -> Result<Self, SolverError> {
        let solver = SolverFactory::create_from_backend(config.backend)?;
        Ok(Self { solver, config })
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    /// Build the flow model without solving it
    pub fn build(&self, name: &str, chain: &SupplyChain) -> Result<FlowModel, BuildError> {
        FlowModelBuilder::new(chain)
            .with_name(name)
            .with_config(self.config.clone())
            .build()
    }

    /// Build, solve and extract.
    ///
    /// Malformed data is an `Err`; infeasibility and solver failures are
    /// reported through the report status.
    pub fn plan(&self, name: &str, chain: &SupplyChain) -> Result<PlanReport, PlanError> {
        let span = info_span!("plan", instance = name, solver = self.solver.name());
        let _guard = span.enter();

        let mut flow = self.build(name, chain)?;
        info!(
            variables = flow.model().num_variables(),
            constraints = flow.model().num_constraints(),
            "solving supply chain"
        );

        let solution = match flow.solve(self.solver.as_ref()) {
            Ok(solution) => solution.clone(),
            Err(error) => {
                warn!(%error, "solver failed");
                return Ok(mappers::error_to_report(name, self.solver.name(), &error));
            }
        };
        info!(status = %solution.status, objective = ?solution.optimal_value, "solve finished");

        let plan = if solution.is_feasible() {
            Some(flow.extract()?)
        } else {
            None
        };
        Ok(mappers::solution_to_report(
            name,
            self.solver.name(),
            &solution,
            plan,
        ))
    }
}
