use crate::domain::{
    models::Model,
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolverBackend,
};
use crate::solver::BranchAndBoundSolver;
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver based on the model configuration
    pub fn create_solver(model: &Model) -> Result<Arc<dyn SolverService>> {
        Self::create_from_backend(model.solver_config.backend)
    }

    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Native => Ok(Self::default_solver()),
            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => Ok(Arc::new(crate::solver::CoinCbcSolver::new())),
            #[cfg(feature = "highs")]
            SolverBackend::Highs => Ok(Arc::new(crate::solver::HighsSolver::new())),
            #[allow(unreachable_patterns)]
            other => Err(SolverError::SolverNotAvailable(format!(
                "backend '{}' was not compiled in",
                other
            ))),
        }
    }

    /// Get the default solver (built-in branch-and-bound)
    pub fn default_solver() -> Arc<dyn SolverService> {
        Arc::new(BranchAndBoundSolver::new())
    }
}
