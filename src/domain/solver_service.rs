// Domain service interface for solving optimization models
// Defines the contract that any solver implementation must follow

use super::models::{Model, Solution};

/// Error types for the solver service
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for optimization solvers
///
/// A solver finds the assignment minimizing (or maximizing) the objective
/// subject to every constraint, or classifies the model as infeasible or
/// unbounded. Infeasibility is a terminal [`Solution`] status, not an error;
/// `Err` is reserved for invalid input and numerical breakdowns.
pub trait SolverService: Send + Sync {
    /// Solve a model
    fn solve(&self, model: &Model) -> Result<Solution>;

    /// Validate a model without solving it
    fn validate(&self, model: &Model) -> Result<Vec<String>> {
        let mut errors = Vec::new();
        let config = &model.solver_config;

        // Check variable bounds
        for (i, var) in model.variables().iter().enumerate() {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                        i, var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        // Check constraints
        for (i, constraint) in model.constraints().iter().enumerate() {
            if let Some((h, _)) = constraint
                .terms
                .iter()
                .find(|(h, _)| h.index() >= model.num_variables())
            {
                errors.push(format!(
                    "Constraint {} '{}' references unknown variable #{}",
                    i,
                    constraint.name,
                    h.index()
                ));
            }
        }

        // Check configuration
        if config.threads == 0 {
            errors.push("Solver needs at least one thread".to_string());
        }
        if let Some(limit) = config.time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                errors.push(format!("Time limit must be positive, got {}", limit));
            }
        }
        let tol = config.integrality_tolerance;
        if !(tol > 0.0 && tol < 0.5) {
            errors.push(format!(
                "Integrality tolerance must lie in (0, 0.5), got {}",
                tol
            ));
        }

        let mut warnings = Vec::new();
        if model.objective().terms.is_empty() {
            warnings.push("Objective has no terms; any feasible assignment is optimal".to_string());
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
