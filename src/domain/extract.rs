// Reads solved variable values back out of a terminal solve state

use super::error::ExtractError;
use super::models::{Model, Solution, VariableHandle};
use super::value_objects::SolutionStatus;

/// Lifecycle of a single solve
#[derive(Debug, Clone, Default)]
pub enum SolveState {
    /// No solver has run yet
    #[default]
    Pending,
    /// The solver returned; the solution carries the terminal status
    Terminal(Solution),
}

impl SolveState {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveState::Pending => None,
            SolveState::Terminal(solution) => Some(solution),
        }
    }
}

/// Integer assignment resolved from a solution
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub status: SolutionStatus,
    pub objective: f64,
    /// False when a time or node limit stopped the search
    pub proven_optimal: bool,
    values: Vec<i64>,
}

impl Assignment {
    pub fn value(&self, handle: VariableHandle) -> i64 {
        self.values.get(handle.index()).copied().unwrap_or(0)
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

/// Result extractor over a model and its solve state
pub struct ResultExtractor<'a> {
    model: &'a Model,
    state: &'a SolveState,
}

impl<'a> ResultExtractor<'a> {
    pub fn new(model: &'a Model, state: &'a SolveState) -> Self {
        Self { model, state }
    }

    /// Rounded value per variable plus the objective; values further than the
    /// integrality tolerance from an integer are rejected
    pub fn extract(&self) -> Result<Assignment, ExtractError> {
        let solution = self.state.solution().ok_or(ExtractError::NotSolved)?;
        if !solution.is_feasible()
            || solution.variable_values.len() != self.model.num_variables()
        {
            return Err(ExtractError::NoFeasibleSolution(solution.status));
        }

        let tolerance = self.model.solver_config.integrality_tolerance;
        let values = solution
            .variable_values
            .iter()
            .zip(self.model.variables())
            .map(|(&v, variable)| {
                if (v - v.round()).abs() > tolerance {
                    return Err(ExtractError::NonIntegral {
                        variable: variable.name.clone(),
                        value: v,
                    });
                }
                Ok(v.round() as i64)
            })
            .collect::<Result<Vec<i64>, _>>()?;
        let rounded: Vec<f64> = values.iter().map(|&v| v as f64).collect();

        Ok(Assignment {
            status: solution.status,
            objective: self.model.evaluate(&rounded),
            proven_optimal: solution.is_optimal(),
            values,
        })
    }

    /// Variable names paired with their resolved values, in declaration order
    pub fn named_values(&self) -> Result<Vec<(&'a str, i64)>, ExtractError> {
        let assignment = self.extract()?;
        Ok(self
            .model
            .variables()
            .iter()
            .zip(assignment.values)
            .map(|(v, x)| (v.name.as_str(), x))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConstraintType, OptimizationType};

    fn small_model() -> Model {
        let mut model = Model::new("small");
        let x = model.declare_variable("x", 0.0, None).unwrap();
        let y = model.declare_variable("y", 0.0, None).unwrap();
        model
            .add_constraint(x + y, ConstraintType::GreaterThanOrEqual, 2.0)
            .unwrap();
        model
            .set_objective(3.0 * x + 4.0 * y, OptimizationType::Minimize)
            .unwrap();
        model
    }

    #[test]
    fn test_pending_state_is_not_solved() {
        let model = small_model();
        let state = SolveState::Pending;
        let err = ResultExtractor::new(&model, &state).extract().unwrap_err();
        assert_eq!(err, ExtractError::NotSolved);
    }

    #[test]
    fn test_infeasible_state_has_no_solution() {
        let model = small_model();
        let state = SolveState::Terminal(Solution::new(SolutionStatus::Infeasible, "none"));
        let err = ResultExtractor::new(&model, &state).extract().unwrap_err();
        assert_eq!(err, ExtractError::NoFeasibleSolution(SolutionStatus::Infeasible));
    }

    #[test]
    fn test_values_are_rounded() {
        let model = small_model();
        let state = SolveState::Terminal(Solution::optimal(6.0, vec![1.9999999, 0.0000001]));
        let extractor = ResultExtractor::new(&model, &state);

        let assignment = extractor.extract().unwrap();
        assert_eq!(assignment.values(), &[2, 0]);
        assert_eq!(assignment.objective, 6.0);
        assert!(assignment.proven_optimal);
        assert_eq!(extractor.named_values().unwrap(), vec![("x", 2), ("y", 0)]);
    }

    #[test]
    fn test_fractional_value_is_rejected() {
        let model = small_model();
        let state = SolveState::Terminal(Solution::optimal(7.0, vec![1.5, 0.5]));
        let err = ResultExtractor::new(&model, &state).extract().unwrap_err();
        assert_eq!(
            err,
            ExtractError::NonIntegral {
                variable: "x".to_string(),
                value: 1.5,
            }
        );
    }

    #[test]
    fn test_rounding_follows_configured_tolerance() {
        let mut model = small_model();
        let state = SolveState::Terminal(Solution::optimal(6.0, vec![1.99, 0.0]));
        assert!(ResultExtractor::new(&model, &state).extract().is_err());

        model.solver_config.integrality_tolerance = 0.05;
        let assignment = ResultExtractor::new(&model, &state).extract().unwrap();
        assert_eq!(assignment.values(), &[2, 0]);
    }

    #[test]
    fn test_limit_with_incumbent_is_not_proven() {
        let model = small_model();
        let mut solution = Solution::optimal(8.0, vec![0.0, 2.0]);
        solution.status = SolutionStatus::NodeLimit;
        let state = SolveState::Terminal(solution);

        let assignment = ResultExtractor::new(&model, &state).extract().unwrap();
        assert!(!assignment.proven_optimal);
        assert_eq!(assignment.objective, 8.0);
    }
}
