// COIN-OR CBC Solver Adapter
// Implements the SolverService interface for CBC through good_lp

use crate::domain::{
    models::{Model, Solution as DomainSolution, SolutionQuality, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use std::time::Instant;

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(&self, model: &Model) -> Result<DomainSolution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        // Build variables using good_lp
        let mut vars = variables!();
        let lp_variables: Vec<GoodLpVariable> = model
            .variables()
            .iter()
            .map(|var_def| {
                let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);
                let definition = variable().min(var_def.lower_bound).max(upper);
                if var_def.is_integer() {
                    vars.add(definition.integer())
                } else {
                    vars.add(definition)
                }
            })
            .collect();

        // good_lp minimises, so negate for maximization
        let sign = match model.objective().optimization_type {
            OptimizationType::Minimize => 1.0,
            OptimizationType::Maximize => -1.0,
        };
        let mut obj_expr: Expression = 0.into();
        for &(handle, coeff) in &model.objective().terms {
            obj_expr += sign * coeff * lp_variables[handle.index()];
        }

        let mut lp_model = vars.minimise(obj_expr).using(coin_cbc::coin_cbc);
        lp_model.set_parameter("log", if model.solver_config.verbose { "1" } else { "0" });
        if let Some(limit) = model.solver_config.time_limit {
            lp_model.set_parameter("seconds", &limit.to_string());
        }

        for constraint in model.constraints() {
            let mut lhs: Expression = 0.into();
            for &(handle, coeff) in &constraint.terms {
                lhs += coeff * lp_variables[handle.index()];
            }

            lp_model = match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => lp_model.with(lhs.leq(constraint.bound)),
                ConstraintType::Equal => lp_model.with(lhs.eq(constraint.bound)),
                ConstraintType::GreaterThanOrEqual => lp_model.with(lhs.geq(constraint.bound)),
            };
        }

        // Solve the problem
        let solution_result = lp_model.solve();
        let mut statistics = SolverStatistics::for_model(model);
        statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        // Process result
        match solution_result {
            Ok(sol) => {
                let variable_values: Vec<f64> =
                    lp_variables.iter().map(|&var| sol.value(var)).collect();
                let quality = SolutionQuality::measure(model, &variable_values);

                let mut solution =
                    DomainSolution::optimal(model.evaluate(&variable_values), variable_values)
                        .with_statistics(statistics)
                        .with_quality(quality);
                solution.message = format!("Optimal solution found for '{}'", model.name);

                Ok(solution)
            }
            Err(ResolutionError::Infeasible) => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            Err(ResolutionError::Unbounded) => Ok(DomainSolution::new(
                DomainSolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            )
            .with_statistics(statistics)),
            Err(e) => Err(SolverError::Internal(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
