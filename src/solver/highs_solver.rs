// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS
// Translates the domain model into a HiGHS row problem

use crate::domain::{
    models::{Model, Solution as DomainSolution, SolutionQuality, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::{ConstraintType, OptimizationType, SolutionStatus as DomainSolutionStatus},
};
use std::time::Instant;

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(&self, model: &Model) -> Result<DomainSolution> {
        // Validate first
        self.validate(model)?;

        let start_time = Instant::now();

        // Use HiGHS RowProblem (add variables first, then constraints)
        use highs::{HighsModelStatus, RowProblem, Sense};

        let mut pb = RowProblem::default();
        let objective = model.objective().coefficients(model.num_variables());

        let cols: Vec<_> = model
            .variables()
            .iter()
            .zip(&objective)
            .map(|(var_def, &obj_coeff)| {
                let lower = var_def.lower_bound;
                let upper = var_def.upper_bound.unwrap_or(f64::INFINITY);
                if var_def.is_integer() {
                    pb.add_integer_column(obj_coeff, lower..upper)
                } else {
                    pb.add_column(obj_coeff, lower..upper)
                }
            })
            .collect();

        // Add constraints
        for constraint in model.constraints() {
            let terms: Vec<_> = constraint
                .terms
                .iter()
                .map(|&(handle, coeff)| (cols[handle.index()], coeff))
                .collect();

            match constraint.constraint_type {
                ConstraintType::LessThanOrEqual => {
                    pb.add_row(..=constraint.bound, &terms);
                }
                ConstraintType::Equal => {
                    pb.add_row(constraint.bound..=constraint.bound, &terms);
                }
                ConstraintType::GreaterThanOrEqual => {
                    pb.add_row(constraint.bound.., &terms);
                }
            }
        }

        let sense = match model.objective().optimization_type {
            OptimizationType::Maximize => Sense::Maximise,
            OptimizationType::Minimize => Sense::Minimise,
        };

        let mut highs_model = pb.optimise(sense);
        highs_model.set_option("output_flag", model.solver_config.verbose);
        if let Some(limit) = model.solver_config.time_limit {
            highs_model.set_option("time_limit", limit);
        }
        let solved = highs_model.solve();

        let mut statistics = SolverStatistics::for_model(model);
        statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        // Process result
        match solved.status() {
            HighsModelStatus::Optimal => {
                let variable_values = solved.get_solution().columns().to_vec();
                let quality = SolutionQuality::measure(model, &variable_values);

                let mut solution =
                    DomainSolution::optimal(model.evaluate(&variable_values), variable_values)
                        .with_statistics(statistics)
                        .with_quality(quality);
                solution.message = format!("Optimal solution found for '{}'", model.name);

                Ok(solution)
            }
            HighsModelStatus::Infeasible => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                Ok(DomainSolution::new(
                    DomainSolutionStatus::Unbounded,
                    "Problem is unbounded: objective can be improved infinitely",
                )
                .with_statistics(statistics))
            }
            status => Err(SolverError::Internal(format!(
                "HiGHS solver returned status: {:?}",
                status
            ))),
        }
    }

    fn name(&self) -> &str {
        "HiGHS"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
