use coffeeflow::{
    BranchAndBoundSolver, ConstraintType, LinearExpr, Model, OptimizationType, SolutionStatus,
    SolverConfig, SolverService, TieBreak,
};
use proptest::prelude::*;

const UPPER: i64 = 4;

#[derive(Debug, Clone)]
struct Row {
    coefficients: Vec<i64>,
    relation: ConstraintType,
    rhs: i64,
}

#[derive(Debug, Clone)]
struct SmallProgram {
    objective: Vec<i64>,
    maximize: bool,
    rows: Vec<Row>,
}

impl SmallProgram {
    fn model(&self, config: SolverConfig) -> Model {
        let mut model = Model::new("brute").with_config(config);
        let handles: Vec<_> = (0..self.objective.len())
            .map(|j| {
                model
                    .declare_variable(format!("x{}", j), 0.0, Some(UPPER as f64))
                    .unwrap()
            })
            .collect();
        for row in &self.rows {
            let mut expr = LinearExpr::new();
            for (&h, &a) in handles.iter().zip(&row.coefficients) {
                expr.add_term(h, a as f64);
            }
            model.add_constraint(expr, row.relation, row.rhs as f64).unwrap();
        }
        let mut objective = LinearExpr::new();
        for (&h, &c) in handles.iter().zip(&self.objective) {
            objective.add_term(h, c as f64);
        }
        let direction = if self.maximize {
            OptimizationType::Maximize
        } else {
            OptimizationType::Minimize
        };
        model.set_objective(objective, direction).unwrap();
        model
    }

    /// Best objective and the lexicographically smallest assignment attaining it
    fn enumerate(&self) -> Option<(i64, Vec<i64>)> {
        let n = self.objective.len();
        let mut best: Option<(i64, Vec<i64>)> = None;
        let mut x = vec![0i64; n];
        loop {
            let feasible = self.rows.iter().all(|row| {
                let lhs: i64 = row.coefficients.iter().zip(&x).map(|(a, v)| a * v).sum();
                match row.relation {
                    ConstraintType::LessThanOrEqual => lhs <= row.rhs,
                    ConstraintType::GreaterThanOrEqual => lhs >= row.rhs,
                    ConstraintType::Equal => lhs == row.rhs,
                }
            });
            if feasible {
                let value: i64 = self.objective.iter().zip(&x).map(|(c, v)| c * v).sum();
                let better = match &best {
                    None => true,
                    Some((b, _)) if self.maximize => value > *b,
                    Some((b, _)) => value < *b,
                };
                if better {
                    best = Some((value, x.clone()));
                }
            }

            // odometer with the last variable fastest: visits vectors in lexicographic order
            let mut j = n;
            loop {
                if j == 0 {
                    return best;
                }
                j -= 1;
                if x[j] < UPPER {
                    x[j] += 1;
                    break;
                }
                x[j] = 0;
            }
        }
    }
}

fn relation() -> impl Strategy<Value = ConstraintType> {
    prop_oneof![
        Just(ConstraintType::LessThanOrEqual),
        Just(ConstraintType::GreaterThanOrEqual),
        Just(ConstraintType::Equal),
    ]
}

fn small_program() -> impl Strategy<Value = SmallProgram> {
    (2usize..=3).prop_flat_map(|n| {
        let row = (prop::collection::vec(-3i64..=3, n), relation(), -4i64..=10).prop_map(
            |(coefficients, relation, rhs)| Row {
                coefficients,
                relation,
                rhs,
            },
        );
        (
            prop::collection::vec(-5i64..=5, n),
            any::<bool>(),
            prop::collection::vec(row, 1..=3),
        )
            .prop_map(|(objective, maximize, rows)| SmallProgram {
                objective,
                maximize,
                rows,
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn branch_and_bound_matches_enumeration(program in small_program()) {
        let model = program.model(SolverConfig::default());
        let solution = BranchAndBoundSolver::new().solve(&model).unwrap();

        match program.enumerate() {
            None => prop_assert_eq!(solution.status, SolutionStatus::Infeasible),
            Some((value, assignment)) => {
                prop_assert_eq!(solution.status, SolutionStatus::Optimal);
                prop_assert_eq!(solution.optimal_value, Some(value as f64));
                let found: Vec<i64> = solution
                    .variable_values
                    .iter()
                    .map(|v| v.round() as i64)
                    .collect();
                prop_assert_eq!(found, assignment);
            }
        }
    }

    #[test]
    fn parallel_search_matches_enumeration(program in small_program()) {
        let config = SolverConfig {
            threads: 3,
            tie_break: TieBreak::FirstFound,
            ..SolverConfig::default()
        };
        let model = program.model(config);
        let solution = BranchAndBoundSolver::new().solve(&model).unwrap();

        match program.enumerate() {
            None => prop_assert_eq!(solution.status, SolutionStatus::Infeasible),
            Some((value, _)) => {
                prop_assert_eq!(solution.status, SolutionStatus::Optimal);
                prop_assert_eq!(solution.optimal_value, Some(value as f64));
                prop_assert!(model.max_violation(&solution.variable_values) <= 1e-6);
            }
        }
    }
}
