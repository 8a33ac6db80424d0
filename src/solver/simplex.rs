// Dense two-phase simplex for the continuous relaxation
//
// Variables are shifted to their lower bounds, finite upper bounds become
// explicit rows, and every row is normalized to a non-negative right-hand
// side before slack, surplus and artificial columns are appended.

use crate::domain::{ConstraintType, SolverError};

const PIVOT_TOLERANCE: f64 = 1e-9;
const ZERO_TOLERANCE: f64 = 1e-12;
/// Non-improving pivots tolerated before switching to Bland's rule
const DEGENERATE_STREAK: u32 = 50;

/// Sparse row `Σ a_j x_j (relation) rhs`
#[derive(Debug, Clone)]
pub struct LpRow {
    pub coefficients: Vec<(usize, f64)>,
    pub relation: ConstraintType,
    pub rhs: f64,
}

impl LpRow {
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .map(|&(j, a)| a * values.get(j).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.relation {
            ConstraintType::LessThanOrEqual => (lhs - self.rhs).max(0.0),
            ConstraintType::GreaterThanOrEqual => (self.rhs - lhs).max(0.0),
            ConstraintType::Equal => (lhs - self.rhs).abs(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimplexOptions {
    pub max_iterations: u64,
    /// Phase-one objective above this proves the relaxation infeasible
    pub feasibility_tolerance: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            feasibility_tolerance: 1e-7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

#[derive(Debug, Clone)]
pub struct LpSolution {
    pub status: LpStatus,
    pub values: Vec<f64>,
    pub objective: f64,
    pub iterations: u64,
}

impl LpSolution {
    fn without_values(status: LpStatus, iterations: u64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: 0.0,
            iterations,
        }
    }
}

enum PhaseEnd {
    Optimal,
    Unbounded,
}

struct Tableau {
    rows: Vec<Vec<f64>>,
    cost: Vec<f64>,
    basis: Vec<usize>,
    allowed: Vec<bool>,
    iterations: u64,
}

impl Tableau {
    fn rhs_column(&self) -> usize {
        self.cost.len() - 1
    }

    fn objective_value(&self) -> f64 {
        -self.cost[self.rhs_column()]
    }

    fn pivot(&mut self, r: usize, q: usize) -> Result<(), SolverError> {
        let element = self.rows[r][q];
        if !element.is_finite() || element.abs() < ZERO_TOLERANCE {
            return Err(SolverError::Internal(format!(
                "degenerate pivot element {} at row {}, column {}",
                element, r, q
            )));
        }

        let inverse = 1.0 / element;
        for value in self.rows[r].iter_mut() {
            *value *= inverse;
        }
        self.rows[r][q] = 1.0;

        let pivot_row = self.rows[r].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if i != r {
                eliminate(row, &pivot_row, q);
            }
        }
        eliminate(&mut self.cost, &pivot_row, q);

        self.basis[r] = q;
        self.iterations += 1;
        Ok(())
    }

    fn entering(&self, bland: bool) -> Option<usize> {
        let candidates = (0..self.rhs_column())
            .filter(|&j| self.allowed[j] && self.cost[j] < -PIVOT_TOLERANCE);
        if bland {
            candidates.min()
        } else {
            // first index wins ties
            candidates.fold(None, |best: Option<usize>, j| match best {
                Some(b) if self.cost[b] <= self.cost[j] => Some(b),
                _ => Some(j),
            })
        }
    }

    fn leaving(&self, q: usize) -> Option<usize> {
        let rhs = self.rhs_column();
        let mut best: Option<(usize, f64)> = None;
        for (i, row) in self.rows.iter().enumerate() {
            let a = row[q];
            if a <= PIVOT_TOLERANCE {
                continue;
            }
            let ratio = row[rhs].max(0.0) / a;
            best = match best {
                None => Some((i, ratio)),
                Some((b, best_ratio)) => {
                    let tie = (ratio - best_ratio).abs() <= ZERO_TOLERANCE;
                    if ratio < best_ratio - ZERO_TOLERANCE || (tie && self.basis[i] < self.basis[b]) {
                        Some((i, ratio))
                    } else {
                        Some((b, best_ratio))
                    }
                }
            };
        }
        best.map(|(i, _)| i)
    }

    fn run(&mut self, options: &SimplexOptions) -> Result<PhaseEnd, SolverError> {
        let mut bland = false;
        let mut streak = 0;
        let mut last_objective = self.objective_value();

        loop {
            if self.iterations >= options.max_iterations {
                return Err(SolverError::Internal(format!(
                    "simplex did not converge within {} iterations",
                    options.max_iterations
                )));
            }

            let Some(q) = self.entering(bland) else {
                return Ok(PhaseEnd::Optimal);
            };
            let Some(r) = self.leaving(q) else {
                return Ok(PhaseEnd::Unbounded);
            };
            self.pivot(r, q)?;

            let objective = self.objective_value();
            if !objective.is_finite() {
                return Err(SolverError::Internal(
                    "simplex objective became non-finite".to_string(),
                ));
            }
            if objective < last_objective - PIVOT_TOLERANCE {
                last_objective = objective;
                streak = 0;
            } else {
                streak += 1;
                if streak > DEGENERATE_STREAK {
                    bland = true;
                }
            }
        }
    }
}

fn eliminate(row: &mut [f64], pivot_row: &[f64], q: usize) {
    let factor = row[q];
    if factor == 0.0 {
        return;
    }
    for (value, &p) in row.iter_mut().zip(pivot_row) {
        *value -= factor * p;
        if value.abs() < ZERO_TOLERANCE {
            *value = 0.0;
        }
    }
    row[q] = 0.0;
}

/// Minimize `objective · x` over the rows with `lower <= x <= upper`.
pub fn solve_relaxation(
    objective: &[f64],
    rows: &[LpRow],
    lower: &[f64],
    upper: &[Option<f64>],
    options: &SimplexOptions,
) -> Result<LpSolution, SolverError> {
    let n = objective.len();
    if lower.len() != n || upper.len() != n {
        return Err(SolverError::InvalidProblem(format!(
            "relaxation has {} objective columns but {} lower and {} upper bounds",
            n,
            lower.len(),
            upper.len()
        )));
    }
    if (0..n).any(|j| matches!(upper[j], Some(u) if u < lower[j] - options.feasibility_tolerance)) {
        return Ok(LpSolution::without_values(LpStatus::Infeasible, 0));
    }

    // Rows over the shifted variables y = x - lower, rhs made non-negative
    let mut standard: Vec<(Vec<f64>, ConstraintType, f64)> = Vec::with_capacity(rows.len() + n);
    for row in rows {
        let mut dense = vec![0.0; n];
        let mut rhs = row.rhs;
        for &(j, a) in &row.coefficients {
            if j >= n {
                return Err(SolverError::InvalidProblem(format!(
                    "row references column {} of {}",
                    j, n
                )));
            }
            dense[j] += a;
            rhs -= a * lower[j];
        }
        standard.push((dense, row.relation, rhs));
    }
    for j in 0..n {
        if let Some(u) = upper[j] {
            let mut dense = vec![0.0; n];
            dense[j] = 1.0;
            standard.push((dense, ConstraintType::LessThanOrEqual, (u - lower[j]).max(0.0)));
        }
    }
    for (dense, relation, rhs) in standard.iter_mut() {
        if *rhs < 0.0 {
            dense.iter_mut().for_each(|a| *a = -*a);
            *rhs = -*rhs;
            *relation = match *relation {
                ConstraintType::LessThanOrEqual => ConstraintType::GreaterThanOrEqual,
                ConstraintType::GreaterThanOrEqual => ConstraintType::LessThanOrEqual,
                ConstraintType::Equal => ConstraintType::Equal,
            };
        }
    }

    let num_slack = standard
        .iter()
        .filter(|(_, r, _)| *r != ConstraintType::Equal)
        .count();
    let num_artificial = standard
        .iter()
        .filter(|(_, r, _)| *r != ConstraintType::LessThanOrEqual)
        .count();
    let slack_start = n;
    let artificial_start = n + num_slack;
    let width = artificial_start + num_artificial + 1;

    let mut tableau_rows = Vec::with_capacity(standard.len());
    let mut basis = Vec::with_capacity(standard.len());
    let (mut next_slack, mut next_artificial) = (slack_start, artificial_start);
    for (dense, relation, rhs) in standard {
        let mut row = vec![0.0; width];
        row[..n].copy_from_slice(&dense);
        row[width - 1] = rhs;
        match relation {
            ConstraintType::LessThanOrEqual => {
                row[next_slack] = 1.0;
                basis.push(next_slack);
                next_slack += 1;
            }
            ConstraintType::GreaterThanOrEqual => {
                row[next_slack] = -1.0;
                next_slack += 1;
                row[next_artificial] = 1.0;
                basis.push(next_artificial);
                next_artificial += 1;
            }
            ConstraintType::Equal => {
                row[next_artificial] = 1.0;
                basis.push(next_artificial);
                next_artificial += 1;
            }
        }
        tableau_rows.push(row);
    }

    let mut allowed = vec![true; width - 1];
    allowed[artificial_start..].iter_mut().for_each(|a| *a = false);
    let mut tableau = Tableau {
        rows: tableau_rows,
        cost: vec![0.0; width],
        basis,
        allowed,
        iterations: 0,
    };

    // Phase one: drive the artificial columns to zero
    if num_artificial > 0 {
        for j in artificial_start..width - 1 {
            tableau.cost[j] = 1.0;
        }
        for i in 0..tableau.rows.len() {
            if tableau.basis[i] >= artificial_start {
                for k in 0..width {
                    tableau.cost[k] -= tableau.rows[i][k];
                }
            }
        }

        if let PhaseEnd::Unbounded = tableau.run(options)? {
            return Err(SolverError::Internal(
                "phase one of the simplex reported an unbounded ray".to_string(),
            ));
        }
        if tableau.objective_value() > options.feasibility_tolerance {
            return Ok(LpSolution::without_values(
                LpStatus::Infeasible,
                tableau.iterations,
            ));
        }

        let mut redundant = Vec::new();
        for i in 0..tableau.rows.len() {
            if tableau.basis[i] < artificial_start {
                continue;
            }
            let replacement =
                (0..artificial_start).find(|&q| tableau.rows[i][q].abs() > PIVOT_TOLERANCE);
            match replacement {
                Some(q) => tableau.pivot(i, q)?,
                None => redundant.push(i),
            }
        }
        for &i in redundant.iter().rev() {
            tableau.rows.remove(i);
            tableau.basis.remove(i);
        }
    }

    // Phase two: the real objective, priced against the current basis
    let column_cost = |j: usize| if j < n { objective[j] } else { 0.0 };
    let mut cost = vec![0.0; width];
    cost[..n].copy_from_slice(objective);
    for (row, &b) in tableau.rows.iter().zip(&tableau.basis) {
        let cb = column_cost(b);
        if cb != 0.0 {
            for k in 0..width {
                cost[k] -= cb * row[k];
            }
        }
    }
    tableau.cost = cost;

    if let PhaseEnd::Unbounded = tableau.run(options)? {
        return Ok(LpSolution::without_values(
            LpStatus::Unbounded,
            tableau.iterations,
        ));
    }

    let mut values = lower.to_vec();
    for (row, &b) in tableau.rows.iter().zip(&tableau.basis) {
        if b < n {
            values[b] += row[width - 1].max(0.0);
        }
    }
    let objective_value = values.iter().zip(objective).map(|(x, c)| x * c).sum();

    Ok(LpSolution {
        status: LpStatus::Optimal,
        values,
        objective: objective_value,
        iterations: tableau.iterations,
    })
}
