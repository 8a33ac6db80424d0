use super::error::ModelError;
use super::value_objects::{
    ConstraintType, OptimizationType, SolutionStatus, SolverBackend, TieBreak, VariableType,
};
use std::collections::{BTreeMap, HashMap};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Opaque reference to a variable declared in a [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableHandle(usize);

impl VariableHandle {
    /// Position of the variable in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }

    fn check_bounds(&self) -> Result<(), ModelError> {
        let upper = self.upper_bound.unwrap_or(f64::INFINITY);
        let valid = self.lower_bound.is_finite()
            && !upper.is_nan()
            && upper != f64::NEG_INFINITY
            && self.lower_bound <= upper;
        if valid {
            Ok(())
        } else {
            Err(ModelError::InvalidBound {
                name: self.name.clone(),
                lower: self.lower_bound,
                upper,
            })
        }
    }
}

/// Linear combination of variables plus a constant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VariableHandle, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single term `coefficient * handle`
    pub fn term(handle: VariableHandle, coefficient: f64) -> Self {
        Self {
            terms: vec![(handle, coefficient)],
            constant: 0.0,
        }
    }

    /// Unit-coefficient sum of the given variables
    pub fn sum_of<I>(handles: I) -> Self
    where
        I: IntoIterator<Item = VariableHandle>,
    {
        handles.into_iter().sum()
    }

    pub fn add_term(&mut self, handle: VariableHandle, coefficient: f64) -> &mut Self {
        self.terms.push((handle, coefficient));
        self
    }

    pub fn with_term(mut self, handle: VariableHandle, coefficient: f64) -> Self {
        self.add_term(handle, coefficient);
        self
    }

    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    pub fn terms(&self) -> &[(VariableHandle, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Merges repeated handles and drops zero coefficients, ordered by handle.
    fn compact(&self) -> Vec<(VariableHandle, f64)> {
        let mut merged: BTreeMap<VariableHandle, f64> = BTreeMap::new();
        for &(handle, coefficient) in &self.terms {
            *merged.entry(handle).or_insert(0.0) += coefficient;
        }
        merged.into_iter().filter(|&(_, c)| c != 0.0).collect()
    }

    fn scale(mut self, factor: f64) -> Self {
        for (_, coefficient) in &mut self.terms {
            *coefficient *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl From<VariableHandle> for LinearExpr {
    fn from(handle: VariableHandle) -> Self {
        LinearExpr::term(handle, 1.0)
    }
}

impl AddAssign<LinearExpr> for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl AddAssign<VariableHandle> for LinearExpr {
    fn add_assign(&mut self, rhs: VariableHandle) {
        self.terms.push((rhs, 1.0));
    }
}

impl Add<LinearExpr> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Add<VariableHandle> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: VariableHandle) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Add<VariableHandle> for VariableHandle {
    type Output = LinearExpr;

    fn add(self, rhs: VariableHandle) -> LinearExpr {
        LinearExpr::from(self) + rhs
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self.scale(-1.0)
    }
}

impl Sub<LinearExpr> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + (-rhs)
    }
}

impl Sub<VariableHandle> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: VariableHandle) -> LinearExpr {
        self.with_term(rhs, -1.0)
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(self, rhs: f64) -> LinearExpr {
        self.scale(rhs)
    }
}

impl Mul<VariableHandle> for f64 {
    type Output = LinearExpr;

    fn mul(self, rhs: VariableHandle) -> LinearExpr {
        LinearExpr::term(rhs, self)
    }
}

impl Mul<LinearExpr> for f64 {
    type Output = LinearExpr;

    fn mul(self, rhs: LinearExpr) -> LinearExpr {
        rhs.scale(self)
    }
}

impl Sum<LinearExpr> for LinearExpr {
    fn sum<I: Iterator<Item = LinearExpr>>(iter: I) -> Self {
        iter.fold(LinearExpr::new(), |acc, expr| acc + expr)
    }
}

impl Sum<VariableHandle> for LinearExpr {
    fn sum<I: Iterator<Item = VariableHandle>>(iter: I) -> Self {
        LinearExpr {
            terms: iter.map(|h| (h, 1.0)).collect(),
            constant: 0.0,
        }
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone, Default)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub terms: Vec<(VariableHandle, f64)>,
    pub constant: f64,
}

impl ObjectiveFunction {
    /// Dense coefficient vector over `num_variables` columns
    pub fn coefficients(&self, num_variables: usize) -> Vec<f64> {
        let mut dense = vec![0.0; num_variables];
        for &(handle, coefficient) in &self.terms {
            if let Some(slot) = dense.get_mut(handle.index()) {
                *slot += coefficient;
            }
        }
        dense
    }
}

/// Linear constraint on variables, `terms (relation) bound`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub terms: Vec<(VariableHandle, f64)>,
    pub bound: f64,
    pub name: String,
}

impl Constraint {
    /// Value of the left-hand side for a full assignment
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(h, c)| c * values.get(h.index()).copied().unwrap_or(0.0))
            .sum()
    }

    /// How far the assignment is from satisfying this row (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.constraint_type {
            ConstraintType::LessThanOrEqual => (lhs - self.bound).max(0.0),
            ConstraintType::GreaterThanOrEqual => (self.bound - lhs).max(0.0),
            ConstraintType::Equal => (lhs - self.bound).abs(),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.terms.len()
    }
}

/// Configuration for the solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    /// Wall-clock limit in seconds
    pub time_limit: Option<f64>,
    /// Maximum number of branch-and-bound nodes
    pub node_limit: Option<u64>,
    /// Worker threads for the tree search (1 = sequential depth-first)
    pub threads: usize,
    pub tie_break: TieBreak,
    /// Values this close to an integer count as integral
    pub integrality_tolerance: f64,
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Native,
            time_limit: None,
            node_limit: None,
            threads: 1,
            tie_break: TieBreak::Lexicographic,
            integrality_tolerance: 1e-6,
            verbose: false,
        }
    }
}

/// Linear model: variables, constraints and one objective
///
/// Accumulates declarations only; solving never mutates it, so the same
/// model can be handed to any [`SolverService`](super::SolverService) repeatedly.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub description: String,
    pub solver_config: SolverConfig,
    variables: Vec<Variable>,
    names: HashMap<String, VariableHandle>,
    constraints: Vec<Constraint>,
    objective: ObjectiveFunction,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Declare a variable of any type
    pub fn declare(&mut self, variable: Variable) -> Result<VariableHandle, ModelError> {
        if self.names.contains_key(&variable.name) {
            return Err(ModelError::DuplicateDeclaration(variable.name));
        }
        variable.check_bounds()?;

        let handle = VariableHandle(self.variables.len());
        self.names.insert(variable.name.clone(), handle);
        self.variables.push(variable);
        Ok(handle)
    }

    /// Declare an integer variable with the given bounds
    pub fn declare_variable(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: Option<f64>,
    ) -> Result<VariableHandle, ModelError> {
        self.declare(Variable::integer(name).with_bounds(lower, upper))
    }

    /// Add `expression (relation) bound`; the expression constant moves to the right.
    pub fn add_constraint(
        &mut self,
        expression: LinearExpr,
        constraint_type: ConstraintType,
        bound: f64,
    ) -> Result<usize, ModelError> {
        let name = format!("c{}", self.constraints.len());
        self.add_named_constraint(name, expression, constraint_type, bound)
    }

    pub fn add_named_constraint(
        &mut self,
        name: impl Into<String>,
        expression: LinearExpr,
        constraint_type: ConstraintType,
        bound: f64,
    ) -> Result<usize, ModelError> {
        let name = name.into();
        let terms = self.checked_terms(&expression, &name)?;
        let bound = bound - expression.constant();
        if !bound.is_finite() {
            return Err(ModelError::InvalidCoefficient {
                context: format!("bound of constraint '{}'", name),
                value: bound,
            });
        }

        self.constraints.push(Constraint {
            constraint_type,
            terms,
            bound,
            name,
        });
        Ok(self.constraints.len() - 1)
    }

    pub fn set_objective(
        &mut self,
        expression: LinearExpr,
        optimization_type: OptimizationType,
    ) -> Result<(), ModelError> {
        let terms = self.checked_terms(&expression, "objective")?;
        self.objective = ObjectiveFunction {
            optimization_type,
            terms,
            constant: expression.constant(),
        };
        Ok(())
    }

    fn checked_terms(
        &self,
        expression: &LinearExpr,
        context: &str,
    ) -> Result<Vec<(VariableHandle, f64)>, ModelError> {
        for &(handle, coefficient) in expression.terms() {
            if handle.index() >= self.variables.len() {
                return Err(ModelError::UnknownVariable(handle.index()));
            }
            if !coefficient.is_finite() {
                return Err(ModelError::InvalidCoefficient {
                    context: format!("{} (variable '{}')", context, self.variables[handle.index()].name),
                    value: coefficient,
                });
            }
        }
        if !expression.constant().is_finite() {
            return Err(ModelError::InvalidCoefficient {
                context: format!("{} (constant term)", context),
                value: expression.constant(),
            });
        }
        Ok(expression.compact())
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, handle: VariableHandle) -> Option<&Variable> {
        self.variables.get(handle.index())
    }

    /// Look up a variable by name
    pub fn handle(&self, name: &str) -> Option<VariableHandle> {
        self.names.get(name).copied()
    }

    pub fn handles(&self) -> impl Iterator<Item = VariableHandle> + '_ {
        (0..self.variables.len()).map(VariableHandle)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &ObjectiveFunction {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    /// Objective value of an assignment, constant included
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective.constant
            + self
                .objective
                .terms
                .iter()
                .map(|&(h, c)| c * values.get(h.index()).copied().unwrap_or(0.0))
                .sum::<f64>()
    }

    /// Largest violation of any constraint or variable bound
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let rows = self
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(v, &x)| {
                let below = (v.lower_bound - x).max(0.0);
                let above = v.upper_bound.map_or(0.0, |u| (x - u).max(0.0));
                below.max(above)
            })
            .fold(0.0, f64::max);
        rows.max(bounds)
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub simplex_iterations: u64,
    pub nodes_explored: u64,
    pub nodes_pruned: u64,
    pub max_depth: u64,
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    /// Problem-size fields filled in from a model
    pub fn for_model(model: &Model) -> Self {
        let num_binary = model
            .variables()
            .iter()
            .filter(|v| v.variable_type == VariableType::Binary)
            .count() as u32;
        Self {
            num_variables: model.num_variables() as u32,
            num_constraints: model.num_constraints() as u32,
            num_integer_vars: model.num_integer_variables() as u32 - num_binary,
            num_binary_vars: num_binary,
            ..Self::default()
        }
    }
}

/// Quality metrics for the solution
#[derive(Debug, Clone, Default)]
pub struct SolutionQuality {
    pub max_constraint_violation: f64,
    pub max_integrality_violation: f64,
}

impl SolutionQuality {
    pub fn measure(model: &Model, values: &[f64]) -> Self {
        let max_integrality_violation = model
            .variables()
            .iter()
            .zip(values)
            .filter(|(v, _)| v.is_integer())
            .map(|(_, &x)| (x - x.round()).abs())
            .fold(0.0, f64::max);
        Self {
            max_constraint_violation: model.max_violation(values),
            max_integrality_violation,
        }
    }
}

/// Solution to an optimization problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub optimal_value: Option<f64>,
    pub best_bound: Option<f64>,
    pub gap: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
    pub quality: SolutionQuality,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            optimal_value: None,
            best_bound: None,
            gap: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            optimal_value: Some(value),
            best_bound: Some(value),
            gap: Some(0.0),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
            quality: SolutionQuality::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_quality(mut self, quality: SolutionQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Whether the solution carries an assignment satisfying all constraints
    pub fn is_feasible(&self) -> bool {
        match self.status {
            SolutionStatus::Optimal | SolutionStatus::Feasible => true,
            SolutionStatus::TimeLimit | SolutionStatus::NodeLimit => self.optimal_value.is_some(),
            _ => false,
        }
    }
}
