// Native solver: LP-based branch-and-bound over the simplex relaxation
//
// Open subproblems live on a shared depth-first stack. With one thread the
// search is a plain DFS on the calling thread; with more, workers claim nodes
// from the same stack under a lock and share one incumbent.

use super::incumbent::{Incumbent, SharedIncumbent};
use super::simplex::{self, LpRow, LpStatus, SimplexOptions};
use crate::domain::{
    ConstraintType, Model, OptimizationType, Result, Solution, SolutionQuality, SolutionStatus,
    SolverError, SolverService, SolverStatistics, TieBreak,
};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Candidates must beat the incumbent objective by more than this
const OBJECTIVE_TOLERANCE: f64 = 1e-6;

/// Continuous relaxation of a model, always in minimization form
#[derive(Debug, Clone)]
struct Relaxation {
    objective: Vec<f64>,
    rows: Vec<LpRow>,
    integer: Vec<bool>,
}

impl Relaxation {
    fn from_model(model: &Model) -> Self {
        let sign = direction_sign(model);
        let objective = model
            .objective()
            .coefficients(model.num_variables())
            .into_iter()
            .map(|c| sign * c)
            .collect();
        let rows = model
            .constraints()
            .iter()
            .map(|c| LpRow {
                coefficients: c.terms.iter().map(|&(h, a)| (h.index(), a)).collect(),
                relation: c.constraint_type,
                rhs: c.bound,
            })
            .collect();
        let integer = model.variables().iter().map(|v| v.is_integer()).collect();

        Self {
            objective,
            rows,
            integer,
        }
    }

    fn value(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, x)| c * x).sum()
    }

    /// Same feasible region with a different objective and one extra row
    fn with_objective(&self, objective: Vec<f64>, extra: LpRow) -> Self {
        let mut rows = self.rows.clone();
        rows.push(extra);
        Self {
            objective,
            rows,
            integer: self.integer.clone(),
        }
    }
}

fn direction_sign(model: &Model) -> f64 {
    match model.objective().optimization_type {
        OptimizationType::Minimize => 1.0,
        OptimizationType::Maximize => -1.0,
    }
}

/// Objective in the model's own direction, constant included
fn reported_objective(model: &Model, internal: f64) -> f64 {
    direction_sign(model) * internal + model.objective().constant
}

/// Subproblem: the model with tightened variable bounds
#[derive(Debug, Clone)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<Option<f64>>,
    /// Relaxation value of the parent, a lower bound for this subtree
    bound: f64,
    depth: u64,
}

impl Node {
    fn root(model: &Model, tolerance: f64) -> Self {
        let (lower, upper) = model
            .variables()
            .iter()
            .map(|v| {
                if v.is_integer() {
                    (
                        (v.lower_bound - tolerance).ceil(),
                        v.upper_bound.map(|u| (u + tolerance).floor()),
                    )
                } else {
                    (v.lower_bound, v.upper_bound)
                }
            })
            .unzip();
        Self {
            lower,
            upper,
            bound: f64::NEG_INFINITY,
            depth: 0,
        }
    }

    fn fix(&mut self, j: usize, value: f64) {
        self.lower[j] = value;
        self.upper[j] = Some(value);
    }
}

/// Counters shared by every worker of one solve
#[derive(Debug, Default)]
struct SearchCounters {
    nodes: AtomicU64,
    pruned: AtomicU64,
    iterations: AtomicU64,
    max_depth: AtomicU64,
}

#[derive(Debug)]
struct Limits {
    deadline: Option<Instant>,
    node_limit: Option<u64>,
}

impl Limits {
    fn reached(&self, counters: &SearchCounters) -> Option<SolutionStatus> {
        if let Some(limit) = self.node_limit {
            if counters.nodes.load(Ordering::Relaxed) >= limit {
                return Some(SolutionStatus::NodeLimit);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(SolutionStatus::TimeLimit);
            }
        }
        None
    }
}

/// Everything one solve shares across the root search and tie-break searches
struct SearchContext {
    counters: SearchCounters,
    limits: Limits,
    options: SimplexOptions,
    tolerance: f64,
    threads: usize,
    verbose: bool,
}

enum TreeOutcome {
    /// Every open node was expanded or pruned
    Exhausted,
    /// A limit stopped the search; `open_bound` is the best bound left open
    Limit {
        status: SolutionStatus,
        open_bound: f64,
    },
    Unbounded,
}

enum Expansion {
    Leaf,
    Children([Node; 2]),
    Unbounded,
}

enum Halt {
    Limit(SolutionStatus),
    Unbounded,
    Failed(SolverError),
}

struct Frontier {
    nodes: Vec<Node>,
    busy: usize,
    halt: Option<Halt>,
}

struct TreeSearch<'a> {
    relaxation: &'a Relaxation,
    incumbent: &'a SharedIncumbent,
    context: &'a SearchContext,
    frontier: Mutex<Frontier>,
    wakeup: Condvar,
}

impl<'a> TreeSearch<'a> {
    fn new(
        relaxation: &'a Relaxation,
        root: Node,
        incumbent: &'a SharedIncumbent,
        context: &'a SearchContext,
    ) -> Self {
        Self {
            relaxation,
            incumbent,
            context,
            frontier: Mutex::new(Frontier {
                nodes: vec![root],
                busy: 0,
                halt: None,
            }),
            wakeup: Condvar::new(),
        }
    }

    fn run(self) -> Result<TreeOutcome> {
        if self.context.threads <= 1 {
            self.work();
        } else {
            std::thread::scope(|scope| {
                for _ in 0..self.context.threads {
                    scope.spawn(|| self.work());
                }
            });
        }

        let frontier = self.frontier.into_inner();
        match frontier.halt {
            None => Ok(TreeOutcome::Exhausted),
            Some(Halt::Unbounded) => Ok(TreeOutcome::Unbounded),
            Some(Halt::Failed(err)) => Err(err),
            Some(Halt::Limit(status)) => {
                let open_bound = frontier
                    .nodes
                    .iter()
                    .map(|n| n.bound)
                    .fold(self.incumbent.upper_bound(), f64::min);
                Ok(TreeOutcome::Limit { status, open_bound })
            }
        }
    }

    fn work(&self) {
        loop {
            let node = {
                let mut frontier = self.frontier.lock();
                loop {
                    if frontier.halt.is_some() {
                        return;
                    }
                    if frontier.nodes.is_empty() {
                        if frontier.busy == 0 {
                            self.wakeup.notify_all();
                            return;
                        }
                        self.wakeup.wait(&mut frontier);
                        continue;
                    }
                    // a limit only halts a search that still has open nodes
                    if let Some(status) = self.context.limits.reached(&self.context.counters) {
                        frontier.halt = Some(Halt::Limit(status));
                        self.wakeup.notify_all();
                        return;
                    }
                    if let Some(node) = frontier.nodes.pop() {
                        frontier.busy += 1;
                        break node;
                    }
                }
            };

            let expansion = self.expand(node);

            let mut frontier = self.frontier.lock();
            frontier.busy -= 1;
            match expansion {
                Ok(Expansion::Leaf) => {}
                Ok(Expansion::Children(children)) => frontier.nodes.extend(children),
                Ok(Expansion::Unbounded) => {
                    frontier.halt.get_or_insert(Halt::Unbounded);
                }
                Err(err) => {
                    frontier.halt.get_or_insert(Halt::Failed(err));
                }
            }
            self.wakeup.notify_all();
        }
    }

    fn expand(&self, node: Node) -> Result<Expansion> {
        let counters = &self.context.counters;
        counters.nodes.fetch_add(1, Ordering::Relaxed);
        counters.max_depth.fetch_max(node.depth, Ordering::Relaxed);

        if !self.incumbent.can_improve(node.bound) {
            counters.pruned.fetch_add(1, Ordering::Relaxed);
            return Ok(Expansion::Leaf);
        }

        let lp = simplex::solve_relaxation(
            &self.relaxation.objective,
            &self.relaxation.rows,
            &node.lower,
            &node.upper,
            &self.context.options,
        )?;
        counters.iterations.fetch_add(lp.iterations, Ordering::Relaxed);

        match lp.status {
            LpStatus::Unbounded => Ok(Expansion::Unbounded),
            LpStatus::Infeasible => {
                counters.pruned.fetch_add(1, Ordering::Relaxed);
                Ok(Expansion::Leaf)
            }
            LpStatus::Optimal if !self.incumbent.can_improve(lp.objective) => {
                counters.pruned.fetch_add(1, Ordering::Relaxed);
                Ok(Expansion::Leaf)
            }
            LpStatus::Optimal => match self.branching_variable(&lp.values) {
                None => {
                    self.accept(&lp.values)?;
                    Ok(Expansion::Leaf)
                }
                Some(j) => {
                    let x = lp.values[j];
                    let mut down = Node {
                        bound: lp.objective,
                        depth: node.depth + 1,
                        ..node
                    };
                    let mut up = down.clone();
                    down.upper[j] = Some(x.floor());
                    up.lower[j] = x.ceil();
                    // popped last-in first-out: the down branch is explored first
                    Ok(Expansion::Children([up, down]))
                }
            },
        }
    }

    /// Most fractional integer variable, lowest index on ties
    fn branching_variable(&self, values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (j, &x) in values.iter().enumerate() {
            if !self.relaxation.integer[j] {
                continue;
            }
            let distance = (x - x.round()).abs();
            if distance <= self.context.tolerance {
                continue;
            }
            if best.map_or(true, |(_, d)| distance > d) {
                best = Some((j, distance));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Rounds an integral relaxation solution, verifies it and offers it as incumbent
    fn accept(&self, values: &[f64]) -> Result<()> {
        let rounded: Vec<f64> = values
            .iter()
            .zip(&self.relaxation.integer)
            .map(|(&x, &integer)| if integer { x.round() } else { x })
            .collect();

        for row in &self.relaxation.rows {
            let scale: f64 = row.coefficients.iter().map(|(_, a)| a.abs()).sum();
            let allowed = 1e-6 * (1.0 + row.rhs.abs() + scale);
            let violation = row.violation(&rounded);
            if violation > allowed {
                return Err(SolverError::Internal(format!(
                    "rounded relaxation solution violates a row by {}",
                    violation
                )));
            }
        }

        let objective = self.relaxation.value(&rounded);
        if self.incumbent.try_install(objective, &rounded) {
            if self.context.verbose {
                info!(objective, "new incumbent");
            } else {
                debug!(objective, "new incumbent");
            }
        }
        Ok(())
    }
}

/// Built-in simplex + branch-and-bound solver
#[derive(Debug, Clone, Default)]
pub struct BranchAndBoundSolver {
    options: SimplexOptions,
}

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SimplexOptions) -> Self {
        Self { options }
    }

    /// Among assignments within tolerance of the optimum, fixes each integer
    /// variable in declaration order to its smallest attainable value.
    fn lexicographic(
        &self,
        relaxation: &Relaxation,
        root: &Node,
        best: Incumbent,
        context: &SearchContext,
    ) -> Result<Incumbent> {
        let n = relaxation.objective.len();
        let cap = LpRow {
            coefficients: relaxation
                .objective
                .iter()
                .enumerate()
                .filter(|(_, &c)| c != 0.0)
                .map(|(j, &c)| (j, c))
                .collect(),
            relation: ConstraintType::LessThanOrEqual,
            rhs: best.objective + OBJECTIVE_TOLERANCE * (1.0 + best.objective.abs()),
        };

        let mut node = root.clone();
        let mut current = best.values;
        for j in (0..n).filter(|&j| relaxation.integer[j]) {
            if let Some(status) = context.limits.reached(&context.counters) {
                warn!(%status, variable = j, "tie-break stopped early");
                break;
            }

            let target = current[j].round();
            if target > node.lower[j] {
                let mut objective = vec![0.0; n];
                objective[j] = 1.0;
                let sub = relaxation.with_objective(objective, cap.clone());
                let seed = SharedIncumbent::seeded(
                    Incumbent {
                        objective: target,
                        values: current.clone(),
                    },
                    OBJECTIVE_TOLERANCE,
                );

                let outcome = TreeSearch::new(&sub, node.clone(), &seed, context).run()?;
                if let TreeOutcome::Unbounded = outcome {
                    return Err(SolverError::Internal(format!(
                        "tie-break subproblem for variable {} is unbounded",
                        j
                    )));
                }
                if let Some(found) = seed.into_inner() {
                    current = found.values;
                }
            }
            node.fix(j, current[j].round());
        }

        Ok(Incumbent {
            objective: relaxation.value(&current),
            values: current,
        })
    }
}

impl SolverService for BranchAndBoundSolver {
    fn solve(&self, model: &Model) -> Result<Solution> {
        // Validate first
        for warning in self.validate(model)? {
            debug!(%warning, "model validation");
        }

        let span = tracing::debug_span!("branch_and_bound", model = %model.name);
        let _guard = span.enter();

        let start_time = Instant::now();
        let config = &model.solver_config;
        let context = SearchContext {
            counters: SearchCounters::default(),
            limits: Limits {
                // a limit too large for `Instant` means no deadline
                deadline: config
                    .time_limit
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                    .and_then(|limit| start_time.checked_add(limit)),
                node_limit: config.node_limit,
            },
            options: self.options.clone(),
            tolerance: config.integrality_tolerance,
            threads: config.threads.max(1),
            verbose: config.verbose,
        };

        let relaxation = Relaxation::from_model(model);
        let root = Node::root(model, config.integrality_tolerance);
        let incumbent = SharedIncumbent::new(OBJECTIVE_TOLERANCE);
        let outcome = TreeSearch::new(&relaxation, root.clone(), &incumbent, &context).run()?;
        let best = incumbent.into_inner();

        let mut solution = match (outcome, best) {
            (TreeOutcome::Unbounded, _) => Solution::new(
                SolutionStatus::Unbounded,
                "Problem is unbounded: objective can be improved infinitely",
            ),
            (TreeOutcome::Exhausted, None) => Solution::new(
                SolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            (TreeOutcome::Exhausted, Some(best)) => {
                let best = if config.tie_break == TieBreak::Lexicographic
                    && model.is_mixed_integer()
                {
                    self.lexicographic(&relaxation, &root, best, &context)?
                } else {
                    best
                };
                let mut solution =
                    Solution::optimal(model.evaluate(&best.values), best.values);
                solution.message = format!("Optimal solution found for '{}'", model.name);
                solution
            }
            (TreeOutcome::Limit { status, open_bound }, best) => {
                let mut solution =
                    Solution::new(status, format!("{} before proving optimality", status));
                let open_bound = Some(open_bound).filter(|b| b.is_finite());
                solution.best_bound = open_bound.map(|b| reported_objective(model, b));
                if let Some(best) = best {
                    solution.gap = open_bound
                        .map(|b| (best.objective - b).abs() / best.objective.abs().max(1.0));
                    solution.optimal_value = Some(model.evaluate(&best.values));
                    solution.variable_values = best.values;
                } else {
                    solution.message = format!("{} before any feasible solution was found", status);
                }
                solution
            }
        };

        let counters = &context.counters;
        let mut statistics = SolverStatistics::for_model(model);
        statistics.simplex_iterations = counters.iterations.load(Ordering::Relaxed);
        statistics.nodes_explored = counters.nodes.load(Ordering::Relaxed);
        statistics.nodes_pruned = counters.pruned.load(Ordering::Relaxed);
        statistics.max_depth = counters.max_depth.load(Ordering::Relaxed);
        statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        solution.statistics = statistics;
        if !solution.variable_values.is_empty() {
            solution.quality = SolutionQuality::measure(model, &solution.variable_values);
        }

        info!(
            status = %solution.status,
            objective = ?solution.optimal_value,
            nodes = solution.statistics.nodes_explored,
            "solve finished"
        );
        Ok(solution)
    }

    fn name(&self) -> &str {
        "Native Branch-and-Bound"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}
