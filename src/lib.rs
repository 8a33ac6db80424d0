// Domain layer: models, value objects and the solver contract
pub mod domain;

// Solver adapters: Concrete implementations of SolverService
pub mod solver;

// Supply-chain network: validation, model building and flow extraction
pub mod network;

// Application layer: Use cases and mappers
pub mod application;

// Infrastructure layer: Configuration, logging and the CLI run
#[cfg(feature = "cli")]
pub mod infrastructure;

// Re-export commonly used types
pub use domain::{
    Assignment, Constraint, ConstraintType, ExtractError, LinearExpr, Model, ModelError,
    ObjectiveFunction, OptimizationType, ResultExtractor, Solution, SolutionStatus, SolveState,
    SolverBackend, SolverConfig, SolverError, SolverService, TieBreak, Variable, VariableHandle,
    VariableType,
};

pub use network::{BuildError, FlowModel, FlowModelBuilder, FlowPlan, SupplyChain};

pub use application::{PlanError, PlanReport, SupplyChainPlanner};

pub use solver::{BranchAndBoundSolver, SolverFactory};

#[cfg(feature = "coin_cbc")]
pub use solver::CoinCbcSolver;

#[cfg(feature = "highs")]
pub use solver::HighsSolver;
