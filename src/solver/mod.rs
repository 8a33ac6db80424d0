// Solver adapters module

pub mod branch_and_bound;
#[cfg(feature = "coin_cbc")]
pub mod coin_cbc_solver;
pub mod factory;
#[cfg(feature = "highs")]
pub mod highs_solver;
pub mod incumbent;
pub mod simplex;

pub use branch_and_bound::BranchAndBoundSolver;
#[cfg(feature = "coin_cbc")]
pub use coin_cbc_solver::CoinCbcSolver;
pub use factory::SolverFactory;
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
