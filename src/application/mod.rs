// Application layer: use cases and mappers

pub mod mappers;
pub mod planner;

pub use mappers::{InstanceFile, PlanReport, ReportStatistics};
pub use planner::{PlanError, SupplyChainPlanner};
